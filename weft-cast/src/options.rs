use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use weft_core::{
    FieldDefinition, Path, PrimitiveType, TypeDefinition, TypeReference, TypeRegistry,
    UnionDefinition,
};

/// Picks the member of a union that a value of the incoming type stands for.
///
/// Called with the union, the incoming type name and the registry.
pub type UnionMatcher =
    Arc<dyn Fn(&UnionDefinition, &str, &dyn TypeRegistry) -> Option<TypeReference> + Send + Sync>;

/// Supplies the field set of an open map, given its nesting depth and path.
/// `None` leaves the map fully open.
pub type FieldSetFactory = Arc<dyn Fn(usize, &Path) -> Option<Vec<FieldDefinition>> + Send + Sync>;

/// Options for [`CastReactor`](crate::CastReactor).
#[derive(Clone, Default)]
pub struct CastOptions {
    pass_through: HashSet<(String, String)>,
    union_matchers: HashMap<String, UnionMatcher>,
    field_set_factory: Option<FieldSetFactory>,
}

impl fmt::Debug for CastOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut matchers: Vec<&str> = self.union_matchers.keys().map(String::as_str).collect();
        matchers.sort_unstable();
        f.debug_struct("CastOptions")
            .field("pass_through", &self.pass_through)
            .field("union_matchers", &matchers)
            .field("field_set_factory", &self.field_set_factory.is_some())
            .finish()
    }
}

impl CastOptions {
    /// Default options: no pass-through fields, no overrides, no factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward field `field` of struct `struct_type` verbatim, without casting
    /// anything inside it.
    pub fn pass_through(mut self, struct_type: impl Into<String>, field: impl Into<String>) -> Self {
        self.pass_through.insert((struct_type.into(), field.into()));
        self
    }

    /// Replace the match rule of union `union`.
    pub fn union_matcher<F>(mut self, union: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&UnionDefinition, &str, &dyn TypeRegistry) -> Option<TypeReference>
            + Send
            + Sync
            + 'static,
    {
        self.union_matchers.insert(union.into(), Arc::new(matcher));
        self
    }

    /// Treat union `union` as a path part: besides its own rule, it accepts
    /// the constructor types of `identifier_type` as that type, and any
    /// integer as `Uint64`.
    pub fn identifier_path_part(
        self,
        union: impl Into<String>,
        identifier_type: impl Into<String>,
    ) -> Self {
        let identifier_type = identifier_type.into();
        self.union_matcher(union, move |def, incoming, registry| {
            identifier_path_part(&identifier_type, def, incoming, registry)
        })
    }

    /// Narrow open maps with `factory`.
    pub fn field_set_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(usize, &Path) -> Option<Vec<FieldDefinition>> + Send + Sync + 'static,
    {
        self.field_set_factory = Some(Arc::new(factory));
        self
    }

    pub(crate) fn is_pass_through(&self, struct_type: &str, field: &str) -> bool {
        !self.pass_through.is_empty()
            && self
                .pass_through
                .contains(&(struct_type.to_string(), field.to_string()))
    }

    pub(crate) fn union_matcher_for(&self, union: &str) -> Option<&UnionMatcher> {
        self.union_matchers.get(union)
    }

    pub(crate) fn narrowed_fields(&self, depth: usize, path: &Path) -> Option<Vec<FieldDefinition>> {
        self.field_set_factory
            .as_ref()
            .and_then(|factory| factory(depth, path))
    }
}

/// The match rule for unions naming one segment of a resource path.
fn identifier_path_part(
    identifier_type: &str,
    union: &UnionDefinition,
    incoming: &str,
    registry: &dyn TypeRegistry,
) -> Option<TypeReference> {
    if let Some(member) = union.match_member(registry, incoming) {
        return Some(member.clone());
    }
    if let Some(TypeDefinition::Struct(identifier)) = registry.lookup(identifier_type)
        && identifier.constructor_types.iter().any(|c| c == incoming)
    {
        return Some(TypeReference::atomic(identifier_type));
    }
    PrimitiveType::from_name(incoming)
        .is_some_and(PrimitiveType::is_integer)
        .then(|| TypeReference::primitive(PrimitiveType::Uint64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{InMemoryRegistry, StructDefinition};

    #[test]
    fn test_identifier_path_part_rule() {
        weft_testhelpers::setup();

        let registry = InMemoryRegistry::new()
            .with(
                StructDefinition::new(
                    "demo.Identifier",
                    vec![FieldDefinition::new("name", TypeReference::atomic("String"))],
                )
                .with_constructor_type("demo.Slug"),
            )
            .unwrap();
        let union = UnionDefinition::new("demo.PathPart", vec![TypeReference::atomic("String")]);

        let rule = |incoming: &str| identifier_path_part("demo.Identifier", &union, incoming, &registry);
        assert_eq!(rule("String"), Some(TypeReference::atomic("String")));
        assert_eq!(rule("demo.Slug"), Some(TypeReference::atomic("demo.Identifier")));
        assert_eq!(rule("Int32"), Some(TypeReference::atomic("Uint64")));
        assert_eq!(rule("Boolean"), None);
    }

    #[test]
    fn test_pass_through_lookup() {
        weft_testhelpers::setup();

        let options = CastOptions::new().pass_through("demo.Envelope", "payload");
        assert!(options.is_pass_through("demo.Envelope", "payload"));
        assert!(!options.is_pass_through("demo.Envelope", "header"));
        assert!(!CastOptions::new().is_pass_through("demo.Envelope", "payload"));
    }
}
