//! Type definitions and the read-only registry that resolves them by name.

use std::collections::{BTreeSet, HashMap};

use crate::{Error, PrimitiveType, TypeReference, ValueTree};

/// A field declared by a struct or schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Declared type
    pub type_ref: TypeReference,
    /// Value synthesized when the field is absent
    pub default: Option<ValueTree>,
}

impl FieldDefinition {
    /// A field without a default.
    pub fn new(name: impl Into<String>, type_ref: TypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            default: None,
        }
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<ValueTree>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A named struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    /// Qualified name
    pub name: String,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDefinition>,
    /// Types whose values are accepted in place of this struct unchanged
    pub constructor_types: Vec<String>,
}

impl StructDefinition {
    /// A struct with the given fields and no constructor types.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
            constructor_types: Vec::new(),
        }
    }

    /// Declare a constructor type.
    pub fn with_constructor_type(mut self, type_name: impl Into<String>) -> Self {
        self.constructor_types.push(type_name.into());
        self
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDefinition {
    /// Qualified name
    pub name: String,
    /// Member identifiers
    pub members: Vec<String>,
}

impl EnumDefinition {
    /// An enum with the given members.
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `member` is declared.
    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

/// How a union picks the member an incoming type stands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnionMatchRule {
    /// The first member the incoming type is assignable to.
    #[default]
    FirstAssignable,
    /// Only a member whose name equals the incoming type name.
    ExactName,
}

/// A union resolved at cast time.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDefinition {
    /// Qualified name
    pub name: String,
    /// Candidate member types, in priority order
    pub member_types: Vec<TypeReference>,
    /// Member selection rule
    pub match_rule: UnionMatchRule,
}

impl UnionDefinition {
    /// A union using [`UnionMatchRule::FirstAssignable`].
    pub fn new(name: impl Into<String>, member_types: Vec<TypeReference>) -> Self {
        Self {
            name: name.into(),
            member_types,
            match_rule: UnionMatchRule::default(),
        }
    }

    /// Select the member an incoming value of type `incoming` stands for.
    pub fn match_member(
        &self,
        registry: &dyn TypeRegistry,
        incoming: &str,
    ) -> Option<&TypeReference> {
        self.member_types.iter().find(|member| {
            let Some(name) = member.atomic_name() else {
                return false;
            };
            match self.match_rule {
                UnionMatchRule::ExactName => name == incoming,
                UnionMatchRule::FirstAssignable => is_assignable(registry, incoming, name),
            }
        })
    }

    /// Select the member an incoming list stands for: the first member
    /// whose effective shape is a list.
    pub fn list_member(&self) -> Option<&TypeReference> {
        self.member_types
            .iter()
            .find(|member| matches!(member.resolve_wrappers().0, TypeReference::List { .. }))
    }
}

/// A structural interface: satisfied by any struct declaring its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    /// Qualified name
    pub name: String,
    /// Required field set
    pub fields: Vec<FieldDefinition>,
}

impl SchemaDefinition {
    /// A schema with the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a struct declaring `fields` satisfies this schema.
    pub fn is_satisfied_by(&self, fields: &[FieldDefinition]) -> bool {
        let present: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        self.fields.iter().all(|f| present.contains(f.name.as_str()))
    }
}

/// Everything a qualified name can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    /// A built-in atomic type
    Primitive(PrimitiveType),
    /// A named struct
    Struct(StructDefinition),
    /// A named enum
    Enum(EnumDefinition),
    /// A named union
    Union(UnionDefinition),
    /// A structural interface
    Schema(SchemaDefinition),
}

impl TypeDefinition {
    /// The qualified name of the defined type.
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Primitive(p) => p.name(),
            TypeDefinition::Struct(d) => d.name.as_str(),
            TypeDefinition::Enum(d) => d.name.as_str(),
            TypeDefinition::Union(d) => d.name.as_str(),
            TypeDefinition::Schema(d) => d.name.as_str(),
        }
    }

    /// Short description of the definition kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            TypeDefinition::Primitive(_) => "primitive",
            TypeDefinition::Struct(_) => "struct",
            TypeDefinition::Enum(_) => "enum",
            TypeDefinition::Union(_) => "union",
            TypeDefinition::Schema(_) => "schema",
        }
    }
}

impl From<StructDefinition> for TypeDefinition {
    fn from(d: StructDefinition) -> Self {
        TypeDefinition::Struct(d)
    }
}

impl From<EnumDefinition> for TypeDefinition {
    fn from(d: EnumDefinition) -> Self {
        TypeDefinition::Enum(d)
    }
}

impl From<UnionDefinition> for TypeDefinition {
    fn from(d: UnionDefinition) -> Self {
        TypeDefinition::Union(d)
    }
}

impl From<SchemaDefinition> for TypeDefinition {
    fn from(d: SchemaDefinition) -> Self {
        TypeDefinition::Schema(d)
    }
}

/// Read-only lookup of type definitions by qualified name.
///
/// Shared across concurrent traversals, hence `Send + Sync`.
pub trait TypeRegistry: Send + Sync {
    /// Resolve a qualified name.
    fn lookup(&self, name: &str) -> Option<&TypeDefinition>;
}

/// A registry built up front by the composition root.
///
/// Primitive names resolve without being registered.
#[derive(Debug, Clone)]
pub struct InMemoryRegistry {
    types: HashMap<String, TypeDefinition>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// A registry containing only the primitives.
    pub fn new() -> Self {
        let types = PrimitiveType::ALL
            .into_iter()
            .map(|p| (p.name().to_string(), TypeDefinition::Primitive(p)))
            .collect();
        Self { types }
    }

    /// Register a definition. Registering a name twice is an error.
    pub fn register(&mut self, def: impl Into<TypeDefinition>) -> Result<(), Error> {
        let def = def.into();
        if self.types.contains_key(def.name()) {
            return Err(Error::DuplicateType {
                name: def.name().to_string(),
            });
        }
        self.types.insert(def.name().to_string(), def);
        Ok(())
    }

    /// Builder-style [`InMemoryRegistry::register`].
    pub fn with(mut self, def: impl Into<TypeDefinition>) -> Result<Self, Error> {
        self.register(def)?;
        Ok(self)
    }

    /// Number of registered definitions, primitives included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: primitives are always present.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for InMemoryRegistry {
    fn lookup(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }
}

/// Unions nested deeper than this are not followed when checking assignability.
const MAX_UNION_NESTING: usize = 16;

/// Whether a value of type `actual` may stand where `target` is expected.
///
/// - every type is assignable to itself and to `Value`
/// - a struct target accepts its declared constructor types
/// - a schema target accepts maps and any struct declaring its fields
/// - a union target accepts anything assignable to one of its members
pub fn is_assignable(registry: &dyn TypeRegistry, actual: &str, target: &str) -> bool {
    assignable_at(registry, actual, target, 0)
}

fn assignable_at(registry: &dyn TypeRegistry, actual: &str, target: &str, depth: usize) -> bool {
    if actual == target || target == PrimitiveType::Value.name() {
        return true;
    }
    match registry.lookup(target) {
        Some(TypeDefinition::Struct(def)) => def.constructor_types.iter().any(|c| c == actual),
        Some(TypeDefinition::Schema(schema)) => {
            if actual == PrimitiveType::SymbolMap.name() {
                return true;
            }
            match registry.lookup(actual) {
                Some(TypeDefinition::Struct(def)) => schema.is_satisfied_by(&def.fields),
                Some(TypeDefinition::Schema(other)) => schema.is_satisfied_by(&other.fields),
                _ => false,
            }
        }
        Some(TypeDefinition::Union(union)) if depth < MAX_UNION_NESTING => {
            union.member_types.iter().any(|member| {
                member
                    .atomic_name()
                    .is_some_and(|name| assignable_at(registry, actual, name, depth + 1))
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with(
                StructDefinition::new(
                    "demo.Point",
                    vec![
                        FieldDefinition::new("x", TypeReference::atomic("Int32")),
                        FieldDefinition::new("y", TypeReference::atomic("Int32")),
                    ],
                )
                .with_constructor_type("demo.Origin"),
            )
            .and_then(|r| {
                r.with(SchemaDefinition::new(
                    "demo.HasX",
                    vec![FieldDefinition::new("x", TypeReference::atomic("Int32"))],
                ))
            })
            .and_then(|r| {
                r.with(UnionDefinition::new(
                    "demo.PointOrText",
                    vec![
                        TypeReference::atomic("demo.Point"),
                        TypeReference::atomic("String"),
                    ],
                ))
            })
            .unwrap()
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        weft_testhelpers::setup();

        let mut registry = registry();
        let err = registry
            .register(EnumDefinition::new("demo.Point", ["A"]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateType { name } if name == "demo.Point"));
    }

    #[test]
    fn test_primitives_resolve_without_registration() {
        weft_testhelpers::setup();

        let registry = InMemoryRegistry::new();
        assert_eq!(
            registry.lookup("Int64"),
            Some(&TypeDefinition::Primitive(PrimitiveType::Int64))
        );
        assert!(registry.lookup("demo.Missing").is_none());
    }

    #[test]
    fn test_assignability() {
        weft_testhelpers::setup();

        let registry = registry();
        assert!(is_assignable(&registry, "demo.Origin", "demo.Point"));
        assert!(is_assignable(&registry, "demo.Point", "demo.HasX"));
        assert!(is_assignable(&registry, "SymbolMap", "demo.HasX"));
        assert!(is_assignable(&registry, "String", "demo.PointOrText"));
        assert!(is_assignable(&registry, "Int32", "Value"));
        assert!(!is_assignable(&registry, "Int32", "demo.PointOrText"));
        assert!(!is_assignable(&registry, "demo.Point", "demo.Origin"));
    }

    #[test]
    fn test_union_match_member() {
        weft_testhelpers::setup();

        let registry = registry();
        let Some(TypeDefinition::Union(union)) = registry.lookup("demo.PointOrText") else {
            panic!("union not registered");
        };
        assert_eq!(
            union.match_member(&registry, "demo.Origin"),
            Some(&TypeReference::atomic("demo.Point"))
        );
        assert_eq!(union.match_member(&registry, "Boolean"), None);
        assert_eq!(union.list_member(), None);
    }

    #[test]
    fn test_union_list_member() {
        weft_testhelpers::setup();

        let tags = TypeReference::nullable(TypeReference::list(TypeReference::atomic("String")));
        let union = UnionDefinition::new(
            "demo.IntOrTags",
            vec![TypeReference::atomic("Int32"), tags.clone()],
        );
        assert_eq!(union.list_member(), Some(&tags));
    }
}
