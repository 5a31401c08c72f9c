//! Field typers: what each field set accepts, and which fields it requires.

use weft_core::{FieldDefinition, PrimitiveType, SchemaDefinition, StructDefinition, TypeReference};

/// Decides the type of each field inside one open struct or map.
pub trait FieldTyper {
    /// Name reported when a field is rejected, and used to look up
    /// pass-through registrations.
    fn type_name(&self) -> &str;

    /// Declared fields. Each one is awaited until it appears, is defaulted,
    /// or turns out to be nullable.
    fn declared(&self) -> &[FieldDefinition];

    /// The type the named field must have, or `None` when this field set does
    /// not accept it at all.
    fn field_type(&self, name: &str) -> Option<TypeReference>;
}

/// Fields of a registered struct or schema.
#[derive(Debug, Clone)]
pub struct DeclaredFields {
    type_name: String,
    fields: Vec<FieldDefinition>,
    allows_extra: bool,
}

impl DeclaredFields {
    /// A struct's fields: anything undeclared is rejected.
    pub fn for_struct(def: &StructDefinition) -> Self {
        Self {
            type_name: def.name.clone(),
            fields: def.fields.clone(),
            allows_extra: false,
        }
    }

    /// A schema's fields: undeclared fields are carried as `Value?`.
    pub fn for_schema(def: &SchemaDefinition) -> Self {
        Self {
            type_name: def.name.clone(),
            fields: def.fields.clone(),
            allows_extra: true,
        }
    }
}

impl FieldTyper for DeclaredFields {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn declared(&self) -> &[FieldDefinition] {
        &self.fields
    }

    fn field_type(&self, name: &str) -> Option<TypeReference> {
        match self.fields.iter().find(|f| f.name == name) {
            Some(field) => Some(field.type_ref.clone()),
            None if self.allows_extra => Some(TypeReference::any()),
            None => None,
        }
    }
}

/// An open map: every field is `Value?` and none is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFields;

impl FieldTyper for OpenFields {
    fn type_name(&self) -> &str {
        PrimitiveType::SymbolMap.name()
    }

    fn declared(&self) -> &[FieldDefinition] {
        &[]
    }

    fn field_type(&self, _name: &str) -> Option<TypeReference> {
        Some(TypeReference::any())
    }
}

/// An open map narrowed by a caller-supplied field set.
///
/// Listed fields are typed and awaited like declared ones; anything else is
/// still accepted as `Value?`.
#[derive(Debug, Clone)]
pub struct NarrowedFields {
    fields: Vec<FieldDefinition>,
}

impl NarrowedFields {
    /// Narrow an open map to `fields`.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }
}

impl FieldTyper for NarrowedFields {
    fn type_name(&self) -> &str {
        PrimitiveType::SymbolMap.name()
    }

    fn declared(&self) -> &[FieldDefinition] {
        &self.fields
    }

    fn field_type(&self, name: &str) -> Option<TypeReference> {
        let declared = self.fields.iter().find(|f| f.name == name);
        Some(declared.map_or_else(TypeReference::any, |f| f.type_ref.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_rejects_unknown_schema_does_not() {
        weft_testhelpers::setup();

        let fields = vec![FieldDefinition::new("x", TypeReference::atomic("Int32"))];
        let strukt = DeclaredFields::for_struct(&StructDefinition::new("demo.P", fields.clone()));
        let schema = DeclaredFields::for_schema(&SchemaDefinition::new("demo.S", fields));

        assert_eq!(strukt.field_type("x"), Some(TypeReference::atomic("Int32")));
        assert_eq!(strukt.field_type("z"), None);
        assert_eq!(schema.field_type("z"), Some(TypeReference::any()));
    }

    #[test]
    fn test_narrowed_types_listed_fields() {
        weft_testhelpers::setup();

        let narrowed = NarrowedFields::new(vec![FieldDefinition::new(
            "count",
            TypeReference::atomic("Uint32"),
        )]);
        assert_eq!(narrowed.field_type("count"), Some(TypeReference::atomic("Uint32")));
        assert_eq!(narrowed.field_type("other"), Some(TypeReference::any()));
        assert_eq!(narrowed.declared().len(), 1);
        assert!(OpenFields.declared().is_empty());
    }
}
