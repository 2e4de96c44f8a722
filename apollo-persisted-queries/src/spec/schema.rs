//! GraphQL schema.

use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;

use super::OperationKind;
use crate::error::SchemaError;

/// A validated GraphQL schema, consulted read-only to bind names to definitions.
#[derive(Debug)]
pub struct Schema {
    definitions: Valid<apollo_compiler::Schema>,
}

impl Schema {
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let definitions = apollo_compiler::Schema::parse_and_validate(sdl, "schema.graphql")
            .map_err(|invalid| SchemaError::Validate(invalid.errors.to_string()))?;
        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &Valid<apollo_compiler::Schema> {
        &self.definitions
    }

    pub(crate) fn type_definition(&self, name: &str) -> Option<&ExtendedType> {
        self.definitions.types.get(name)
    }

    /// The schema's own handle for the type called `name`.
    pub(crate) fn type_name(&self, name: &str) -> Option<&Name> {
        self.definitions
            .types
            .get_key_value(name)
            .map(|(name, _)| name)
    }

    /// Looks up a field, including the `__typename`/`__schema`/`__type` meta fields.
    pub(crate) fn type_field(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Option<&Node<FieldDefinition>> {
        self.definitions
            .type_field(type_name, field_name)
            .ok()
            .map(|component| &component.node)
    }

    pub(crate) fn directive(&self, name: &str) -> Option<&Node<DirectiveDefinition>> {
        self.definitions.directive_definitions.get(name)
    }

    pub(crate) fn root_type(&self, kind: OperationKind) -> Option<&Name> {
        self.definitions.root_operation(kind.into())
    }

    /// Object, interface and union types can be selected into by a fragment.
    pub(crate) fn is_composite(&self, name: &str) -> bool {
        matches!(
            self.type_definition(name),
            Some(ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_))
        )
    }
}
