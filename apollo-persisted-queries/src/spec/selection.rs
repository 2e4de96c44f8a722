use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::Name;
use apollo_compiler::Node;

use super::ArgumentValue;
use super::Directive;

/// A selection in a normalized selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

/// A field bound to its definition on the enclosing type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub definition: Node<FieldDefinition>,
    /// The response key: the alias when one was given, the field name otherwise.
    pub alias: Name,
    pub arguments: Vec<ArgumentValue>,
    pub directives: Vec<Directive>,
    /// `None` for leaf fields.
    pub selection_set: Option<Vec<Selection>>,
}

impl Field {
    pub fn name(&self) -> &Name {
        &self.definition.name
    }

    /// The type nested selections are resolved against.
    pub fn output_type(&self) -> &Name {
        self.definition.ty.inner_named_type()
    }
}

/// A named fragment, inlined with the selections of its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub name: Name,
    pub type_condition: Name,
    pub selection_set: Vec<Selection>,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub selection_set: Vec<Selection>,
    pub directives: Vec<Directive>,
}

impl Selection {
    pub fn directives(&self) -> &[Directive] {
        match self {
            Selection::Field(field) => &field.directives,
            Selection::FragmentSpread(spread) => &spread.directives,
            Selection::InlineFragment(fragment) => &fragment.directives,
        }
    }

    pub fn selection_set(&self) -> Option<&[Selection]> {
        match self {
            Selection::Field(field) => field.selection_set.as_deref(),
            Selection::FragmentSpread(spread) => Some(&spread.selection_set),
            Selection::InlineFragment(fragment) => Some(&fragment.selection_set),
        }
    }
}
