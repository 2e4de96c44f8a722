use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::Name;
use apollo_compiler::Node;

use super::ArgumentValue;
use super::InputedValue;
use super::OperationKind;
use super::Selection;
use super::TypeReference;

/// An applied directive. Its arguments are bound to the directive's own argument definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub definition: Node<DirectiveDefinition>,
    pub arguments: Vec<ArgumentValue>,
}

impl Directive {
    pub fn name(&self) -> &Name {
        &self.definition.name
    }

    pub fn argument(&self, name: &str) -> Option<&InputedValue> {
        self.arguments
            .iter()
            .find(|argument| argument.name().as_str() == name)
            .map(|argument| &argument.value)
    }
}

/// A variable declared by an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Name,
    pub ty: TypeReference,
    pub default_value: Option<InputedValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<Name>,
    /// The schema's root type for `kind`, the type top level fields are bound against.
    pub root_type: Name,
    pub selection_set: Vec<Selection>,
    pub variables: Vec<Variable>,
    pub directives: Vec<Directive>,
}

impl Operation {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name.as_str() == name)
    }
}

/// A request whose operations are fully bound to a schema, ready for execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRequest {
    pub operations: Vec<Operation>,
}

impl NormalizedRequest {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Picks the operation to execute, as the request's `operationName` does.
    pub fn operation(&self, name: Option<&str>) -> Option<&Operation> {
        match name {
            Some(name) => self
                .operations
                .iter()
                .find(|operation| operation.name.as_deref() == Some(name)),
            None if self.operations.len() == 1 => self.operations.first(),
            None => None,
        }
    }
}
