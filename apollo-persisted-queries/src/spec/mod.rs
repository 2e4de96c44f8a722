//! The schema-bound normalized request model.
//!
//! Every name in this model (types, fields, arguments, directives) has already been bound to its
//! definition in a [`Schema`], so an executor can walk it without further lookups. Variable
//! references are the exception: they stay lookups by name into the enclosing operation.

mod operation;
mod schema;
mod selection;
mod type_reference;
mod value;

use std::fmt::Display;

pub use operation::Directive;
pub use operation::NormalizedRequest;
pub use operation::Operation;
pub use operation::Variable;
pub use schema::Schema;
pub use selection::Field;
pub use selection::FragmentSpread;
pub use selection::InlineFragment;
pub use selection::Selection;
use serde::Deserialize;
use serde::Serialize;
pub use type_reference::TypeReference;
#[cfg(test)]
pub(crate) use value::test_values;
pub use value::ArgumentValue;
pub use value::InputedValue;
pub use value::ResolverValue;
pub use value::ResolverValueRegistry;
pub use value::ScalarValue;
pub(crate) use value::scalar_field;

/// GraphQL operation type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl OperationKind {
    pub const fn default_type_name(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl From<OperationKind> for apollo_compiler::ast::OperationType {
    fn from(value: OperationKind) -> Self {
        match value {
            OperationKind::Query => apollo_compiler::ast::OperationType::Query,
            OperationKind::Mutation => apollo_compiler::ast::OperationType::Mutation,
            OperationKind::Subscription => apollo_compiler::ast::OperationType::Subscription,
        }
    }
}

impl From<apollo_compiler::ast::OperationType> for OperationKind {
    fn from(value: apollo_compiler::ast::OperationType) -> Self {
        match value {
            apollo_compiler::ast::OperationType::Query => OperationKind::Query,
            apollo_compiler::ast::OperationType::Mutation => OperationKind::Mutation,
            apollo_compiler::ast::OperationType::Subscription => OperationKind::Subscription,
        }
    }
}
