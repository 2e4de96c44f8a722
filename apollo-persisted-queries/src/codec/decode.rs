//! Rebuilds a normalized request from its persisted form.
//!
//! Decoding is a linking pass: every name in the payload is bound against the live schema, and
//! the first name that no longer resolves aborts the whole decode. The type that field names are
//! resolved against is handed down the recursion, so entering a field or fragment scopes it to
//! that subtree only.

use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::InputObjectType;
use apollo_compiler::Name;
use apollo_compiler::Node;
use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;

use super::wire::WireArgumentValue;
use super::wire::WireDirective;
use super::wire::WireOperation;
use super::wire::WirePayload;
use super::wire::WireResolverValue;
use super::wire::WireSelection;
use super::wire::WireType;
use super::wire::WireValue;
use crate::error::DecodeError;
use crate::spec::ArgumentValue;
use crate::spec::Directive;
use crate::spec::Field;
use crate::spec::FragmentSpread;
use crate::spec::InlineFragment;
use crate::spec::InputedValue;
use crate::spec::NormalizedRequest;
use crate::spec::Operation;
use crate::spec::ResolverValue;
use crate::spec::ResolverValueRegistry;
use crate::spec::ScalarValue;
use crate::spec::Schema;
use crate::spec::Selection;
use crate::spec::TypeReference;
use crate::spec::Variable;
use crate::spec::scalar_field;

/// Parses a persisted payload and binds it against `schema`.
pub fn decode_normalized_request(
    payload: &str,
    schema: &Schema,
    resolver_values: &ResolverValueRegistry,
) -> Result<NormalizedRequest, DecodeError> {
    let payload: WirePayload = serde_json::from_str(payload)?;
    Linker {
        schema,
        resolver_values,
    }
    .link(&payload)
}

/// The definitions an argument name is resolved against.
#[derive(Clone, Copy)]
enum ArgumentScope<'a> {
    Field(&'a FieldDefinition),
    Directive(&'a DirectiveDefinition),
    InputObject(&'a InputObjectType),
    /// An object literal given for a custom scalar, whose keys are typed by the scalar.
    Scalar(&'a Name),
}

impl ArgumentScope<'_> {
    fn lookup(self, name: &str) -> Option<Node<InputValueDefinition>> {
        match self {
            ArgumentScope::Field(field) => field
                .arguments
                .iter()
                .find(|argument| argument.name.as_str() == name)
                .cloned(),
            ArgumentScope::Directive(directive) => directive
                .arguments
                .iter()
                .find(|argument| argument.name.as_str() == name)
                .cloned(),
            ArgumentScope::InputObject(input) => input
                .fields
                .get(name)
                .map(|component| component.node.clone()),
            ArgumentScope::Scalar(scalar) => Name::new(name)
                .ok()
                .map(|name| scalar_field(name, scalar)),
        }
    }

    fn describe(self) -> String {
        match self {
            ArgumentScope::Field(field) => format!("field '{}'", field.name),
            ArgumentScope::Directive(directive) => format!("directive '@{}'", directive.name),
            ArgumentScope::InputObject(input) => format!("input type '{}'", input.name),
            ArgumentScope::Scalar(scalar) => format!("scalar '{scalar}'"),
        }
    }
}

struct Linker<'a> {
    schema: &'a Schema,
    resolver_values: &'a ResolverValueRegistry,
}

impl Linker<'_> {
    fn link(&self, payload: &WirePayload) -> Result<NormalizedRequest, DecodeError> {
        payload
            .iter()
            .map(|operation| self.operation(operation))
            .collect::<Result<Vec<_>, _>>()
            .map(NormalizedRequest::new)
    }

    fn operation(&self, operation: &WireOperation) -> Result<Operation, DecodeError> {
        let root_type = self
            .schema
            .root_type(operation.kind)
            .ok_or_else(|| {
                DecodeError::UnknownType(operation.kind.default_type_name().to_string())
            })?
            .clone();

        // Each default value may only see the variables declared before it.
        let mut variables: Vec<Variable> = Vec::with_capacity(operation.variable_set.len());
        for variable in &operation.variable_set {
            let default_value = variable
                .default_value
                .as_ref()
                .map(|value| self.value(value, &variables))
                .transpose()?;
            variables.push(Variable {
                name: name(&variable.name)?,
                ty: self.type_reference(&variable.ty)?,
                default_value,
            });
        }

        let directives = self.directives(&operation.directive_set, &variables)?;
        let selection_set = self.selection_set(&operation.selection_set, &root_type, &variables)?;

        Ok(Operation {
            kind: operation.kind,
            name: operation.name.as_deref().map(name).transpose()?,
            root_type,
            selection_set,
            variables,
            directives,
        })
    }

    fn selection_set(
        &self,
        selections: &[WireSelection],
        parent_type: &Name,
        variables: &[Variable],
    ) -> Result<Vec<Selection>, DecodeError> {
        selections
            .iter()
            .map(|selection| self.selection(selection, parent_type, variables))
            .collect()
    }

    fn selection(
        &self,
        selection: &WireSelection,
        parent_type: &Name,
        variables: &[Variable],
    ) -> Result<Selection, DecodeError> {
        match selection {
            WireSelection::Field(field) => {
                let definition = self
                    .schema
                    .type_field(parent_type, &field.field_name)
                    .ok_or_else(|| DecodeError::UnknownField {
                        type_name: parent_type.to_string(),
                        field: field.field_name.clone(),
                    })?;
                let selection_set = field
                    .selection_set
                    .as_ref()
                    .map(|selections| {
                        self.selection_set(
                            selections,
                            definition.ty.inner_named_type(),
                            variables,
                        )
                    })
                    .transpose()?;

                Ok(Selection::Field(Field {
                    definition: definition.clone(),
                    alias: name(&field.alias)?,
                    arguments: self.arguments(
                        &field.argument_value_set,
                        ArgumentScope::Field(definition),
                        variables,
                    )?,
                    directives: self.directives(&field.directive_set, variables)?,
                    selection_set,
                }))
            }
            WireSelection::FragmentSpread(spread) => {
                let type_condition = self.type_condition(&spread.type_cond)?;
                Ok(Selection::FragmentSpread(FragmentSpread {
                    name: name(&spread.fragment_name)?,
                    selection_set: self.selection_set(
                        &spread.selection_set,
                        &type_condition,
                        variables,
                    )?,
                    directives: self.directives(&spread.directive_set, variables)?,
                    type_condition,
                }))
            }
            WireSelection::InlineFragment(fragment) => {
                let type_condition = fragment
                    .type_cond
                    .as_ref()
                    .map(|ty| self.type_condition(ty))
                    .transpose()?;
                let scope = type_condition.as_ref().unwrap_or(parent_type);
                Ok(Selection::InlineFragment(InlineFragment {
                    selection_set: self.selection_set(
                        &fragment.selection_set,
                        scope,
                        variables,
                    )?,
                    directives: self.directives(&fragment.directive_set, variables)?,
                    type_condition,
                }))
            }
        }
    }

    fn type_condition(&self, ty: &WireType) -> Result<Name, DecodeError> {
        let WireType::Named { name } = ty else {
            return Err(DecodeError::MalformedEncoding(
                "type condition must be a named type".to_string(),
            ));
        };
        let type_name = self
            .schema
            .type_name(name)
            .ok_or_else(|| DecodeError::UnknownType(name.clone()))?;
        if !self.schema.is_composite(name) {
            return Err(DecodeError::InvalidTypeCondition(name.clone()));
        }
        Ok(type_name.clone())
    }

    fn directives(
        &self,
        directives: &[WireDirective],
        variables: &[Variable],
    ) -> Result<Vec<Directive>, DecodeError> {
        directives
            .iter()
            .map(|directive| {
                let definition = self
                    .schema
                    .directive(&directive.directive)
                    .ok_or_else(|| DecodeError::UnknownDirective(directive.directive.clone()))?;
                Ok(Directive {
                    definition: definition.clone(),
                    arguments: self.arguments(
                        &directive.arguments,
                        ArgumentScope::Directive(definition),
                        variables,
                    )?,
                })
            })
            .collect()
    }

    fn arguments(
        &self,
        arguments: &[WireArgumentValue],
        scope: ArgumentScope<'_>,
        variables: &[Variable],
    ) -> Result<Vec<ArgumentValue>, DecodeError> {
        arguments
            .iter()
            .map(|argument| self.argument(argument, scope, variables))
            .collect()
    }

    fn argument(
        &self,
        argument: &WireArgumentValue,
        scope: ArgumentScope<'_>,
        variables: &[Variable],
    ) -> Result<ArgumentValue, DecodeError> {
        name(&argument.argument)?;
        let definition =
            scope
                .lookup(&argument.argument)
                .ok_or_else(|| DecodeError::UnknownArgument {
                    scope: scope.describe(),
                    argument: argument.argument.clone(),
                })?;
        Ok(ArgumentValue {
            argument: definition,
            value: self.value(&argument.value, variables)?,
            defaulted: argument.defaulted,
        })
    }

    fn value(&self, value: &WireValue, variables: &[Variable]) -> Result<InputedValue, DecodeError> {
        Ok(match value {
            WireValue::Null { ty } => InputedValue::Null(self.type_reference(ty)?),
            WireValue::Scalar {
                ty,
                value,
                resolver_value,
            } => InputedValue::Scalar(ScalarValue {
                ty: self.type_reference(ty)?,
                raw: value.clone(),
                resolver_value: resolver_value
                    .as_ref()
                    .map(|resolver_value| self.resolver_value(resolver_value))
                    .transpose()?,
            }),
            WireValue::Enum { ty, value } => InputedValue::Enum {
                ty: self.type_reference(ty)?,
                value: name(value)?,
            },
            WireValue::Variable { ty, variable_name } => {
                let variable = variables
                    .iter()
                    .find(|variable| variable.name.as_str() == variable_name)
                    .ok_or_else(|| DecodeError::UnknownVariable(variable_name.clone()))?;
                InputedValue::Variable {
                    ty: self.type_reference(ty)?,
                    name: variable.name.clone(),
                }
            }
            WireValue::List { ty, inner } => InputedValue::List {
                ty: self.type_reference(ty)?,
                items: inner
                    .iter()
                    .map(|item| self.value(item, variables))
                    .collect::<Result<_, _>>()?,
            },
            WireValue::InputObject { ty, inner } => {
                let ty = self.type_reference(ty)?;
                let scope = match self.schema.type_definition(ty.inner_named_type()) {
                    Some(ExtendedType::InputObject(input)) => ArgumentScope::InputObject(input),
                    Some(ExtendedType::Scalar(scalar)) => ArgumentScope::Scalar(&scalar.name),
                    _ => {
                        return Err(DecodeError::MalformedEncoding(format!(
                            "'{}' is neither an input object nor a scalar type",
                            ty.inner_named_type()
                        )))
                    }
                };
                let fields = inner
                    .iter()
                    .map(|(key, field)| {
                        if *key != field.argument {
                            return Err(DecodeError::MalformedEncoding(format!(
                                "input field '{key}' holds a value for '{}'",
                                field.argument
                            )));
                        }
                        self.argument(field, scope, variables)
                    })
                    .collect::<Result<_, _>>()?;
                InputedValue::InputObject { ty, fields }
            }
        })
    }

    fn resolver_value(
        &self,
        resolver_value: &WireResolverValue,
    ) -> Result<std::sync::Arc<dyn ResolverValue>, DecodeError> {
        let bytes = BASE64_STANDARD
            .decode(&resolver_value.data)
            .map_err(|err| DecodeError::InvalidResolverValue {
                tag: resolver_value.tag.clone(),
                reason: err.to_string(),
            })?;
        self.resolver_values.decode(&resolver_value.tag, &bytes)
    }

    fn type_reference(&self, ty: &WireType) -> Result<TypeReference, DecodeError> {
        match ty {
            WireType::Named { name } => self
                .schema
                .type_name(name)
                .map(|name| TypeReference::Named(name.clone()))
                .ok_or_else(|| DecodeError::UnknownType(name.clone())),
            WireType::List { inner } => Ok(TypeReference::list(self.type_reference(inner)?)),
            WireType::NonNull { inner } => {
                if matches!(**inner, WireType::NonNull { .. }) {
                    return Err(DecodeError::MalformedEncoding(
                        "non null type wraps another non null type".to_string(),
                    ));
                }
                Ok(TypeReference::non_null(self.type_reference(inner)?))
            }
        }
    }
}

fn name(value: &str) -> Result<Name, DecodeError> {
    Name::new(value).map_err(|_| DecodeError::MalformedEncoding(format!("invalid name '{value}'")))
}
