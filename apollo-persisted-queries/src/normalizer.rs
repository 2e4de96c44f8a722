//! Normalization of validated executable documents.
//!
//! This is the slow path a persisted entry lets a request skip. Arguments are bound to their
//! definitions and completed with schema defaults, named fragments are inlined under their type
//! condition, and every literal is typed by the argument or input field it is given for.

use apollo_compiler::ast;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::executable;
use apollo_compiler::executable::ExecutableDocument;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;

use crate::error::NormalizationError;
use crate::spec::ArgumentValue;
use crate::spec::Directive;
use crate::spec::Field;
use crate::spec::FragmentSpread;
use crate::spec::InlineFragment;
use crate::spec::InputedValue;
use crate::spec::NormalizedRequest;
use crate::spec::Operation;
use crate::spec::OperationKind;
use crate::spec::ResolverValueRegistry;
use crate::spec::ScalarValue;
use crate::spec::Schema;
use crate::spec::Selection;
use crate::spec::TypeReference;
use crate::spec::Variable;
use crate::spec::scalar_field;

/// Parses and validates query text against `schema`.
pub fn parse_and_validate(
    schema: &Schema,
    query: &str,
) -> Result<Valid<ExecutableDocument>, NormalizationError> {
    let document = ExecutableDocument::parse(schema.definitions(), query, "query.graphql")
        .map_err(|invalid| NormalizationError::Parse(invalid.errors.to_string()))?;
    document
        .validate(schema.definitions())
        .map_err(|invalid| NormalizationError::Validation(invalid.errors.to_string()))
}

/// Turns validated documents into [`NormalizedRequest`]s.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    schema: &'a Schema,
    resolver_values: &'a ResolverValueRegistry,
}

/// The document and operation a value or selection is normalized within.
#[derive(Clone, Copy)]
struct Scope<'a> {
    document: &'a ExecutableDocument,
    variables: &'a [Node<ast::VariableDefinition>],
}

impl<'a> Normalizer<'a> {
    pub fn new(schema: &'a Schema, resolver_values: &'a ResolverValueRegistry) -> Self {
        Self {
            schema,
            resolver_values,
        }
    }

    pub fn normalize(
        &self,
        document: &Valid<ExecutableDocument>,
    ) -> Result<NormalizedRequest, NormalizationError> {
        document
            .operations
            .iter()
            .map(|operation| self.operation(document, operation))
            .collect::<Result<Vec<_>, _>>()
            .map(NormalizedRequest::new)
    }

    fn operation(
        &self,
        document: &ExecutableDocument,
        operation: &executable::Operation,
    ) -> Result<Operation, NormalizationError> {
        let kind = OperationKind::from(operation.operation_type);
        let root_type = self
            .schema
            .root_type(kind)
            .ok_or_else(|| NormalizationError::MissingRootType(kind.to_string()))?
            .clone();
        let scope = Scope {
            document,
            variables: &operation.variables,
        };

        let variables = operation
            .variables
            .iter()
            .map(|variable| {
                let ty = TypeReference::from(&*variable.ty);
                let default_value = variable
                    .default_value
                    .as_ref()
                    .map(|value| self.value(value, &ty, scope))
                    .transpose()?;
                Ok(Variable {
                    name: variable.name.clone(),
                    ty,
                    default_value,
                })
            })
            .collect::<Result<_, NormalizationError>>()?;

        Ok(Operation {
            kind,
            name: operation.name.clone(),
            root_type,
            selection_set: self.selection_set(&operation.selection_set, scope)?,
            variables,
            directives: self.directives(&operation.directives, scope)?,
        })
    }

    fn selection_set(
        &self,
        selection_set: &executable::SelectionSet,
        scope: Scope<'_>,
    ) -> Result<Vec<Selection>, NormalizationError> {
        selection_set
            .selections
            .iter()
            .map(|selection| self.selection(&selection_set.ty, selection, scope))
            .collect()
    }

    fn selection(
        &self,
        parent_type: &Name,
        selection: &executable::Selection,
        scope: Scope<'_>,
    ) -> Result<Selection, NormalizationError> {
        Ok(match selection {
            executable::Selection::Field(field) => {
                let definition = self
                    .schema
                    .type_field(parent_type, &field.name)
                    .ok_or_else(|| NormalizationError::InvalidField {
                        type_name: parent_type.to_string(),
                        field: field.name.to_string(),
                    })?;
                let selection_set = if self.schema.is_composite(definition.ty.inner_named_type())
                {
                    Some(self.selection_set(&field.selection_set, scope)?)
                } else {
                    None
                };
                Selection::Field(Field {
                    definition: definition.clone(),
                    alias: field.response_key().clone(),
                    arguments: self.arguments(&field.arguments, &definition.arguments, scope)?,
                    directives: self.directives(&field.directives, scope)?,
                    selection_set,
                })
            }
            executable::Selection::FragmentSpread(spread) => {
                let fragment = scope
                    .document
                    .fragments
                    .get(&spread.fragment_name)
                    .ok_or_else(|| {
                        NormalizationError::UnknownFragment(spread.fragment_name.to_string())
                    })?;
                Selection::FragmentSpread(FragmentSpread {
                    name: spread.fragment_name.clone(),
                    type_condition: fragment.type_condition().clone(),
                    selection_set: self.selection_set(&fragment.selection_set, scope)?,
                    directives: self.directives(&spread.directives, scope)?,
                })
            }
            executable::Selection::InlineFragment(inline) => {
                Selection::InlineFragment(InlineFragment {
                    type_condition: inline.type_condition.clone(),
                    selection_set: self.selection_set(&inline.selection_set, scope)?,
                    directives: self.directives(&inline.directives, scope)?,
                })
            }
        })
    }

    fn directives(
        &self,
        directives: &executable::DirectiveList,
        scope: Scope<'_>,
    ) -> Result<Vec<Directive>, NormalizationError> {
        directives
            .iter()
            .map(|directive| {
                let definition = self
                    .schema
                    .directive(&directive.name)
                    .ok_or_else(|| NormalizationError::UnknownDirective(directive.name.to_string()))?;
                Ok(Directive {
                    definition: definition.clone(),
                    arguments: self.arguments(
                        &directive.arguments,
                        &definition.arguments,
                        scope,
                    )?,
                })
            })
            .collect()
    }

    /// Binds given arguments to `definitions`, in definition order.
    ///
    /// Omitted arguments take their default value when they have one and are left out otherwise.
    fn arguments(
        &self,
        given: &[Node<ast::Argument>],
        definitions: &[Node<InputValueDefinition>],
        scope: Scope<'_>,
    ) -> Result<Vec<ArgumentValue>, NormalizationError> {
        let given = given
            .iter()
            .map(|argument| (&argument.name, &*argument.value));
        self.bind(given, definitions.iter(), scope)
    }

    fn bind<'v, 'd>(
        &self,
        given: impl Iterator<Item = (&'v Name, &'v ast::Value)> + Clone,
        definitions: impl Iterator<Item = &'d Node<InputValueDefinition>>,
        scope: Scope<'_>,
    ) -> Result<Vec<ArgumentValue>, NormalizationError> {
        let mut arguments = Vec::new();
        for definition in definitions {
            let ty = TypeReference::from(&*definition.ty);
            let given_value = given
                .clone()
                .find(|(name, _)| **name == definition.name)
                .map(|(_, value)| value);
            let (value, defaulted) = match (given_value, &definition.default_value) {
                (Some(value), _) => (value, false),
                (None, Some(default)) => (&**default, true),
                (None, None) => continue,
            };
            arguments.push(ArgumentValue {
                argument: definition.clone(),
                value: self.value(value, &ty, scope)?,
                defaulted,
            });
        }
        Ok(arguments)
    }

    /// Types `value` by the declared type `ty` of the site it is given for.
    fn value(
        &self,
        value: &ast::Value,
        ty: &TypeReference,
        scope: Scope<'_>,
    ) -> Result<InputedValue, NormalizationError> {
        match value {
            ast::Value::Null => return Ok(InputedValue::Null(ty.nullable().clone())),
            ast::Value::Variable(name) => {
                let declared = scope
                    .variables
                    .iter()
                    .find(|variable| variable.name == *name)
                    .ok_or_else(|| NormalizationError::UndefinedVariable(name.to_string()))?;
                return Ok(InputedValue::Variable {
                    ty: TypeReference::from(&*declared.ty),
                    name: name.clone(),
                });
            }
            _ => {}
        }

        if let Some(item_type) = ty.item_type() {
            let items = match value {
                ast::Value::List(items) => items
                    .iter()
                    .map(|item| self.value(item, item_type, scope))
                    .collect::<Result<_, _>>()?,
                // A single value given for a list is a list of one.
                other => vec![self.value(other, item_type, scope)?],
            };
            return Ok(InputedValue::List {
                ty: ty.nullable().clone(),
                items,
            });
        }

        let named = ty.inner_named_type();
        let invalid = || NormalizationError::InvalidValue(ty.to_string());
        match (self.schema.type_definition(named), value) {
            (Some(ExtendedType::Scalar(_)), value) => self.scalar(value, named, scope),
            (Some(ExtendedType::Enum(_)), ast::Value::Enum(member)) => Ok(InputedValue::Enum {
                ty: TypeReference::named(named.clone()),
                value: member.clone(),
            }),
            (Some(ExtendedType::InputObject(input)), ast::Value::Object(fields)) => {
                let given = fields.iter().map(|(name, value)| (name, &**value));
                let definitions = input.fields.values().map(|component| &component.node);
                Ok(InputedValue::InputObject {
                    ty: TypeReference::named(named.clone()),
                    fields: self.bind(given, definitions, scope)?,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// A literal given for the scalar `named`.
    ///
    /// Custom scalars accept any literal shape. A list or object that embeds variables is kept as
    /// a tree so each variable stays typed by its declaration.
    fn scalar(
        &self,
        value: &ast::Value,
        named: &Name,
        scope: Scope<'_>,
    ) -> Result<InputedValue, NormalizationError> {
        let ty = TypeReference::named(named.clone());
        match value {
            ast::Value::Variable(_) => self.value(value, &ty, scope),
            ast::Value::List(items) if has_variable(value) => Ok(InputedValue::List {
                items: items
                    .iter()
                    .map(|item| self.scalar(item, named, scope))
                    .collect::<Result<_, _>>()?,
                ty,
            }),
            ast::Value::Object(fields) if has_variable(value) => Ok(InputedValue::InputObject {
                fields: fields
                    .iter()
                    .map(|(name, value)| {
                        Ok(ArgumentValue {
                            argument: scalar_field(name.clone(), named),
                            value: self.scalar(value, named, scope)?,
                            defaulted: false,
                        })
                    })
                    .collect::<Result<_, NormalizationError>>()?,
                ty,
            }),
            value => {
                let raw = literal(value);
                Ok(InputedValue::Scalar(ScalarValue {
                    resolver_value: self.resolver_values.coerce(named, &raw),
                    raw,
                    ty,
                }))
            }
        }
    }
}

fn has_variable(value: &ast::Value) -> bool {
    match value {
        ast::Value::Variable(_) => true,
        ast::Value::List(items) => items.iter().any(|item| has_variable(item)),
        ast::Value::Object(fields) => fields.iter().any(|(_, value)| has_variable(value)),
        _ => false,
    }
}

/// The JSON form of a variable free literal given for a scalar.
///
/// Numbers JSON cannot hold exactly, such as integers past 64 bits or floats past `f64`, keep
/// their source text as a string.
fn literal(value: &ast::Value) -> serde_json::Value {
    match value {
        ast::Value::Null => serde_json::Value::Null,
        ast::Value::Variable(name) => name.as_str().into(),
        ast::Value::String(s) => s.as_str().into(),
        ast::Value::Enum(e) => e.as_str().into(),
        ast::Value::Boolean(b) => (*b).into(),
        ast::Value::Float(f) => f
            .as_str()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| f.as_str().into()),
        ast::Value::Int(i) => {
            let s = i.as_str();
            s.parse::<i64>()
                .map(Into::into)
                .or_else(|_| s.parse::<u64>().map(Into::into))
                .unwrap_or_else(|_| s.into())
        }
        ast::Value::List(items) => items.iter().map(|item| literal(item)).collect(),
        ast::Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), literal(value)))
                .collect(),
        ),
    }
}
