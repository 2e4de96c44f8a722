use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;

use super::wire::WireArgumentValue;
use super::wire::WireDirective;
use super::wire::WireField;
use super::wire::WireFragmentSpread;
use super::wire::WireInlineFragment;
use super::wire::WireOperation;
use super::wire::WirePayload;
use super::wire::WireResolverValue;
use super::wire::WireSelection;
use super::wire::WireType;
use super::wire::WireValue;
use super::wire::WireVariable;
use crate::error::EncodeError;
use crate::spec::ArgumentValue;
use crate::spec::Directive;
use crate::spec::InputedValue;
use crate::spec::NormalizedRequest;
use crate::spec::Operation;
use crate::spec::Selection;
use crate::spec::TypeReference;
use crate::spec::Variable;

/// Serializes a normalized request to its persisted JSON form.
pub fn encode_normalized_request(request: &NormalizedRequest) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&to_wire(request))?)
}

pub(crate) fn to_wire(request: &NormalizedRequest) -> WirePayload {
    request.operations.iter().map(operation).collect()
}

fn operation(operation: &Operation) -> WireOperation {
    WireOperation {
        kind: operation.kind,
        name: operation.name.as_ref().map(ToString::to_string),
        selection_set: selection_set(&operation.selection_set),
        variable_set: operation.variables.iter().map(variable).collect(),
        directive_set: directives(&operation.directives),
    }
}

fn variable(variable: &Variable) -> WireVariable {
    WireVariable {
        name: variable.name.to_string(),
        ty: type_reference(&variable.ty),
        default_value: variable.default_value.as_ref().map(value),
    }
}

fn directives(directives: &[Directive]) -> Vec<WireDirective> {
    directives
        .iter()
        .map(|directive| WireDirective {
            directive: directive.name().to_string(),
            arguments: arguments(&directive.arguments),
        })
        .collect()
}

fn selection_set(selections: &[Selection]) -> Vec<WireSelection> {
    selections.iter().map(selection).collect()
}

fn selection(selection: &Selection) -> WireSelection {
    match selection {
        Selection::Field(field) => WireSelection::Field(WireField {
            field_name: field.name().to_string(),
            alias: field.alias.to_string(),
            argument_value_set: arguments(&field.arguments),
            directive_set: directives(&field.directives),
            selection_set: field.selection_set.as_deref().map(selection_set),
        }),
        Selection::FragmentSpread(spread) => WireSelection::FragmentSpread(WireFragmentSpread {
            fragment_name: spread.name.to_string(),
            selection_set: selection_set(&spread.selection_set),
            directive_set: directives(&spread.directives),
            type_cond: WireType::Named {
                name: spread.type_condition.to_string(),
            },
        }),
        Selection::InlineFragment(fragment) => WireSelection::InlineFragment(WireInlineFragment {
            selection_set: selection_set(&fragment.selection_set),
            directive_set: directives(&fragment.directives),
            type_cond: fragment
                .type_condition
                .as_ref()
                .map(|name| WireType::Named {
                    name: name.to_string(),
                }),
        }),
    }
}

fn arguments(arguments: &[ArgumentValue]) -> Vec<WireArgumentValue> {
    arguments.iter().map(argument).collect()
}

fn argument(argument: &ArgumentValue) -> WireArgumentValue {
    WireArgumentValue {
        argument: argument.name().to_string(),
        value: value(&argument.value),
        defaulted: argument.defaulted,
    }
}

fn value(value: &InputedValue) -> WireValue {
    let ty = type_reference(value.ty());
    match value {
        InputedValue::Null(_) => WireValue::Null { ty },
        InputedValue::Scalar(scalar) => WireValue::Scalar {
            ty,
            value: scalar.raw.clone(),
            resolver_value: scalar
                .resolver_value
                .as_ref()
                .map(|resolver_value| WireResolverValue {
                    tag: resolver_value.type_tag().to_string(),
                    data: BASE64_STANDARD.encode(resolver_value.to_bytes()),
                }),
        },
        InputedValue::Enum { value, .. } => WireValue::Enum {
            ty,
            value: value.to_string(),
        },
        InputedValue::Variable { name, .. } => WireValue::Variable {
            ty,
            variable_name: name.to_string(),
        },
        InputedValue::List { items, .. } => WireValue::List {
            ty,
            inner: items.iter().map(self::value).collect(),
        },
        InputedValue::InputObject { fields, .. } => WireValue::InputObject {
            ty,
            inner: fields
                .iter()
                .map(|field| (field.name().to_string(), argument(field)))
                .collect(),
        },
    }
}

fn type_reference(ty: &TypeReference) -> WireType {
    match ty {
        TypeReference::Named(name) => WireType::Named {
            name: name.to_string(),
        },
        TypeReference::List(inner) => WireType::List {
            inner: Box::new(type_reference(inner)),
        },
        TypeReference::NonNull(inner) => WireType::NonNull {
            inner: Box::new(type_reference(inner)),
        },
    }
}
