//! Serde shapes of the persisted JSON document.
//!
//! These mirror the stored payload one to one. Names are plain strings here; binding them to
//! schema definitions is the decoder's job.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::spec::OperationKind;

pub(crate) type WirePayload = Vec<WireOperation>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOperation {
    #[serde(rename = "type")]
    pub(crate) kind: OperationKind,
    pub(crate) name: Option<String>,
    pub(crate) selection_set: Vec<WireSelection>,
    pub(crate) variable_set: Vec<WireVariable>,
    pub(crate) directive_set: Vec<WireDirective>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireVariable {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) ty: WireType,
    pub(crate) default_value: Option<WireValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireDirective {
    pub(crate) directive: String,
    pub(crate) arguments: Vec<WireArgumentValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireArgumentValue {
    pub(crate) argument: String,
    pub(crate) value: WireValue,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) defaulted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "selectionType")]
pub(crate) enum WireSelection {
    Field(WireField),
    FragmentSpread(WireFragmentSpread),
    InlineFragment(WireInlineFragment),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireField {
    pub(crate) field_name: String,
    pub(crate) alias: String,
    pub(crate) argument_value_set: Vec<WireArgumentValue>,
    pub(crate) directive_set: Vec<WireDirective>,
    pub(crate) selection_set: Option<Vec<WireSelection>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireFragmentSpread {
    pub(crate) fragment_name: String,
    pub(crate) selection_set: Vec<WireSelection>,
    pub(crate) directive_set: Vec<WireDirective>,
    pub(crate) type_cond: WireType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireInlineFragment {
    pub(crate) selection_set: Vec<WireSelection>,
    pub(crate) directive_set: Vec<WireDirective>,
    pub(crate) type_cond: Option<WireType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum WireType {
    Named {
        name: String,
    },
    List {
        inner: Box<WireType>,
    },
    #[serde(rename = "notnull")]
    NonNull {
        inner: Box<WireType>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "valueType")]
pub(crate) enum WireValue {
    Null {
        #[serde(rename = "type")]
        ty: WireType,
    },
    Scalar {
        #[serde(rename = "type")]
        ty: WireType,
        value: serde_json::Value,
        #[serde(
            rename = "resolverValue",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        resolver_value: Option<WireResolverValue>,
    },
    Enum {
        #[serde(rename = "type")]
        ty: WireType,
        value: String,
    },
    Variable {
        #[serde(rename = "type")]
        ty: WireType,
        #[serde(rename = "variableName")]
        variable_name: String,
    },
    List {
        #[serde(rename = "type")]
        ty: WireType,
        inner: Vec<WireValue>,
    },
    InputObject {
        #[serde(rename = "type")]
        ty: WireType,
        inner: IndexMap<String, WireArgumentValue>,
    },
}

/// A resolver value as its tag plus base64 encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireResolverValue {
    pub(crate) tag: String,
    pub(crate) data: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn argument_value_shape() {
        let argument = WireArgumentValue {
            argument: "arg1".to_string(),
            value: WireValue::Scalar {
                ty: WireType::Named {
                    name: "Int".to_string(),
                },
                value: json!(456),
                resolver_value: None,
            },
            defaulted: false,
        };
        insta::assert_snapshot!(
            serde_json::to_string(&argument).unwrap(),
            @r###"{"argument":"arg1","value":{"valueType":"Scalar","type":{"type":"named","name":"Int"},"value":456}}"###
        );
    }

    #[test]
    fn defaulted_flag_is_written_only_when_set() {
        let argument: WireArgumentValue = serde_json::from_value(json!({
            "argument": "arg1",
            "value": {"valueType": "Null", "type": {"type": "named", "name": "Int"}},
            "defaulted": true
        }))
        .unwrap();
        assert!(argument.defaulted);
        assert_eq!(
            serde_json::to_value(&argument).unwrap()["defaulted"],
            json!(true)
        );

        let argument: WireArgumentValue = serde_json::from_value(json!({
            "argument": "arg1",
            "value": {"valueType": "Null", "type": {"type": "named", "name": "Int"}}
        }))
        .unwrap();
        assert!(!argument.defaulted);
    }

    #[test]
    fn nested_type_tags() {
        let ty: WireType = serde_json::from_value(json!({
            "type": "notnull",
            "inner": {"type": "list", "inner": {"type": "named", "name": "Int"}}
        }))
        .unwrap();
        assert_eq!(
            ty,
            WireType::NonNull {
                inner: Box::new(WireType::List {
                    inner: Box::new(WireType::Named {
                        name: "Int".to_string()
                    })
                })
            }
        );
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(serde_json::from_value::<WireType>(json!({"type": "set", "inner": null})).is_err());
        assert!(serde_json::from_value::<WireValue>(json!({
            "valueType": "Object",
            "type": {"type": "named", "name": "Int"}
        }))
        .is_err());
        assert!(serde_json::from_value::<WireSelection>(json!({
            "selectionType": "Fragment",
            "selectionSet": [],
            "directiveSet": []
        }))
        .is_err());
        assert!(serde_json::from_value::<WireOperation>(json!({
            "type": "command",
            "name": null,
            "selectionSet": [],
            "variableSet": [],
            "directiveSet": []
        }))
        .is_err());
    }

    #[test]
    fn leaf_fields_write_a_null_selection_set() {
        let field = WireSelection::Field(WireField {
            field_name: "scalar".to_string(),
            alias: "scalar".to_string(),
            argument_value_set: vec![],
            directive_set: vec![],
            selection_set: None,
        });
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "selectionType": "Field",
                "fieldName": "scalar",
                "alias": "scalar",
                "argumentValueSet": [],
                "directiveSet": [],
                "selectionSet": null
            })
        );
    }
}
