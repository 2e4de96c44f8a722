use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use apollo_compiler::ast;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::Name;
use apollo_compiler::Node;

use super::TypeReference;
use crate::error::DecodeError;

/// A typed input value as it appears in argument, default value and directive positions.
#[derive(Debug, Clone, PartialEq)]
pub enum InputedValue {
    Null(TypeReference),
    Scalar(ScalarValue),
    Enum {
        ty: TypeReference,
        value: Name,
    },
    /// A reference to a variable of the enclosing operation, looked up by name.
    Variable {
        ty: TypeReference,
        name: Name,
    },
    List {
        ty: TypeReference,
        items: Vec<InputedValue>,
    },
    InputObject {
        ty: TypeReference,
        fields: Vec<ArgumentValue>,
    },
}

impl InputedValue {
    pub fn ty(&self) -> &TypeReference {
        match self {
            InputedValue::Null(ty)
            | InputedValue::Scalar(ScalarValue { ty, .. })
            | InputedValue::Enum { ty, .. }
            | InputedValue::Variable { ty, .. }
            | InputedValue::List { ty, .. }
            | InputedValue::InputObject { ty, .. } => ty,
        }
    }
}

/// A scalar literal, optionally carrying the result of custom scalar coercion.
#[derive(Debug, Clone)]
pub struct ScalarValue {
    pub ty: TypeReference,
    pub raw: serde_json::Value,
    pub resolver_value: Option<Arc<dyn ResolverValue>>,
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.raw == other.raw
            && match (&self.resolver_value, &other.resolver_value) {
                (None, None) => true,
                (Some(a), Some(b)) => a.type_tag() == b.type_tag() && a.to_bytes() == b.to_bytes(),
                _ => false,
            }
    }
}

/// An argument definition bound to the value given for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentValue {
    pub argument: Node<InputValueDefinition>,
    pub value: InputedValue,
    /// The value comes from the argument's default rather than the operation text.
    pub defaulted: bool,
}

impl ArgumentValue {
    pub fn name(&self) -> &Name {
        &self.argument.name
    }
}

/// The definition of a key inside an object literal given for a custom scalar.
///
/// Such keys have no schema definition. They are typed by the scalar itself, which lets a
/// variable nested in the literal keep its place in the tree.
pub(crate) fn scalar_field(name: Name, scalar: &Name) -> Node<InputValueDefinition> {
    Node::new(InputValueDefinition {
        description: None,
        name,
        ty: Node::new(ast::Type::Named(scalar.clone())),
        default_value: None,
        directives: Default::default(),
    })
}

/// The product of custom scalar coercion, attached to a [`ScalarValue`].
///
/// Values are persisted as their tag plus bytes, and rebuilt through the decoder registered
/// for that tag in a [`ResolverValueRegistry`].
pub trait ResolverValue: Any + fmt::Debug + Send + Sync {
    fn type_tag(&self) -> &str;

    fn to_bytes(&self) -> Vec<u8>;

    fn as_any(&self) -> &dyn Any;
}

type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<Arc<dyn ResolverValue>, String> + Send + Sync>;
type CoerceFn = Arc<dyn Fn(&serde_json::Value) -> Option<Arc<dyn ResolverValue>> + Send + Sync>;

/// Decoders and scalar coercions for resolver values.
#[derive(Clone, Default)]
pub struct ResolverValueRegistry {
    decoders: HashMap<String, DecodeFn>,
    coercions: HashMap<String, CoerceFn>,
}

impl fmt::Debug for ResolverValueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverValueRegistry")
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("coercions", &self.coercions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolverValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers how to rebuild values persisted under `tag`.
    pub fn with_decoder<F>(mut self, tag: impl Into<String>, decoder: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Arc<dyn ResolverValue>, String> + Send + Sync + 'static,
    {
        self.decoders.insert(tag.into(), Arc::new(decoder));
        self
    }

    /// Registers the coercion applied to literals of the custom scalar `scalar`.
    pub fn with_coercion<F>(mut self, scalar: impl Into<String>, coercion: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Option<Arc<dyn ResolverValue>> + Send + Sync + 'static,
    {
        self.coercions.insert(scalar.into(), Arc::new(coercion));
        self
    }

    pub(crate) fn decode(
        &self,
        tag: &str,
        bytes: &[u8],
    ) -> Result<Arc<dyn ResolverValue>, DecodeError> {
        let decoder = self
            .decoders
            .get(tag)
            .ok_or_else(|| DecodeError::UnknownResolverValue(tag.to_string()))?;
        let value = decoder(bytes).map_err(|reason| DecodeError::InvalidResolverValue {
            tag: tag.to_string(),
            reason,
        })?;
        if value.type_tag() != tag {
            return Err(DecodeError::InvalidResolverValue {
                tag: tag.to_string(),
                reason: format!("decoder produced a value tagged '{}'", value.type_tag()),
            });
        }
        Ok(value)
    }

    pub(crate) fn coerce(
        &self,
        scalar: &str,
        raw: &serde_json::Value,
    ) -> Option<Arc<dyn ResolverValue>> {
        self.coercions.get(scalar).and_then(|coerce| coerce(raw))
    }
}


#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::test_values::*;
    use super::*;

    fn scalar(resolver_value: Option<Arc<dyn ResolverValue>>) -> ScalarValue {
        ScalarValue {
            ty: TypeReference::named(name!("Day")),
            raw: serde_json::json!(18807),
            resolver_value,
        }
    }

    #[test]
    fn scalar_equality_compares_resolver_bytes() {
        assert_eq!(scalar(None), scalar(None));
        assert_eq!(
            scalar(Some(Arc::new(Day(1)))),
            scalar(Some(Arc::new(Day(1))))
        );
        assert_ne!(
            scalar(Some(Arc::new(Day(1)))),
            scalar(Some(Arc::new(Day(2))))
        );
        assert_ne!(scalar(Some(Arc::new(Day(1)))), scalar(None));
    }

    #[test]
    fn registry_decodes_registered_tags() {
        let registry = registry();
        let value = registry.decode("day", &7u32.to_be_bytes()).unwrap();
        assert_eq!(value.as_any().downcast_ref::<Day>(), Some(&Day(7)));

        assert_eq!(
            registry.decode("date", &[]).unwrap_err(),
            DecodeError::UnknownResolverValue("date".to_string())
        );
        assert!(matches!(
            registry.decode("day", &[1, 2]),
            Err(DecodeError::InvalidResolverValue { .. })
        ));
    }

    #[test]
    fn registry_coerces_only_known_scalars() {
        let registry = registry();
        assert!(registry.coerce("Day", &serde_json::json!(3)).is_some());
        assert!(registry.coerce("Day", &serde_json::json!("x")).is_none());
        assert!(registry.coerce("Int", &serde_json::json!(3)).is_none());
    }

    #[test]
    fn scalar_fields_are_typed_by_their_scalar() {
        let field = scalar_field(name!("a"), &name!("JSON"));
        assert_eq!(field.name.as_str(), "a");
        assert_eq!(field.ty.to_string(), "JSON");
        assert!(field.default_value.is_none());
        assert_eq!(field, scalar_field(name!("a"), &name!("JSON")));
    }
}
