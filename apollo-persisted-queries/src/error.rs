//! Persisted query errors.
use displaydoc::Display;
use thiserror::Error;

/// Errors raised while rebuilding a normalized request from its persisted form.
///
/// Any of these means the cache entry cannot be trusted: either it does not have the expected
/// shape, or it references something the live schema no longer defines.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// malformed persisted query encoding: {0}
    MalformedEncoding(String),

    /// unknown type '{0}'
    UnknownType(String),

    /// cannot find field '{field}' on type '{type_name}'
    UnknownField { type_name: String, field: String },

    /// unknown directive '@{0}'
    UnknownDirective(String),

    /// unknown variable '${0}'
    UnknownVariable(String),

    /// unknown argument '{argument}' on {scope}
    UnknownArgument { scope: String, argument: String },

    /// type '{0}' cannot be used as a type condition
    InvalidTypeCondition(String),

    /// no decoder registered for resolver value tag '{0}'
    UnknownResolverValue(String),

    /// invalid resolver value for tag '{tag}': {reason}
    InvalidResolverValue { tag: String, reason: String },
}

impl DecodeError {
    pub fn extension_code(&self) -> &'static str {
        match self {
            DecodeError::MalformedEncoding(_) => "PERSISTED_QUERY_MALFORMED",
            DecodeError::UnknownType(_) => "PERSISTED_QUERY_UNKNOWN_TYPE",
            DecodeError::UnknownField { .. } => "PERSISTED_QUERY_UNKNOWN_FIELD",
            DecodeError::UnknownDirective(_) => "PERSISTED_QUERY_UNKNOWN_DIRECTIVE",
            DecodeError::UnknownVariable(_) => "PERSISTED_QUERY_UNKNOWN_VARIABLE",
            DecodeError::UnknownArgument { .. } => "PERSISTED_QUERY_UNKNOWN_ARGUMENT",
            DecodeError::InvalidTypeCondition(_) => "PERSISTED_QUERY_INVALID_TYPE_CONDITION",
            DecodeError::UnknownResolverValue(_) | DecodeError::InvalidResolverValue { .. } => {
                "PERSISTED_QUERY_INVALID_RESOLVER_VALUE"
            }
        }
    }

    /// Whether the entry was well formed but no longer matches the schema.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            DecodeError::UnknownType(_)
                | DecodeError::UnknownField { .. }
                | DecodeError::UnknownDirective(_)
                | DecodeError::UnknownVariable(_)
                | DecodeError::UnknownArgument { .. }
                | DecodeError::InvalidTypeCondition(_)
        )
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::MalformedEncoding(err.to_string())
    }
}

/// Errors serializing a normalized request.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// could not serialize normalized request: {0}
    Serialize(String),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Serialize(err.to_string())
    }
}

/// Cache backend errors.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CacheError {
    /// cache backend error: {0}
    Backend(String),
}

/// Errors loading a schema.
#[derive(Error, Display, Debug, Clone)]
#[non_exhaustive]
pub enum SchemaError {
    /// schema validation failed: {0}
    Validate(String),
}

/// Errors turning a parsed document into a normalized request.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizationError {
    /// parsing error: {0}
    Parse(String),
    /// validation error: {0}
    Validation(String),
    /// schema has no root type for {0} operations
    MissingRootType(String),
    /// cannot query field '{field}' on type '{type_name}'
    InvalidField { type_name: String, field: String },
    /// unknown fragment '{0}'
    UnknownFragment(String),
    /// unknown directive '@{0}'
    UnknownDirective(String),
    /// undefined variable '${0}'
    UndefinedVariable(String),
    /// invalid value for type '{0}'
    InvalidValue(String),
}

/// Errors surfaced by the request pipeline.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// {0}
    Normalization(#[from] NormalizationError),
    /// {0}
    Cache(#[from] CacheError),
    /// {0}
    Decode(#[from] DecodeError),
    /// {0}
    Encode(#[from] EncodeError),
}
