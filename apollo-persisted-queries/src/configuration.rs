use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

/// Persisted queries configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// How long a persisted entry is kept, in human-readable format; defaults to 1h
    #[serde(with = "humantime_serde", default = "default_ttl")]
    #[schemars(with = "String", default = "default_ttl")]
    pub ttl: Duration,

    /// Prefix for every cache key, as `{namespace}:{checksum}`.
    /// Changing it invalidates all previously persisted entries.
    pub namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[buildstructor::buildstructor]
impl Config {
    #[builder]
    pub fn new(ttl: Option<Duration>, namespace: Option<String>) -> Self {
        Self {
            ttl: ttl.unwrap_or_else(default_ttl),
            namespace,
        }
    }
}
