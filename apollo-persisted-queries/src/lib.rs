//! Persisted normalized operations.
//!
//! Clients identify a query by the checksum of its text. When a normalized, schema-bound
//! representation of that query is already cached, the pipeline skips parsing, validation
//! and normalization and goes straight to execution. On a miss the normal pipeline runs and
//! the normalized result is stored for next time.

#![warn(unreachable_pub)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod cache;
pub mod codec;
mod configuration;
pub mod error;
pub mod module;
pub mod normalizer;
mod persisted_queries;
pub mod pipeline;
pub mod spec;

pub use configuration::Config;
pub use persisted_queries::CacheKey;
pub use persisted_queries::Lookup;
pub use persisted_queries::PersistedQueries;
pub use persisted_queries::PersistedQueryStatus;
pub use spec::NormalizedRequest;
pub use spec::ResolverValue;
pub use spec::ResolverValueRegistry;
pub use spec::Schema;
