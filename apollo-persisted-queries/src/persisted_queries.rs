use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheStorage;
use crate::codec::decode_normalized_request;
use crate::codec::encode_normalized_request;
use crate::configuration::Config;
use crate::error::CacheError;
use crate::error::PipelineError;
use crate::module::Context;
use crate::module::Module;
use crate::module::Request;
use crate::module::RequestStage;
use crate::spec::NormalizedRequest;
use crate::spec::ResolverValueRegistry;
use crate::spec::Schema;

/// The CRC-32 checksum of a query's text, which identifies its persisted entry.
///
/// Renders as the unsigned decimal checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u32);

impl CacheKey {
    pub fn from_query(query: &str) -> Self {
        CacheKey(crc32fast::hash(query.as_bytes()))
    }

    pub fn checksum(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outcome of looking a query up.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit {
        key: CacheKey,
        request: NormalizedRequest,
    },
    Miss {
        key: CacheKey,
    },
}

impl Lookup {
    pub fn key(&self) -> CacheKey {
        match self {
            Lookup::Hit { key, .. } | Lookup::Miss { key } => *key,
        }
    }
}

/// What the persisted queries module recorded about the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedQueryStatus {
    pub key: CacheKey,
    pub hit: bool,
}

/// Persists normalized requests, keyed by the checksum of their query text.
///
/// On a hit the request skips parsing, validation and normalization. On a miss the normalized
/// request is stored once the pipeline produces it.
#[derive(Clone)]
pub struct PersistedQueries {
    schema: Arc<Schema>,
    cache: Arc<dyn CacheStorage>,
    resolver_values: Arc<ResolverValueRegistry>,
    config: Config,
}

#[buildstructor::buildstructor]
impl PersistedQueries {
    #[builder]
    pub fn new(
        schema: Arc<Schema>,
        cache: Arc<dyn CacheStorage>,
        resolver_values: Option<Arc<ResolverValueRegistry>>,
        config: Option<Config>,
    ) -> Self {
        Self {
            schema,
            cache,
            resolver_values: resolver_values.unwrap_or_default(),
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The backend key for `key`, prefixed with the configured namespace.
    pub fn storage_key(&self, key: CacheKey) -> String {
        match &self.config.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_string(),
        }
    }

    /// Looks `query` up and rebuilds its normalized request.
    ///
    /// An entry that no longer decodes against the schema is removed and reported as a miss.
    pub async fn lookup(&self, query: &str) -> Result<Lookup, CacheError> {
        let key = CacheKey::from_query(query);
        let storage_key = self.storage_key(key);

        let Some(payload) = self.cache.get(&storage_key).await? else {
            tracing::trace!("persisted queries: cache miss");
            return Ok(Lookup::Miss { key });
        };

        match decode_normalized_request(&payload, &self.schema, &self.resolver_values) {
            Ok(request) => {
                tracing::trace!("persisted queries: cache hit");
                tracing::debug!(
                    key = %storage_key,
                    operations = request.operations.len(),
                    "persisted queries: rebuilt normalized request"
                );
                Ok(Lookup::Hit { key, request })
            }
            Err(error) => {
                tracing::warn!(
                    key = %storage_key,
                    code = error.extension_code(),
                    stale = error.is_stale(),
                    "persisted queries: discarding unusable cache entry: {error}"
                );
                self.cache.remove(&storage_key).await?;
                Ok(Lookup::Miss { key })
            }
        }
    }

    /// Stores `request` under `key` with the configured TTL.
    pub async fn store(
        &self,
        key: CacheKey,
        request: &NormalizedRequest,
    ) -> Result<(), PipelineError> {
        let payload = encode_normalized_request(request)?;
        self.cache
            .insert(&self.storage_key(key), payload, Some(self.config.ttl))
            .await?;
        tracing::trace!("persisted queries: cache insert");
        Ok(())
    }
}

#[async_trait]
impl Module for PersistedQueries {
    async fn process_request(
        &self,
        request: Request,
        context: &mut Context,
    ) -> Result<RequestStage, PipelineError> {
        match self.lookup(&request.query).await? {
            Lookup::Hit {
                key,
                request: normalized,
            } => {
                context.insert(PersistedQueryStatus { key, hit: true });
                Ok(RequestStage::Normalized {
                    request: normalized,
                    operation_name: request.operation_name,
                })
            }
            Lookup::Miss { key } => {
                context.insert(PersistedQueryStatus { key, hit: false });
                Ok(RequestStage::Raw(request))
            }
        }
    }

    async fn process_normalized(
        &self,
        request: NormalizedRequest,
        context: &mut Context,
    ) -> Result<NormalizedRequest, PipelineError> {
        match context.get::<PersistedQueryStatus>() {
            Some(status) => self.store(status.key, &request).await?,
            None => tracing::debug!("persisted queries: no key recorded for this request"),
        }
        Ok(request)
    }

    fn name(&self) -> &'static str {
        "persisted_queries"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;

    use super::*;
    use crate::cache::InMemoryCache;
    use crate::normalizer::parse_and_validate;
    use crate::normalizer::Normalizer;

    const SDL: &str = r#"
        type Query { field: Type }
        type Type { scalar: Int! fieldArg(arg1: Int): Int }
    "#;

    fn normalized(schema: &Schema, query: &str) -> NormalizedRequest {
        let document = parse_and_validate(schema, query).unwrap();
        Normalizer::new(schema, &ResolverValueRegistry::new())
            .normalize(&document)
            .unwrap()
    }

    fn module(cache: &InMemoryCache, config: Config) -> PersistedQueries {
        PersistedQueries::builder()
            .schema(Arc::new(Schema::parse(SDL).unwrap()))
            .cache(Arc::new(cache.clone()) as Arc<dyn CacheStorage>)
            .config(config)
            .build()
    }

    #[test]
    fn keys_are_crc32_of_the_query_text() {
        let key = CacheKey::from_query("{ field { field { field { scalar } } } }");
        assert_eq!(key.to_string(), "1920335920");
        assert_eq!(key.checksum(), 1920335920);
        assert_eq!(
            CacheKey::from_query("{ field { fieldArg(arg1: 456) } }").to_string(),
            "2503903000"
        );
    }

    #[test(tokio::test)]
    async fn storage_keys_are_namespaced() {
        let cache = InMemoryCache::default();
        let key = CacheKey::from_query("{ field { scalar } }");
        let plain = module(&cache, Config::default());
        assert_eq!(plain.storage_key(key), key.to_string());
        let namespaced = module(&cache, Config::builder().namespace("v2").build());
        assert_eq!(namespaced.storage_key(key), format!("v2:{key}"));
    }

    #[test(tokio::test)]
    async fn miss_then_hit() {
        let cache = InMemoryCache::default();
        let module = module(&cache, Config::default());
        let query = "{ field { fieldArg(arg1: 456) } }";

        let lookup = module.lookup(query).await.unwrap();
        assert_eq!(lookup, Lookup::Miss { key: CacheKey::from_query(query) });

        let request = normalized(&module.schema, query);
        module.store(lookup.key(), &request).await.unwrap();
        assert_eq!(
            cache.ttl(&lookup.key().to_string()).await,
            Some(Duration::from_secs(3600))
        );

        match module.lookup(query).await.unwrap() {
            Lookup::Hit { key, request: hit } => {
                assert_eq!(key, lookup.key());
                assert_eq!(hit, request);
            }
            miss => panic!("expected a hit, got {miss:?}"),
        }
    }

    #[test(tokio::test)]
    async fn unusable_entries_are_removed() {
        let cache = InMemoryCache::default();
        let module = module(&cache, Config::default());
        let query = "{ field { scalar } }";
        let key = CacheKey::from_query(query).to_string();

        cache
            .insert(&key, "[{\"type\": \"query\"".to_string(), None)
            .await
            .unwrap();
        assert!(matches!(
            module.lookup(query).await.unwrap(),
            Lookup::Miss { .. }
        ));
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[test(tokio::test)]
    async fn the_key_travels_in_the_context() {
        let cache = InMemoryCache::default();
        let module = module(&cache, Config::builder().ttl(Duration::from_secs(30 * 60)).build());
        let query = "{ field { scalar } }";

        let mut first = Context::new();
        let mut second = Context::new();
        let stage = module
            .process_request(Request::new(query), &mut first)
            .await
            .unwrap();
        assert!(matches!(stage, RequestStage::Raw(_)));
        module
            .process_request(Request::new("{ field { fieldArg } }"), &mut second)
            .await
            .unwrap();

        // The second request must not overwrite the first one's key.
        let request = normalized(&module.schema, query);
        module
            .process_normalized(request.clone(), &mut first)
            .await
            .unwrap();

        let key = CacheKey::from_query(query);
        assert_eq!(
            first.get::<PersistedQueryStatus>(),
            Some(PersistedQueryStatus { key, hit: false })
        );
        assert_eq!(
            cache.ttl(&key.to_string()).await,
            Some(Duration::from_secs(1800))
        );

        let mut third = Context::new();
        match module
            .process_request(Request::new(query).with_operation_name("Q"), &mut third)
            .await
            .unwrap()
        {
            RequestStage::Normalized {
                request: hit,
                operation_name,
            } => {
                assert_eq!(hit, request);
                assert_eq!(operation_name.as_deref(), Some("Q"));
            }
            raw => panic!("expected a hit, got {raw:?}"),
        }
        assert_eq!(
            third.get::<PersistedQueryStatus>(),
            Some(PersistedQueryStatus { key, hit: true })
        );
    }

    #[test(tokio::test)]
    async fn nothing_is_stored_without_a_recorded_key() {
        let cache = InMemoryCache::default();
        let module = module(&cache, Config::default());
        let request = normalized(&module.schema, "{ field { scalar } }");
        module
            .process_normalized(request, &mut Context::new())
            .await
            .unwrap();
        assert!(cache.is_empty().await);
    }
}
