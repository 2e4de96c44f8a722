//! Request pipeline hooks.
//!
//! A [`Module`] sees a request at each stage of the pipeline and may replace what it is given.
//! Per-request state travels in the [`Context`] handed to every hook, never on the module itself,
//! so one module instance can serve concurrent requests.


use apollo_compiler::executable::ExecutableDocument;
use apollo_compiler::validation::Valid;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::PipelineError;
use crate::spec::NormalizedRequest;
use crate::spec::Operation;

/// A raw GraphQL request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub query: String,
    pub operation_name: Option<String>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
        }
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }
}

/// What the request stage hands to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestStage {
    /// The request still has to be parsed, validated and normalized.
    Raw(Request),
    /// A module already produced the normalized request; parsing is skipped.
    Normalized {
        request: NormalizedRequest,
        operation_name: Option<String>,
    },
}

/// A normalized request with the operation to execute picked out.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedRequest {
    pub request: NormalizedRequest,
    pub operation_name: Option<String>,
}

impl FinalizedRequest {
    pub fn operation(&self) -> Option<&Operation> {
        self.request.operation(self.operation_name.as_deref())
    }
}

/// The result of executing a finalized request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

/// A value that can be stored in a [`Context`].
pub trait ContextValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> ContextValue for T {}

/// Request scoped values, stored by type on top of `http::Extensions`.
///
/// Values are cloned when retrieved; wrap expensive ones in an `Arc`.
#[derive(Default, Clone)]
pub struct Context {
    inner: http::Extensions,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("entries", &self.inner.len())
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value from the context by type.
    pub fn get<T: ContextValue>(&self) -> Option<T> {
        self.inner.get::<T>().cloned()
    }

    /// Inserts a value, replacing any value of the same type.
    pub fn insert<T: ContextValue>(&mut self, value: T) {
        self.inner.insert(value);
    }

    pub fn remove<T: ContextValue>(&mut self) -> Option<T> {
        self.inner.remove::<T>()
    }
}

impl From<Context> for http::Extensions {
    fn from(context: Context) -> Self {
        context.inner
    }
}

impl From<http::Extensions> for Context {
    fn from(extensions: http::Extensions) -> Self {
        Self { inner: extensions }
    }
}

/// Pipeline hooks. Every hook defaults to passing its input through unchanged.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn process_request(
        &self,
        request: Request,
        _context: &mut Context,
    ) -> Result<RequestStage, PipelineError> {
        Ok(RequestStage::Raw(request))
    }

    async fn process_parsed(
        &self,
        document: Valid<ExecutableDocument>,
        _context: &mut Context,
    ) -> Result<Valid<ExecutableDocument>, PipelineError> {
        Ok(document)
    }

    async fn process_normalized(
        &self,
        request: NormalizedRequest,
        _context: &mut Context,
    ) -> Result<NormalizedRequest, PipelineError> {
        Ok(request)
    }

    async fn process_finalized(
        &self,
        request: FinalizedRequest,
        _context: &mut Context,
    ) -> Result<FinalizedRequest, PipelineError> {
        Ok(request)
    }

    async fn process_result(
        &self,
        response: Response,
        _context: &mut Context,
    ) -> Result<Response, PipelineError> {
        Ok(response)
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Marker(u32);

    #[test]
    fn context_stores_values_by_type() {
        let mut context = Context::new();
        context.insert(Marker(1));
        context.insert("hello".to_string());
        assert_eq!(context.get::<Marker>(), Some(Marker(1)));
        assert_eq!(context.get::<String>().as_deref(), Some("hello"));

        context.insert(Marker(2));
        assert_eq!(context.get::<Marker>(), Some(Marker(2)));

        assert_eq!(context.remove::<Marker>(), Some(Marker(2)));
        assert!(context.get::<Marker>().is_none());
        assert!(context.get::<u8>().is_none());
    }

    #[test]
    fn contexts_are_independent_copies() {
        let mut original = Context::new();
        original.insert(Marker(1));
        let mut copy = original.clone();
        copy.insert(Marker(2));
        copy.insert(7u8);
        assert_eq!(original.get::<Marker>(), Some(Marker(1)));
        assert!(original.get::<u8>().is_none());
        assert_eq!(copy.get::<Marker>(), Some(Marker(2)));
    }

    #[test]
    fn converts_to_and_from_http_extensions() {
        let mut context = Context::new();
        context.insert(Marker(3));
        let extensions: http::Extensions = context.into();
        assert_eq!(extensions.get::<Marker>(), Some(&Marker(3)));
        let context = Context::from(extensions);
        assert_eq!(context.get::<Marker>(), Some(Marker(3)));
    }

    struct PassThrough;

    impl Module for PassThrough {}

    #[tokio::test]
    async fn hooks_pass_through_by_default() {
        let module = PassThrough;
        let mut context = Context::new();
        let request = Request::new("{ me }").with_operation_name("Me");
        assert_eq!(
            module
                .process_request(request.clone(), &mut context)
                .await
                .unwrap(),
            RequestStage::Raw(request)
        );
        let normalized = module
            .process_normalized(NormalizedRequest::default(), &mut context)
            .await
            .unwrap();
        assert_eq!(normalized, NormalizedRequest::default());
        assert!(module.name().ends_with("PassThrough"));
    }
}
