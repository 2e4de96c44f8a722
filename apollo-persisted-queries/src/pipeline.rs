//! A request pipeline that runs modules around parsing, validation and normalization.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::module::Context;
use crate::module::FinalizedRequest;
use crate::module::Module;
use crate::module::Request;
use crate::module::RequestStage;
use crate::module::Response;
use crate::normalizer::parse_and_validate;
use crate::normalizer::Normalizer;
use crate::spec::NormalizedRequest;
use crate::spec::ResolverValueRegistry;
use crate::spec::Schema;

/// Executes finalized requests.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, request: &FinalizedRequest) -> Response;
}

pub struct Pipeline {
    schema: Arc<Schema>,
    resolver_values: Arc<ResolverValueRegistry>,
    modules: Vec<Arc<dyn Module>>,
    executor: Arc<dyn Executor>,
    parse_count: AtomicUsize,
}

#[buildstructor::buildstructor]
impl Pipeline {
    #[builder]
    pub fn new(
        schema: Arc<Schema>,
        resolver_values: Option<Arc<ResolverValueRegistry>>,
        modules: Vec<Arc<dyn Module>>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            schema,
            resolver_values: resolver_values.unwrap_or_default(),
            modules,
            executor,
            parse_count: AtomicUsize::new(0),
        }
    }

    /// How many requests went through the parser so far.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::SeqCst)
    }

    pub async fn execute(&self, request: Request) -> Result<Response, PipelineError> {
        let mut context = Context::new();

        let mut stage = RequestStage::Raw(request);
        for module in &self.modules {
            stage = match stage {
                RequestStage::Raw(request) => module.process_request(request, &mut context).await?,
                normalized => normalized,
            };
        }

        let (normalized, operation_name) = match stage {
            RequestStage::Normalized {
                request,
                operation_name,
            } => {
                tracing::debug!("skipping parsing, request was already normalized");
                (request, operation_name)
            }
            RequestStage::Raw(request) => (
                self.normalize(&request, &mut context).await?,
                request.operation_name,
            ),
        };

        let mut normalized = normalized;
        for module in &self.modules {
            normalized = module.process_normalized(normalized, &mut context).await?;
        }

        let mut finalized = FinalizedRequest {
            request: normalized,
            operation_name,
        };
        for module in &self.modules {
            finalized = module.process_finalized(finalized, &mut context).await?;
        }

        let mut response = self.executor.execute(&finalized).await;
        for module in &self.modules {
            response = module.process_result(response, &mut context).await?;
        }
        Ok(response)
    }

    async fn normalize(
        &self,
        request: &Request,
        context: &mut Context,
    ) -> Result<NormalizedRequest, PipelineError> {
        self.parse_count.fetch_add(1, Ordering::SeqCst);
        let mut document = parse_and_validate(&self.schema, &request.query)?;
        for module in &self.modules {
            document = module.process_parsed(document, context).await?;
        }
        Ok(Normalizer::new(&self.schema, &self.resolver_values).normalize(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use test_log::test;

    use super::*;
    use crate::error::NormalizationError;
    use crate::spec::Selection;

    const SDL: &str = "type Query { me: String hello(name: String = \"world\"): String }";

    /// Answers with the response keys of the selected operation.
    struct Keys;

    #[async_trait]
    impl Executor for Keys {
        async fn execute(&self, request: &FinalizedRequest) -> Response {
            let keys = request
                .operation()
                .map(|operation| {
                    operation
                        .selection_set
                        .iter()
                        .filter_map(|selection| match selection {
                            Selection::Field(field) => Some(field.alias.to_string()),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Response {
                data: json!(keys),
                ..Default::default()
            }
        }
    }

    /// Records the order hooks ran in.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl Recorder {
        fn record(&self, hook: &'static str) {
            if let Ok(mut hooks) = self.0.lock() {
                hooks.push(hook);
            }
        }
    }

    #[async_trait]
    impl Module for Recorder {
        async fn process_request(
            &self,
            request: Request,
            _context: &mut Context,
        ) -> Result<RequestStage, PipelineError> {
            self.record("request");
            Ok(RequestStage::Raw(request))
        }

        async fn process_parsed(
            &self,
            document: apollo_compiler::validation::Valid<
                apollo_compiler::executable::ExecutableDocument,
            >,
            _context: &mut Context,
        ) -> Result<
            apollo_compiler::validation::Valid<apollo_compiler::executable::ExecutableDocument>,
            PipelineError,
        > {
            self.record("parsed");
            Ok(document)
        }

        async fn process_normalized(
            &self,
            request: NormalizedRequest,
            _context: &mut Context,
        ) -> Result<NormalizedRequest, PipelineError> {
            self.record("normalized");
            Ok(request)
        }

        async fn process_finalized(
            &self,
            request: FinalizedRequest,
            _context: &mut Context,
        ) -> Result<FinalizedRequest, PipelineError> {
            self.record("finalized");
            Ok(request)
        }

        async fn process_result(
            &self,
            response: Response,
            _context: &mut Context,
        ) -> Result<Response, PipelineError> {
            self.record("result");
            Ok(response)
        }
    }

    fn pipeline(modules: Vec<Arc<dyn Module>>) -> Pipeline {
        Pipeline::builder()
            .schema(Arc::new(Schema::parse(SDL).unwrap()))
            .modules(modules)
            .executor(Arc::new(Keys) as Arc<dyn Executor>)
            .build()
    }

    #[test(tokio::test)]
    async fn hooks_run_in_pipeline_order() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = pipeline(vec![recorder.clone() as Arc<dyn Module>]);
        let response = pipeline
            .execute(Request::new("{ me greeting: hello }"))
            .await
            .unwrap();
        assert_eq!(response.data, json!(["me", "greeting"]));
        assert_eq!(pipeline.parse_count(), 1);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            ["request", "parsed", "normalized", "finalized", "result"]
        );
    }

    #[test(tokio::test)]
    async fn operation_name_selects_the_operation() {
        let pipeline = pipeline(vec![]);
        let response = pipeline
            .execute(Request::new("query A { me } query B { hello }").with_operation_name("B"))
            .await
            .unwrap();
        assert_eq!(response.data, json!(["hello"]));
    }

    #[test(tokio::test)]
    async fn invalid_queries_fail_before_execution() {
        let pipeline = pipeline(vec![]);
        let error = pipeline
            .execute(Request::new("{ missing }"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            PipelineError::Normalization(NormalizationError::Validation(_))
        ));
    }
}
