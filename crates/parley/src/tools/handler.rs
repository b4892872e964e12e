//! Executable side of a tool: closure-based and typed handlers.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};

/// Core trait for the function behind a tool.
///
/// A handler receives the raw input the model produced and returns the text handed
/// back to the model. Its only observable effect on the agent is that return value.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Value) -> AgentResult<String>;
}

type HandlerFn = dyn Fn(Value) -> BoxFuture<'static, AgentResult<String>> + Send + Sync;

/// Handler over raw json input, for tools that author their schema by hand.
pub struct FnHandler {
    handler: Arc<HandlerFn>,
}

impl FnHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgentResult<String>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |input| Box::pin(handler(input))),
        }
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn call(&self, input: Value) -> AgentResult<String> {
        (self.handler)(input).await
    }
}

/// Handler that decodes the raw input into `I` before running.
///
/// A decode failure is reported as invalid parameters, an error from the handler
/// itself as an execution error.
pub struct TypedHandler<I, F> {
    handler: F,
    _input: PhantomData<fn() -> I>,
}

impl<I, F, Fut> TypedHandler<I, F>
where
    F: Fn(I) -> Fut,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _input: PhantomData,
        }
    }
}

#[async_trait]
impl<I, F, Fut> ToolHandler for TypedHandler<I, F>
where
    I: DeserializeOwned + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn call(&self, input: Value) -> AgentResult<String> {
        let input: I = serde_json::from_value(input)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;
        (self.handler)(input)
            .await
            .map_err(|e| AgentError::ExecutionError(format!("{:#}", e)))
    }
}
