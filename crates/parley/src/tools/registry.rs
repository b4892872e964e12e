use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::handler::{ToolHandler, TypedHandler};
use super::validation::validate_input;
use crate::errors::{AgentError, AgentResult, StartupError};
use crate::models::content::{ToolCall, ToolResult};
use crate::models::tool::Tool;
use crate::schema::generate_schema;

/// A declared tool together with the handler that runs it
pub struct RegisteredTool {
    pub tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// Validate the input against the declared schema, then run the handler
    pub async fn execute(&self, input: Value) -> AgentResult<String> {
        validate_input(&input, &self.tool.input_schema).map_err(AgentError::InvalidParameters)?;
        self.handler.call(input).await
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("tool", &self.tool)
            .field("handler", &"<handler>")
            .finish()
    }
}

/// Tools available to the agent, keyed by name.
///
/// Built once before the agent starts and only read afterwards, so it can be
/// shared across concurrent tool calls behind an `Arc`.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with a hand-authored schema
    pub fn register<H>(&mut self, tool: Tool, handler: H) -> Result<(), StartupError>
    where
        H: ToolHandler + 'static,
    {
        if self.index.contains_key(&tool.name) {
            return Err(StartupError::DuplicateTool(tool.name));
        }
        if tool.input_schema.get("type") != Some(&Value::String("object".to_string())) {
            return Err(StartupError::Schema {
                type_name: tool.name,
                reason: "tool input must be an object schema".to_string(),
            });
        }

        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            tool,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Register a tool whose schema is derived from its input type
    pub fn register_typed<I, F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<(), StartupError>
    where
        I: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        let schema = generate_schema::<I>()?;
        self.register(
            Tool::new(name, description, schema),
            TypedHandler::new(handler),
        )
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Declarations for every tool, in registration order
    pub fn declarations(&self) -> Vec<Tool> {
        self.tools.iter().map(|entry| entry.tool.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a single tool call. Every failure is folded into an error result.
    pub async fn call(&self, call: &ToolCall) -> ToolResult {
        info!(tool = %call.name, id = %call.id, "dispatching tool call");
        let outcome = match self.lookup(&call.name) {
            Some(entry) => entry.execute(call.input.clone()).await,
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };
        if let Err(e) = &outcome {
            warn!(tool = %call.name, id = %call.id, error = %e, "tool call failed");
        }
        ToolResult::from_outcome(call.id.clone(), outcome)
    }
}
