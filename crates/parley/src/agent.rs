use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::conversation::Conversation;
use crate::errors::{RunError, RunResult};
use crate::inference::InferenceInvoker;
use crate::interface::{Output, UserInput};
use crate::models::content::{ToolCall, ToolResult};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;
use crate::providers::base::{Provider, StopReason};
use crate::tools::ToolRegistry;

/// Where the turn loop is in the tool-calling protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    AwaitingUser,
    Inferring,
    DispatchingTools,
    Terminated,
}

/// Agent integrates a foundational LLM with the tools it can call.
///
/// The agent owns the conversation: it is the only writer, and it holds `&mut self`
/// for the whole of a run, so two inference calls for one history can never overlap.
pub struct Agent {
    invoker: InferenceInvoker,
    registry: Arc<ToolRegistry>,
    tools: Vec<Tool>,
    conversation: Conversation,
}

impl Agent {
    /// Create a new Agent with the specified provider and tools
    pub fn new(provider: Box<dyn Provider>, registry: ToolRegistry, max_tokens: u32) -> Self {
        let tools = registry.declarations();
        Self {
            invoker: InferenceInvoker::new(provider, max_tokens),
            registry: Arc::new(registry),
            tools,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Declarations sent with every inference request
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run the conversation until input runs out.
    ///
    /// Ends with an error on a transport failure or when `cancel` flips to true
    /// while the model or the tools are working.
    pub async fn run(
        &mut self,
        input: &mut dyn UserInput,
        output: &mut dyn Output,
        mut cancel: watch::Receiver<bool>,
    ) -> RunResult<()> {
        let mut state = AgentState::AwaitingUser;
        loop {
            debug!(?state, messages = self.conversation.len(), "turn loop");
            state = match state {
                AgentState::AwaitingUser => self.await_user(input, output)?,
                AgentState::Inferring => self.infer(output, &mut cancel).await?,
                AgentState::DispatchingTools => self.dispatch_tools(output, &mut cancel).await?,
                AgentState::Terminated => return Ok(()),
            };
        }
    }

    /// Send one user message and keep going until the model answers without
    /// calling any tools.
    pub async fn reply(
        &mut self,
        text: &str,
        output: &mut dyn Output,
        mut cancel: watch::Receiver<bool>,
    ) -> RunResult<()> {
        self.conversation.push(Message::user().with_text(text));
        let mut state = AgentState::Inferring;
        loop {
            state = match state {
                AgentState::Inferring => self.infer(output, &mut cancel).await?,
                AgentState::DispatchingTools => self.dispatch_tools(output, &mut cancel).await?,
                AgentState::AwaitingUser | AgentState::Terminated => return Ok(()),
            };
        }
    }

    fn await_user(
        &mut self,
        input: &mut dyn UserInput,
        output: &mut dyn Output,
    ) -> RunResult<AgentState> {
        output.prompt();
        match input.read_line().map_err(RunError::Input)? {
            None => Ok(AgentState::Terminated),
            Some(line) if line.trim().is_empty() => Ok(AgentState::AwaitingUser),
            Some(line) => {
                self.conversation.push(Message::user().with_text(line));
                Ok(AgentState::Inferring)
            }
        }
    }

    async fn infer(
        &mut self,
        output: &mut dyn Output,
        cancel: &mut watch::Receiver<bool>,
    ) -> RunResult<AgentState> {
        output.busy();
        let outcome = tokio::select! {
            biased;
            _ = cancelled(cancel) => Err(RunError::Cancelled),
            response = self.invoker.invoke(self.conversation.messages(), &self.tools) => response,
        };
        output.idle();
        let response = outcome?;

        let has_tool_calls = response.message.has_tool_calls();
        if has_tool_calls != (response.stop_reason == StopReason::ToolUse) {
            debug!(
                stop_reason = ?response.stop_reason,
                has_tool_calls,
                "stop reason disagrees with content, following content"
            );
        }

        for content in &response.message.content {
            match content {
                MessageContent::Text(text) => output.text(&text.text),
                MessageContent::ToolCall(call) => output.tool_call(call),
                MessageContent::ToolResult(result) => {
                    warn!(id = %result.tool_call_id, "assistant message carried a tool result");
                }
            }
        }
        self.conversation.push(response.message);

        if has_tool_calls {
            Ok(AgentState::DispatchingTools)
        } else {
            Ok(AgentState::AwaitingUser)
        }
    }

    /// Run every pending tool call concurrently and append their results, in call
    /// order, as a single message.
    async fn dispatch_tools(
        &mut self,
        output: &mut dyn Output,
        cancel: &mut watch::Receiver<bool>,
    ) -> RunResult<AgentState> {
        let calls: Vec<ToolCall> = self
            .conversation
            .pending_tool_calls()
            .into_iter()
            .cloned()
            .collect();

        // One task per call, so a panicking or slow tool cannot take its siblings down.
        let handles: Vec<JoinHandle<ToolResult>> = calls
            .iter()
            .map(|call| {
                let registry = Arc::clone(&self.registry);
                let call = call.clone();
                tokio::spawn(async move { registry.call(&call).await })
            })
            .collect();
        let aborts: Vec<_> = handles.iter().map(|handle| handle.abort_handle()).collect();

        output.busy();
        let joined = tokio::select! {
            biased;
            _ = cancelled(cancel) => None,
            outcomes = futures::future::join_all(handles) => Some(outcomes),
        };
        output.idle();

        let Some(outcomes) = joined else {
            for abort in aborts {
                abort.abort();
            }
            let message = calls.iter().fold(Message::user(), |message, call| {
                message.with_tool_result(ToolResult::error(call.id.clone(), "tool call cancelled"))
            });
            self.conversation.push(message);
            return Err(RunError::Cancelled);
        };

        let mut message = Message::user();
        for (call, outcome) in calls.iter().zip(outcomes) {
            let result = outcome.unwrap_or_else(|e| {
                warn!(tool = %call.name, id = %call.id, error = %e, "tool task did not complete");
                let reason = if e.is_panic() {
                    "tool panicked"
                } else {
                    "tool call cancelled"
                };
                ToolResult::error(call.id.clone(), reason)
            });
            output.tool_result(&result);
            message = message.with_tool_result(result);
        }
        self.conversation.push(message);

        Ok(AgentState::Inferring)
    }
}

/// Resolves once cancellation is requested. A dropped sender means nobody can
/// cancel any more, so this then never resolves.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
