use tracing::debug;

use crate::errors::{RunError, RunResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Response};

/// Output bound applied to every inference request
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Builds inference requests from a history snapshot and sends them through a provider.
///
/// Every call carries the complete history and the complete tool list. Transport
/// failures are returned as they are; nothing here retries.
pub struct InferenceInvoker {
    provider: Box<dyn Provider>,
    max_tokens: u32,
}

impl InferenceInvoker {
    pub fn new(provider: Box<dyn Provider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub async fn invoke(&self, history: &[Message], tools: &[Tool]) -> RunResult<Response> {
        if let Some(last) = history.last() {
            if last.role == Role::Assistant && last.has_tool_calls() {
                return Err(RunError::Protocol(
                    "history ends with tool calls that have no results".to_string(),
                ));
            }
        }

        debug!(
            messages = history.len(),
            tools = tools.len(),
            max_tokens = self.max_tokens,
            "invoking inference"
        );
        let response = self
            .provider
            .complete(history, tools, self.max_tokens)
            .await
            .map_err(RunError::Transport)?;

        if response.message.role != Role::Assistant {
            return Err(RunError::Protocol(
                "inference returned a message not authored by the assistant".to_string(),
            ));
        }

        debug!(
            stop_reason = ?response.stop_reason,
            blocks = response.message.content.len(),
            input_tokens = ?response.usage.input_tokens,
            output_tokens = ?response.usage.output_tokens,
            "inference complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::StopReason;
    use crate::providers::mock::{MockProvider, MockReply};
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_sends_full_snapshot_and_bound() {
        let provider = MockProvider::new(vec![Message::assistant().with_text("hi")]);
        let invoker = InferenceInvoker::new(Box::new(provider.clone()), 256);
        let tools = vec![Tool::new("read_file", "Read a file", json!({"type": "object"}))];
        let history = vec![Message::user().with_text("hello")];

        let response = invoker.invoke(&history, &tools).await.unwrap();
        assert_eq!(response.stop_reason, StopReason::EndTurn);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages, history);
        assert_eq!(requests[0].tools, tools);
        assert_eq!(requests[0].max_tokens, 256);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let provider = MockProvider::with_replies(vec![
            MockReply::Fail("connection reset".to_string()),
            MockReply::from(Message::assistant().with_text("unreachable")),
        ]);
        let invoker = InferenceInvoker::new(Box::new(provider.clone()), DEFAULT_MAX_TOKENS);

        let err = invoker
            .invoke(&[Message::user().with_text("hello")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Transport(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unanswered_tool_calls_are_not_sent() {
        let provider = MockProvider::new(vec![]);
        let invoker = InferenceInvoker::new(Box::new(provider.clone()), DEFAULT_MAX_TOKENS);
        let history = vec![
            Message::user().with_text("hello"),
            Message::assistant().with_tool_call("a", "read_file", json!({})),
        ];

        let err = invoker.invoke(&history, &[]).await.unwrap_err();
        assert!(matches!(err, RunError::Protocol(_)));
        assert!(provider.requests().is_empty());
    }
}
