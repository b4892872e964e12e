use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Response, StopReason, Usage};

/// What the mock does on its next call
pub enum MockReply {
    Respond(Response),
    Fail(String),
    /// Never completes, for exercising cancellation
    Hang,
}

impl From<Message> for MockReply {
    fn from(message: Message) -> Self {
        let stop_reason = if message.has_tool_calls() {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };
        MockReply::Respond(Response {
            message,
            stop_reason,
            usage: Usage::default(),
        })
    }
}

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub max_tokens: u32,
}

/// A mock provider that returns pre-configured responses for testing, and
/// records every request it receives.
#[derive(Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_replies(responses.into_iter().map(MockReply::from).collect())
    }

    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        max_tokens: u32,
    ) -> Result<Response> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            max_tokens,
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(anyhow!(message)),
            Some(MockReply::Hang) => std::future::pending().await,
            // Return empty response if no more pre-configured responses
            None => Ok(Response {
                message: Message::assistant().with_text(""),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
        }
    }
}
