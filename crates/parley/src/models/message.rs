use chrono::Utc;
use serde_json::Value;

use super::content::{TextContent, ToolCall, ToolResult};
use super::role::Role;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// Content passed inside a message. Every consumer matches on this exhaustively,
/// so adding a kind of block surfaces at each site that handles one.
pub enum MessageContent {
    Text(TextContent),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn tool_call<I: Into<String>, N: Into<String>>(id: I, name: N, input: Value) -> Self {
        MessageContent::ToolCall(ToolCall::new(id, name, input))
    }

    pub fn tool_result(result: ToolResult) -> Self {
        MessageContent::ToolResult(result)
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        if let MessageContent::ToolCall(ref tool_call) = self {
            Some(tool_call)
        } else {
            None
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        if let MessageContent::ToolResult(ref tool_result) = self {
            Some(tool_result)
        } else {
            None
        }
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Message {
            role: Role::User,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a tool call to the message
    pub fn with_tool_call<I: Into<String>, N: Into<String>>(
        self,
        id: I,
        name: N,
        input: Value,
    ) -> Self {
        self.with_content(MessageContent::tool_call(id, name, input))
    }

    /// Add a tool result to the message
    pub fn with_tool_result(self, result: ToolResult) -> Self {
        self.with_content(MessageContent::tool_result(result))
    }

    /// Tool calls in the order the model emitted them
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.content
            .iter()
            .filter_map(MessageContent::as_tool_call)
            .collect()
    }

    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.content
            .iter()
            .filter_map(MessageContent::as_tool_result)
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|content| content.as_tool_call().is_some())
    }

    /// All text blocks joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(MessageContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
