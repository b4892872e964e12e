use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AgentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// A request from the model to run one of the registered tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier chosen by the model, echoed back in the matching result
    pub id: String,
    pub name: String,
    /// Raw structured input, validated against the tool's schema before execution
    pub input: Value,
}

impl ToolCall {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// The outcome of a tool call, fed back to the model in the next turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success<I: Into<String>, O: Into<String>>(tool_call_id: I, output: O) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error<I: Into<String>, O: Into<String>>(tool_call_id: I, output: O) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
            is_error: true,
        }
    }

    /// Fold a tool outcome into a result block. Errors become `is_error` results
    /// carrying the text the model should see.
    pub fn from_outcome<I: Into<String>>(tool_call_id: I, outcome: AgentResult<String>) -> Self {
        match outcome {
            Ok(output) => Self::success(tool_call_id, output),
            Err(e) => Self::error(tool_call_id, e.tool_output()),
        }
    }
}
