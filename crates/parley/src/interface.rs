//! Seams between the turn loop and whatever is reading and printing for it.

use anyhow::Result;

use crate::models::content::{ToolCall, ToolResult};

/// Source of user lines
pub trait UserInput {
    /// The next line of user input. `None` means there is no more input and
    /// the conversation is over.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Sink for everything the agent shows the user.
///
/// Text blocks are delivered in the order the model emitted them. The other
/// hooks are cosmetic and do nothing unless overridden.
pub trait Output {
    fn text(&mut self, text: &str);

    /// Called before waiting for the next user line
    fn prompt(&mut self) {}

    fn tool_call(&mut self, _call: &ToolCall) {}

    fn tool_result(&mut self, _result: &ToolResult) {}

    /// The agent is waiting on the model or on tools
    fn busy(&mut self) {}

    fn idle(&mut self) {}
}
