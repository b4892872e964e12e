use crate::models::content::ToolCall;
use crate::models::message::Message;
use crate::models::role::Role;

/// The ordered history of a conversation.
///
/// Append-only: messages are never edited or removed once pushed, and the only
/// mutation path is [`Conversation::push`]. Everything else reads a slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool calls from the latest assistant message that have no result yet.
    ///
    /// Results always arrive together in the message right after the calls, so
    /// the calls are pending exactly when the assistant message is the last one.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        match self.messages.last() {
            Some(message) if message.role == Role::Assistant => message.tool_calls(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::ToolResult;
    use serde_json::json;

    #[test]
    fn test_push_preserves_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.push(Message::user().with_text("one"));
        conversation.push(Message::assistant().with_text("two"));

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].text(), "one");
        assert_eq!(conversation.last().unwrap().text(), "two");
    }

    #[test]
    fn test_pending_tool_calls_until_results_arrive() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user().with_text("what's in file.txt?"));
        assert!(conversation.pending_tool_calls().is_empty());

        conversation.push(Message::assistant().with_tool_call(
            "a",
            "read_file",
            json!({"path": "file.txt"}),
        ));
        let pending = conversation.pending_tool_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "a");

        conversation.push(Message::user().with_tool_result(ToolResult::success("a", "hello")));
        assert!(conversation.pending_tool_calls().is_empty());
    }
}
