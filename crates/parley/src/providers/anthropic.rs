use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::base::{Provider, Response, StopReason, Usage};
use super::configs::{AnthropicProviderConfig, ANTHROPIC_VERSION};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = &data["usage"];
        let input_tokens = usage["input_tokens"].as_i64().map(|v| v as i32);
        let output_tokens = usage["output_tokens"].as_i64().map(|v| v as i32);
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        };
        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    /// Messages left with no blocks (an empty reply, or only empty text) are
    /// dropped: the API rejects empty content anywhere but the final turn.
    fn messages_to_anthropic_format(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter_map(|message| {
                let content: Vec<Value> = message
                    .content
                    .iter()
                    .filter_map(|content| match content {
                        MessageContent::Text(text) if text.text.is_empty() => None,
                        MessageContent::Text(text) => Some(json!({
                            "type": "text",
                            "text": text.text,
                        })),
                        MessageContent::ToolCall(call) => Some(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.input,
                        })),
                        MessageContent::ToolResult(result) => Some(json!({
                            "type": "tool_result",
                            "tool_use_id": result.tool_call_id,
                            "content": result.output,
                            "is_error": result.is_error,
                        })),
                    })
                    .collect();

                if content.is_empty() {
                    debug!(role = message.role.as_str(), "skipping message with no content");
                    return None;
                }
                Some(json!({
                    "role": message.role.as_str(),
                    "content": content,
                }))
            })
            .collect()
    }

    fn tools_to_anthropic_format(tools: &[Tool]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.input_schema,
                })
            })
            .collect()
    }

    fn response_to_message(response: &Value) -> Result<Message> {
        let blocks = response
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| anyhow!("Invalid response format from Anthropic API"))?;

        let mut message = Message::assistant();
        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    let text = block["text"].as_str().unwrap_or_default();
                    message = message.with_text(text);
                }
                Some("tool_use") => {
                    let id = block["id"]
                        .as_str()
                        .ok_or_else(|| anyhow!("tool_use block without an id"))?;
                    let name = block["name"]
                        .as_str()
                        .ok_or_else(|| anyhow!("tool_use block without a name"))?;
                    let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                    message = message.with_tool_call(id, name, input);
                }
                other => {
                    warn!(block_type = ?other, "skipping unsupported content block");
                }
            }
        }
        Ok(message)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let error_text = response.text().await?;
                Err(anyhow!("Request failed: {} - {}", status, error_text))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        max_tokens: u32,
    ) -> Result<Response> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": Self::messages_to_anthropic_format(messages),
            "max_tokens": max_tokens,
        });

        if let Some(body) = payload.as_object_mut() {
            if !tools.is_empty() {
                body.insert(
                    "tools".to_string(),
                    json!(Self::tools_to_anthropic_format(tools)),
                );
            }
            if let Some(temp) = self.config.temperature {
                body.insert("temperature".to_string(), json!(temp));
            }
            if let Some(system) = &self.config.system {
                body.insert("system".to_string(), json!(system));
            }
        }

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending anthropic request"
        );
        let response = self.post(payload).await?;

        let message = Self::response_to_message(&response)?;
        let stop_reason = StopReason::parse(response["stop_reason"].as_str().unwrap_or_default());
        let usage = Self::get_usage(&response);

        Ok(Response {
            message,
            stop_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::ToolResult;
    use crate::models::message::MessageContent;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(host: String) -> AnthropicProviderConfig {
        AnthropicProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
            model: "claude-3-7-sonnet-latest".to_string(),
            temperature: Some(0.7),
            system: None,
        }
    }

    async fn setup_mock_server(response_body: Value) -> (MockServer, AnthropicProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test_api_key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(test_config(mock_server.uri())).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": "Hello! How can I assist you today?"
            }],
            "model": "claude-3-7-sonnet-latest",
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {
                "input_tokens": 12,
                "output_tokens": 15
            }
        });

        let (_, provider) = setup_mock_server(response_body).await;

        let messages = vec![Message::user().with_text("Hello?")];
        let response = provider.complete(&messages, &[], 1024).await?;

        if let MessageContent::Text(text) = &response.message.content[0] {
            assert_eq!(text.text, "Hello! How can I assist you today?");
        } else {
            panic!("Expected Text content");
        }
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage, Usage::new(Some(12), Some(15), Some(27)));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_use() -> Result<()> {
        let response_body = json!({
            "id": "msg_456",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "Let me read that file." },
                { "type": "thinking", "thinking": "..." },
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "read_file",
                    "input": { "path": "file.txt" }
                }
            ],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 30, "output_tokens": 20 }
        });

        let (_, provider) = setup_mock_server(response_body).await;
        let tools = vec![Tool::new(
            "read_file",
            "Read a file",
            json!({"type": "object", "properties": {"path": {"type": "string"}}}),
        )];
        let response = provider
            .complete(&[Message::user().with_text("what's in file.txt?")], &tools, 1024)
            .await?;

        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.message.content.len(), 2);
        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_01");
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(calls[0].input, json!({"path": "file.txt"}));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_carries_history_tools_and_limits() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({
                "model": "claude-3-7-sonnet-latest",
                "max_tokens": 512,
                "tools": [{ "name": "read_file", "description": "Read a file" }],
                "messages": [
                    { "role": "user", "content": [{ "type": "text", "text": "what's in file.txt?" }] },
                    { "role": "assistant", "content": [{
                        "type": "tool_use", "id": "a", "name": "read_file", "input": { "path": "file.txt" }
                    }] },
                    { "role": "user", "content": [{
                        "type": "tool_result", "tool_use_id": "a", "content": "hello", "is_error": false
                    }] }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "It says hello." }],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(test_config(mock_server.uri()))?;
        let history = vec![
            Message::user().with_text("what's in file.txt?"),
            Message::assistant().with_tool_call("a", "read_file", json!({"path": "file.txt"})),
            Message::user().with_tool_result(ToolResult::success("a", "hello")),
        ];
        let tools = vec![Tool::new(
            "read_file",
            "Read a file",
            json!({"type": "object", "properties": {"path": {"type": "string"}}}),
        )];

        let response = provider.complete(&history, &tools, 512).await?;
        assert_eq!(response.message.text(), "It says hello.");
        assert_eq!(response.usage, Usage::default());
        Ok(())
    }

    #[test]
    fn test_messages_without_blocks_are_not_sent() {
        let messages = vec![
            Message::user().with_text("hi"),
            Message::assistant(),
            Message::user().with_text("again"),
            Message::assistant().with_text(""),
            Message::user().with_text("still there?"),
        ];

        let formatted = AnthropicProvider::messages_to_anthropic_format(&messages);
        assert_eq!(
            formatted,
            vec![
                json!({"role": "user", "content": [{"type": "text", "text": "hi"}]}),
                json!({"role": "user", "content": [{"type": "text", "text": "again"}]}),
                json!({"role": "user", "content": [{"type": "text", "text": "still there?"}]}),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad tool_result ordering"))
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(test_config(mock_server.uri())).unwrap();
        let err = provider
            .complete(&[Message::user().with_text("hi")], &[], 1024)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("bad tool_result ordering"));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529))
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(test_config(mock_server.uri())).unwrap();
        let err = provider
            .complete(&[Message::user().with_text("hi")], &[], 1024)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Server error"));
    }
}
