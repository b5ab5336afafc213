use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::openai::{sse_data_stream, FrameStream};
use crate::llm::models::provider_base::{
    build_http_client, timed_byte_stream, ChunkStream, ClientOptions, Message, ProviderClient,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Unwraps proxies that nest the real event under `data`, either as an
/// object or as a JSON string.
pub(crate) fn unwrap_event_data(v: &Value) -> Option<Value> {
    if v.get("type").is_some() || v.get("delta").is_some() || v.get("text").is_some() {
        return Some(v.clone());
    }
    if let Some(s) = v.get("data").and_then(|d| d.as_str()) {
        if let Ok(inner) = serde_json::from_str::<Value>(s) {
            return Some(inner);
        }
    }
    if let Some(obj) = v.get("data").and_then(|d| d.as_object()) {
        return Some(Value::Object(obj.clone()));
    }
    None
}

/// Splits `messages` into the system prompt and the alternating
/// user/assistant turns the messages API expects. Consecutive turns of the
/// same role are merged.
pub(crate) fn to_anthropic_messages(messages: Vec<Message>) -> (Option<String>, Vec<Value>) {
    let mut system_prompt: Option<String> = None;
    let mut turns: Vec<(String, String)> = Vec::new();

    for msg in messages {
        if msg.role == "system" {
            system_prompt = Some(match system_prompt {
                Some(existing) => format!("{}\n{}", existing, msg.content),
                None => msg.content,
            });
            continue;
        }
        match turns.last_mut() {
            Some((role, content)) if *role == msg.role => {
                content.push_str("\n\n");
                content.push_str(&msg.content);
            }
            _ => turns.push((msg.role, msg.content)),
        }
    }

    let turns = turns
        .into_iter()
        .map(|(role, content)| json!({ "role": role, "content": content }))
        .collect();
    (system_prompt, turns)
}

/// Joins every text block of a non-streaming messages response.
pub(crate) fn message_response_text(json: &Value) -> Result<String> {
    let blocks = json
        .get("content")
        .and_then(|c| c.as_array())
        .context("Claude response has no content array")?;

    Ok(blocks
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()).unwrap_or("text") == "text")
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}

/// Anthropic events as JSON. An `error` event ends the stream with an error,
/// `message_stop` is passed on and then ends it. Payloads that are not JSON
/// are skipped.
pub(crate) fn claude_event_stream(frames: FrameStream) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut frames = frames;
        let mut chunk_count = 0u64;
        let mut parse_errors = 0u64;
        while let Some(data_result) = tokio_stream::StreamExt::next(&mut frames).await {
            let data = match data_result {
                Ok(data) => data,
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };
            let data_trimmed = data.trim();
            chunk_count += 1;
            if data_trimmed == "[DONE]" {
                break;
            }

            let parsed: Value = match serde_json::from_str(data_trimmed) {
                Ok(v) => v,
                Err(_) => {
                    parse_errors += 1;
                    if parse_errors == 1 {
                        log::debug!("Claude SSE JSON parse failed (len={})", data_trimmed.len());
                    }
                    continue;
                }
            };
            let parsed = unwrap_event_data(&parsed).unwrap_or(parsed);

            let event_type = parsed.get("type").and_then(|t| t.as_str()).map(str::to_string);
            match event_type.as_deref() {
                Some("error") => {
                    let msg = parsed
                        .pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .unwrap_or("Unknown API error");
                    let error_type = parsed
                        .pointer("/error/type")
                        .and_then(|t| t.as_str())
                        .unwrap_or("error");
                    log::warn!("Claude API error: type={}, message={}", error_type, msg);
                    yield Err(anyhow::anyhow!("Anthropic stream error ({}): {}", error_type, msg));
                    break;
                }
                Some("message_stop") => {
                    yield Ok(parsed);
                    break;
                }
                _ => yield Ok(parsed),
            }
        }

        log::debug!(
            "Claude stream ended: chunks={}, parse_errors={}",
            chunk_count, parse_errors
        );
    })
}

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    options: ClientOptions,
}

impl ClaudeClient {
    pub fn new(base_url: String, api_key: String, model_name: String) -> Self {
        Self {
            base_url,
            api_key,
            model_name,
            options: ClientOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, messages: Vec<Message>, stream: bool) -> Value {
        let (system_prompt, anthropic_messages) = to_anthropic_messages(messages);
        let mut request_body = json!({
            "model": self.model_name,
            "messages": anthropic_messages,
            "stream": stream,
            "max_tokens": self.options.max_tokens
        });
        if let Some(sys) = system_prompt {
            request_body["system"] = json!(sys);
        }
        request_body
    }
}

impl ProviderClient for ClaudeClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Claude
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream> {
        let request_body = self.request_body(messages, true);
        let client = build_http_client(&self.options, true).context("Failed to build HTTP client")?;

        let response = client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("accept", "text/event-stream")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to Anthropic API (possible timeout or network error)")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("StreamChat, Claude API error ({}): {}", status, error_text);
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        let frames = sse_data_stream(timed_byte_stream(response, self.options.chunk_timeout));
        Ok(claude_event_stream(frames))
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let request_body = self.request_body(messages, false);
        let client = build_http_client(&self.options, false).context("Failed to build HTTP client")?;

        let response = client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to Anthropic API (possible timeout or network error)")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error ({}): {}", status, error_text);
        }

        let json: Value = response.json().await?;
        message_response_text(&json)
    }
}
