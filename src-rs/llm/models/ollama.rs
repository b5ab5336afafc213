use anyhow::{Context, Result};
use bytes::Bytes;
use serde_json::{json, Value};
use std::pin::Pin;
use tokio_stream::Stream;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{
    build_http_client, timed_byte_stream, ChunkStream, ClientOptions, Message, ProviderClient,
};

/// Takes one complete line off the front of `buffer`, without its terminator.
pub(crate) fn extract_line_from_buffer(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

/// Turns newline-delimited JSON into one value per line. Blank lines are
/// skipped; a trailing line without a newline is still parsed.
fn ndjson_stream(stream: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = stream;
        let mut finished = false;

        while let Some(chunk_result) = tokio_stream::StreamExt::next(&mut stream).await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);

            while let Some(line) = extract_line_from_buffer(&mut buffer) {
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_ndjson_line(line) {
                    Ok((value, done)) => {
                        yield Ok(value);
                        if done {
                            finished = true;
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            if finished {
                break;
            }
        }

        if !finished {
            let rest = String::from_utf8_lossy(&buffer);
            let rest = rest.trim();
            if !rest.is_empty() {
                match parse_ndjson_line(rest) {
                    Ok((value, _)) => yield Ok(value),
                    Err(e) => yield Err(e),
                }
            }
        }
    })
}

/// Parses one NDJSON line. Returns the value and whether it is the final one.
pub(crate) fn parse_ndjson_line(line: &str) -> Result<(Value, bool)> {
    let value: Value = serde_json::from_str(line).context("Failed to parse JSON line from stream")?;
    if let Some(err) = value.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("Generic provider stream error: {}", err);
    }
    let done = value.get("done").and_then(|d| d.as_bool()).unwrap_or(false);
    Ok((value, done))
}

/// Client for backends speaking the Ollama chat protocol.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    options: ClientOptions,
}

impl OllamaClient {
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

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, messages: Vec<Message>, stream: bool) -> Result<reqwest::Response> {
        let request_body = json!({
            "model": self.model_name,
            "messages": messages,
            "stream": stream,
        });
        let client = build_http_client(&self.options, stream).context("Failed to build HTTP client")?;

        let mut request = client
            .post(self.chat_url())
            .header("content-type", "application/json")
            .json(&request_body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.chat_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Generic provider API error ({}): {}", status, error_text);
            anyhow::bail!("LLM API error ({}): {}", status, error_text);
        }
        Ok(response)
    }
}

impl ProviderClient for OllamaClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Generic
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream> {
        let response = self.send(messages, true).await?;
        let stream = timed_byte_stream(response, self.options.chunk_timeout);
        Ok(ndjson_stream(stream))
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let response = self.send(messages, false).await?;
        let json: Value = response
            .json()
            .await
            .context("Failed to parse response JSON")?;
        json.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .context("chat response has no message.content")
    }
}
