use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::pin::Pin;
use tokio_stream::Stream;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{
    build_http_client, timed_byte_stream, ChunkStream, ClientOptions, Message, ProviderClient,
};

pub(crate) fn extract_sse_frame_from_buffer(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let mut delimiter_len = 0usize;
    let delimiter_pos = if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
        delimiter_len = 4;
        Some(pos)
    } else {
        buffer.windows(2).position(|w| w == b"\n\n").map(|pos| {
            delimiter_len = 2;
            pos
        })
    }?;

    let frame = buffer.drain(..delimiter_pos).collect::<Vec<u8>>();
    buffer.drain(..delimiter_len);
    Some(frame)
}

pub(crate) fn sse_data_from_frame(frame: &str) -> Option<String> {
    let mut data_parts: Vec<&str> = Vec::new();

    for raw_line in frame.lines() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            data_parts.push(rest);
        }
    }

    if data_parts.is_empty() {
        return None;
    }
    Some(data_parts.join("\n"))
}

/// Splits a byte stream into SSE `data` payloads.
pub(crate) fn sse_data_stream<T>(
    stream: Pin<Box<dyn Stream<Item = Result<T>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>>
where
    T: AsRef<[u8]> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = stream;
        while let Some(chunk_result) = tokio_stream::StreamExt::next(&mut stream).await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            buffer.extend_from_slice(bytes.as_ref());

            while let Some(frame_bytes) = extract_sse_frame_from_buffer(&mut buffer) {
                let frame = String::from_utf8_lossy(&frame_bytes);
                if let Some(data) = sse_data_from_frame(&frame) {
                    yield Ok(data);
                }
            }
        }

        if !buffer.is_empty() {
            let frame = String::from_utf8_lossy(&buffer);
            if let Some(data) = sse_data_from_frame(&frame) {
                yield Ok(data);
            }
        }
    })
}

/// SSE `data` payloads as produced by [`sse_data_stream`].
pub(crate) type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Raw chat-completion chunks up to, not including, the `[DONE]` sentinel.
/// A payload that is not JSON ends the stream with an error.
pub(crate) fn openai_chunk_stream(frames: FrameStream) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut frames = frames;
        while let Some(frame) = tokio_stream::StreamExt::next(&mut frames).await {
            let data = match frame {
                Ok(data) => data,
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };
            if data.trim() == "[DONE]" {
                break;
            }
            match serde_json::from_str::<Value>(&data) {
                Ok(json) => yield Ok(json),
                Err(e) => {
                    yield Err(anyhow::Error::new(e).context("Failed to parse JSON from SSE data"));
                    break;
                }
            }
        }
    })
}

/// Pulls the assistant text out of a non-streaming chat completion.
pub(crate) fn completion_text(json: &Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .context("chat completion has no choices[0].message.content")
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    options: ClientOptions,
}

impl OpenAiClient {
    pub fn new(api_base: String, api_key: String, model: String) -> Self {
        Self {
            api_base,
            api_key,
            model,
            options: ClientOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Posts a chat completion, trying each candidate endpoint until one
    /// exists. Non-success statuses other than 404 are returned as errors.
    async fn post(&self, messages: Vec<Message>, stream: bool) -> Result<reqwest::Response> {
        let body = build_chat_completions_request_body(
            &self.model,
            messages,
            stream,
            self.options.max_tokens,
        );
        let http_client = build_http_client(&self.options, stream)?;

        let mut last_err: Option<anyhow::Error> = None;
        for url in chat_completions_url_candidates(&self.api_base) {
            let sent = http_client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;
            let response = match sent {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(anyhow::Error::new(e).context(format!("Failed to reach {}", url)));
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                log::debug!("No chat completions endpoint at {}", url);
                last_err = Some(anyhow::anyhow!("chat completions endpoint not found: {}", url));
                continue;
            }
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                log::error!("OpenAI API error ({}) from {}: {}", status, url, error_text);
                anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
            }
            log::debug!("{} -> {} (stream={})", url, status, stream);
            return Ok(response);
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no chat completions endpoint for {}", self.api_base)))
    }

    pub async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream> {
        let response = self.post(messages, true).await?;
        let frames = sse_data_stream(timed_byte_stream(response, self.options.chunk_timeout));

        Ok(openai_chunk_stream(frames))
    }

    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let response = self.post(messages, false).await?;
        let json: Value = response
            .json()
            .await
            .context("Failed to parse response JSON")?;
        completion_text(&json)
    }
}

impl ProviderClient for OpenAiClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream> {
        self.stream_chat(messages).await
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        self.chat(messages).await
    }
}

pub(crate) fn build_chat_completions_request_body(
    model: &str,
    messages: Vec<Message>,
    stream: bool,
    max_tokens: u32,
) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "stream": stream,
        "max_tokens": max_tokens,
    })
}

/// `{base}/chat/completions`, then `{base}/v1/chat/completions` for bases
/// configured without the version segment.
pub(crate) fn chat_completions_url_candidates(api_base: &str) -> Vec<String> {
    let base = api_base.trim_end_matches('/');
    let mut urls = vec![format!("{}/chat/completions", base)];
    if !base.ends_with("/v1") {
        urls.push(format!("{}/v1/chat/completions", base));
    }
    urls
}
