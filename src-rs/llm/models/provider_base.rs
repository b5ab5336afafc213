use anyhow::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;

use crate::cons::provider_cons::LLMProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-native chunks, one JSON value per event.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Transport settings shared by every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    /// Applies to non-streaming calls only; reqwest's timeout would cut long streams.
    pub request_timeout: Duration,
    /// Longest wait for the next streamed chunk.
    pub chunk_timeout: Duration,
    pub max_tokens: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            chunk_timeout: Duration::from_secs(60),
            max_tokens: 4096,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> LLMProvider;

    fn model_name(&self) -> &str;

    async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream>;

    /// Single round trip; returns the complete response text.
    async fn chat(&self, messages: Vec<Message>) -> Result<String>;
}

pub(crate) fn build_http_client(options: &ClientOptions, streaming: bool) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(options.connect_timeout)
        .tcp_keepalive(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90));
    if !streaming {
        builder = builder.timeout(options.request_timeout);
    }
    Ok(builder.build()?)
}

/// Wraps a response body so that a stalled connection surfaces as an error
/// instead of hanging the reader forever.
pub(crate) fn timed_byte_stream(
    response: reqwest::Response,
    chunk_timeout: Duration,
) -> Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>> {
    let stream = response.bytes_stream();
    Box::pin(async_stream::stream! {
        let mut byte_stream = stream;
        let mut chunk_num = 0u64;

        loop {
            match tokio::time::timeout(chunk_timeout, tokio_stream::StreamExt::next(&mut byte_stream)).await {
                Ok(Some(Ok(bytes))) => {
                    chunk_num += 1;
                    log::trace!("Received chunk #{}: {} bytes", chunk_num, bytes.len());
                    yield Ok(bytes);
                }
                Ok(Some(Err(e))) => {
                    log::error!("Stream read error on chunk #{}: {}", chunk_num + 1, e);
                    yield Err(anyhow::anyhow!("Stream read error: {}", e));
                    break;
                }
                Ok(None) => {
                    log::debug!("Stream ended normally after {} chunks", chunk_num);
                    break;
                }
                Err(_) => {
                    log::error!(
                        "Stream chunk read timeout after {} seconds while waiting for chunk #{}",
                        chunk_timeout.as_secs(),
                        chunk_num + 1
                    );
                    yield Err(anyhow::anyhow!(
                        "Stream chunk read timeout after {} seconds. The API may be unresponsive or the connection was lost.",
                        chunk_timeout.as_secs()
                    ));
                    break;
                }
            }
        }
    })
}
