//! Provider chunk decoding and normalization.
//!
//! Every streamed chunk is decoded exactly once into [`RawChunk`], one variant
//! per known wire shape. [`RawChunk::to_delta`] then maps the variant to a
//! [`NormalizedDelta`] without looking at the JSON again.

use serde_json::Value;

use crate::cons::provider_cons::LLMProvider;
use crate::error::ReviewError;

/// Text contributed by one chunk plus whether the stream must end here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedDelta {
    pub text: String,
    pub stop: bool,
}

impl NormalizedDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stop: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stop() -> Self {
        Self {
            text: String::new(),
            stop: true,
        }
    }
}

/// Anthropic streaming event, keyed by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeEvent {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta { text: Option<String> },
    MessageDelta { stop_reason: Option<String> },
    /// `ping`, `content_block_stop`, `message_stop` and anything newer.
    Other { kind: String },
}

/// The shapes a Claude chunk has been observed to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeChunk {
    /// Event-typed messages API.
    Event(ClaudeEvent),
    /// No discriminant, nested `delta.text`.
    Fallback { text: Option<String> },
    /// Plain top-level `text`.
    Legacy { text: String },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawChunk {
    OpenAi { content: Option<String> },
    Claude(ClaudeChunk),
    Generic { content: String },
}

fn string_at(v: &Value, pointer: &str) -> Option<String> {
    v.pointer(pointer).and_then(|t| t.as_str()).map(str::to_string)
}

impl ClaudeEvent {
    fn from_value(kind: &str, v: &Value) -> Self {
        match kind {
            "message_start" => ClaudeEvent::MessageStart,
            "content_block_start" => ClaudeEvent::ContentBlockStart,
            "content_block_delta" => ClaudeEvent::ContentBlockDelta {
                text: string_at(v, "/delta/text"),
            },
            "message_delta" => ClaudeEvent::MessageDelta {
                stop_reason: string_at(v, "/delta/stop_reason"),
            },
            other => ClaudeEvent::Other {
                kind: other.to_string(),
            },
        }
    }
}

impl ClaudeChunk {
    pub fn from_value(v: &Value) -> Self {
        if let Some(kind) = v.get("type") {
            let kind = kind.as_str().unwrap_or_default();
            return ClaudeChunk::Event(ClaudeEvent::from_value(kind, v));
        }
        if v.pointer("/delta/text").is_some() {
            return ClaudeChunk::Fallback {
                text: string_at(v, "/delta/text"),
            };
        }
        match v.get("text").and_then(|t| t.as_str()) {
            Some(text) => ClaudeChunk::Legacy {
                text: text.to_string(),
            },
            None => ClaudeChunk::Unknown,
        }
    }
}

impl RawChunk {
    /// Decodes a provider-native chunk. Only the generic provider can fail:
    /// its `message.content` path is part of the contract.
    pub fn decode(provider: LLMProvider, v: &Value) -> Result<Self, ReviewError> {
        match provider {
            LLMProvider::OpenAI => Ok(RawChunk::OpenAi {
                content: string_at(v, "/choices/0/delta/content"),
            }),
            LLMProvider::Claude => Ok(RawChunk::Claude(ClaudeChunk::from_value(v))),
            LLMProvider::Generic => {
                let content = string_at(v, "/message/content").ok_or(
                    ReviewError::MalformedChunk {
                        provider,
                        path: "message.content",
                    },
                )?;
                Ok(RawChunk::Generic { content })
            }
        }
    }

    pub fn to_delta(&self) -> NormalizedDelta {
        match self {
            RawChunk::OpenAi { content } => {
                NormalizedDelta::text(content.clone().unwrap_or_default())
            }
            RawChunk::Generic { content } => NormalizedDelta::text(content.clone()),
            RawChunk::Claude(chunk) => match chunk {
                ClaudeChunk::Legacy { text } => NormalizedDelta::text(text.clone()),
                ClaudeChunk::Fallback { text } => {
                    NormalizedDelta::text(text.clone().unwrap_or_default())
                }
                ClaudeChunk::Unknown => NormalizedDelta::empty(),
                ClaudeChunk::Event(event) => match event {
                    ClaudeEvent::MessageStart | ClaudeEvent::ContentBlockStart => {
                        NormalizedDelta::empty()
                    }
                    ClaudeEvent::ContentBlockDelta { text } => {
                        NormalizedDelta::text(text.clone().unwrap_or_default())
                    }
                    ClaudeEvent::MessageDelta { stop_reason } => {
                        if stop_reason.as_deref().is_some_and(|r| !r.is_empty()) {
                            NormalizedDelta::stop()
                        } else {
                            NormalizedDelta::empty()
                        }
                    }
                    ClaudeEvent::Other { .. } => NormalizedDelta::empty(),
                },
            },
        }
    }
}

/// Extracts the incremental text and stop signal from one chunk.
pub fn normalize(provider: LLMProvider, chunk: &Value) -> Result<NormalizedDelta, ReviewError> {
    Ok(RawChunk::decode(provider, chunk)?.to_delta())
}
