use serde::{Deserialize, Serialize};

/// Provider family. Selects how streamed chunks are normalized and which
/// wire client is built for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Claude,
    /// Any other backend. Speaks the Ollama chat protocol.
    Generic,
}

impl LLMProvider {
    /// Returns the identifier used in configuration (e.g., "openai", "claude")
    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "openai",
            LLMProvider::Claude => "claude",
            LLMProvider::Generic => "generic",
        }
    }

    /// Helper to parse from a string (handles aliases)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(LLMProvider::OpenAI),
            "claude" | "anthropic" => Some(LLMProvider::Claude),
            "generic" | "other" | "ollama" => Some(LLMProvider::Generic),
            _ => None,
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provider_name())
    }
}
