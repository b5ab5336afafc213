use crate::cons::provider_cons::LLMProvider;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_accepts_aliases() {
        assert_eq!(LLMProvider::from_name("OpenAI"), Some(LLMProvider::OpenAI));
        assert_eq!(LLMProvider::from_name("anthropic"), Some(LLMProvider::Claude));
        assert_eq!(LLMProvider::from_name(" ollama "), Some(LLMProvider::Generic));
        assert_eq!(LLMProvider::from_name("other"), Some(LLMProvider::Generic));
        assert_eq!(LLMProvider::from_name("gemini"), None);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LLMProvider::Claude).expect("serialize");
        assert_eq!(json, "\"claude\"");
        let parsed: LLMProvider = serde_json::from_str("\"generic\"").expect("parse");
        assert_eq!(parsed, LLMProvider::Generic);
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
    }
}
