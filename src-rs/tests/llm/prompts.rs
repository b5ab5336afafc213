use crate::config::PromptTemplate;
use crate::error::ReviewError;
use crate::llm::prompts::prepare_prompts;

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Vec<PromptTemplate> {
        vec![PromptTemplate {
            name: "Code Review".to_string(),
            system: "You review code.".to_string(),
        }]
    }

    #[test]
    fn prepare_prompts_builds_system_and_user_turns() {
        let messages = prepare_prompts("", "Code Review", "+fn a() {}\n", &templates())
            .expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "You review code.");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "```diff\n+fn a() {}\n```");
    }

    #[test]
    fn prepare_prompts_prepends_custom_instructions() {
        let messages = prepare_prompts("  focus on errors ", "Code Review", "+x", &templates())
            .expect("messages");
        assert_eq!(
            messages[1].content,
            "Additional instructions:\nfocus on errors\n\n```diff\n+x\n```"
        );
    }

    #[test]
    fn prepare_prompts_rejects_unknown_template() {
        let err = prepare_prompts("", "Nope", "+x", &templates()).expect_err("should fail");
        assert!(matches!(err, ReviewError::UnknownTemplate(name) if name == "Nope"));
    }
}
