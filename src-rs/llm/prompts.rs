use crate::config::PromptTemplate;
use crate::error::ReviewError;
use crate::llm::models::provider_base::Message;

/// Builds the message list for one analysis: the template's system prompt,
/// then a user turn holding the optional instructions and the code.
pub fn prepare_prompts(
    custom_instructions: &str,
    template_name: &str,
    patch: &str,
    templates: &[PromptTemplate],
) -> Result<Vec<Message>, ReviewError> {
    let template = templates
        .iter()
        .find(|t| t.name == template_name)
        .ok_or_else(|| ReviewError::UnknownTemplate(template_name.to_string()))?;

    let mut user = String::new();
    let instructions = custom_instructions.trim();
    if !instructions.is_empty() {
        user.push_str("Additional instructions:\n");
        user.push_str(instructions);
        user.push_str("\n\n");
    }
    user.push_str("```diff\n");
    user.push_str(patch);
    if !patch.ends_with('\n') {
        user.push('\n');
    }
    user.push_str("```");

    Ok(vec![Message::system(template.system.clone()), Message::user(user)])
}
