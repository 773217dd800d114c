//! System directives sent alongside the user's instruction.
//!
//! The instruction file says *what* the categories are; these directives sit
//! at the system/role level and pin down the *shape* of the answer: a single
//! short lowercase label. The label vocabulary named here is advisory only;
//! whatever the backend returns is recorded as-is (trimmed).

/// Directive for chat-style backends with a system role (OpenAI).
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a careful document classifier. \
Respond with a short, lowercase label like: bank_statement, credit_card_statement, \
email, text_message, social_media_message, or other.";

/// Shorter directive for backends with a dedicated system field
/// (Anthropic `system`, Gemini `systemInstruction`).
pub const CLASSIFIER_SYSTEM_PROMPT_SHORT: &str =
    "You classify documents. Output a short, lowercase label only.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_ask_for_lowercase_label() {
        for p in [CLASSIFIER_SYSTEM_PROMPT, CLASSIFIER_SYSTEM_PROMPT_SHORT] {
            assert!(p.contains("lowercase"));
            assert!(p.contains("label"));
        }
        assert!(CLASSIFIER_SYSTEM_PROMPT.contains("other"));
    }
}
