//! Prompt construction — the user text and system instruction sent upstream.

use modelrelay_core::types::RouteMode;

/// System instruction for chat mode.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful and friendly AI assistant. \
You should engage in natural conversation, be polite, and provide helpful responses.";

/// System instruction for code mode.
pub const CODE_SYSTEM_PROMPT: &str = "You are a code-only assistant. \
You must only return code without explanations or markdown formatting. \
Do not include any text before or after the code.";

/// What gets sent for one request, before a model is chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub message: String,
    pub system: &'static str,
}

/// Builds the upstream prompt for a routing mode.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the prompt. Chat text passes through untouched; code prompts
    /// are wrapped in a code-only instruction naming the target language.
    pub fn build(mode: RouteMode, text: &str, language: Option<&str>) -> Prompt {
        match mode {
            RouteMode::Chat => Prompt {
                message: text.to_string(),
                system: CHAT_SYSTEM_PROMPT,
            },
            RouteMode::Code => Prompt {
                message: Self::code_instruction(text, language),
                system: CODE_SYSTEM_PROMPT,
            },
        }
    }

    fn code_instruction(prompt: &str, language: Option<&str>) -> String {
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| format!(" in {l}"))
            .unwrap_or_default();
        format!(
            "Generate ONLY code{language} for the following task: {prompt}. \
             Return ONLY the code without any explanations, comments, or markdown formatting."
        )
    }
}
