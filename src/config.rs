//! Static configuration: model sets, discovery limits, and environment
//! overrides. The values mirror the behavior of the original shell wrapper.

use std::env;

/// Comprehensive set of models for thorough analysis.
pub const MODELS_ALL: &[&str] = &[
    // OpenAI models
    "gpt-4.1",
    "o4-mini",
    "o3",
    // Gemini models
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    // OpenRouter models
    "openrouter/deepseek/deepseek-chat-v3-0324",
    "openrouter/deepseek/deepseek-prover-v2",
    "openrouter/deepseek/deepseek-r1-0528",
    "openrouter/x-ai/grok-3-beta",
    "openrouter/x-ai/grok-3-mini-beta",
    "openrouter/meta-llama/llama-4-maverick",
    "openrouter/meta-llama/llama-4-scout",
];

/// Models with larger context windows, for oversized inputs.
pub const MODELS_HIGH_CONTEXT: &[&str] = &[
    "gpt-4.1",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "openrouter/meta-llama/llama-4-maverick",
    "openrouter/meta-llama/llama-4-scout",
];

/// Model used for final output synthesis.
pub const SYNTHESIS_MODEL: &str = "gemini-2.5-pro";

pub const MODEL_SET_NAMES: &[&str] = &["all", "high_context"];

pub const DEFAULT_MODEL_SET: &str = "all";

/// Look up a model set by name.
pub fn model_set(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "all" => Some(MODELS_ALL),
        "high_context" => Some(MODELS_HIGH_CONTEXT),
        _ => None,
    }
}

/// Maximum number of path segments below a search root when looking for
/// glance.md marker files.
pub const MAX_GLANCE_DEPTH: usize = 3;

/// Filename glob for the philosophy-document fallback search.
pub const PHILOSOPHY_PATTERN: &str = "DEVELOPMENT_PHILOSOPHY*.md";

pub const CONTEXT_BEGIN_MARKER: &str = "<!-- BEGIN:CONTEXT -->";
pub const CONTEXT_END_MARKER: &str = "<!-- END:CONTEXT -->";

lazy_static! {
    /// Token count above which the high-context model set is selected.
    pub static ref LLM_CONTEXT_THRESHOLD: usize = env::var("LLM_CONTEXT_THRESHOLD")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200_000);

    /// Provider whose token ratio is used for counting.
    pub static ref TOKEN_COUNT_PROVIDER: String =
        env::var("TOKEN_COUNT_PROVIDER").unwrap_or_else(|_| String::from("openai"));

    /// Master switch for token counting and dynamic model selection.
    pub static ref ENABLE_TOKEN_COUNTING: bool = env::var("ENABLE_TOKEN_COUNTING")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(true);
}
