use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Openrouter,
    Deepseek,
    Local,
}

/// Static per-provider defaults. Credentials come from [`crate::settings::Settings`].
pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
    pub model_env_var: &'static str,
}

impl ProviderKind {
    /// Fixed cascade priority.
    pub const CASCADE_ORDER: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::Openrouter,
        ProviderKind::Deepseek,
        ProviderKind::Local,
    ];

    pub fn config(&self) -> ProviderConfig {
        match self {
            ProviderKind::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.0-flash",
                env_var: "GEMINI_API_KEY",
                model_env_var: "GEMINI_MODEL",
            },
            ProviderKind::Openrouter => ProviderConfig {
                api_url: "https://openrouter.ai/api/v1/chat/completions",
                model: "meta-llama/llama-3.3-70b-instruct:free",
                env_var: "OPENROUTER_API_KEY",
                model_env_var: "OPENROUTER_MODEL",
            },
            ProviderKind::Deepseek => ProviderConfig {
                api_url: "https://api.deepseek.com/chat/completions",
                model: "deepseek-chat",
                env_var: "DEEPSEEK_API_KEY",
                model_env_var: "DEEPSEEK_MODEL",
            },
            // not used as a fallback; the local provider needs an explicit base URL
            ProviderKind::Local => ProviderConfig {
                api_url: "http://localhost:11434",
                model: "llama3.2",
                env_var: "OLLAMA_BASE_URL",
                model_env_var: "OLLAMA_MODEL",
            },
        }
    }

    /// Wire and log name, also used in aggregate error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Openrouter => "openrouter",
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::Local => "local",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Openrouter => "OpenRouter",
            ProviderKind::Deepseek => "DeepSeek",
            ProviderKind::Local => "Local (Ollama)",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Local)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
