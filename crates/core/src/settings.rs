//! Flat provider settings and the sources they are loaded from.
//!
//! Settings are never cached by the pipeline: every provider attempt loads them again, so an edited
//! settings file takes effect on the next attempt.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ProviderError, SettingsError},
    provider::ProviderKind,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub deepseek_model: Option<String>,
    pub local_base_url: Option<String>,
    pub local_model: Option<String>,
}

/// Credentials for one provider, ready for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// API key for cloud providers, base URL for the local one.
    pub credential: String,
    pub model: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `overlay` when it holds a non-blank value, else `base`.
fn prefer(overlay: Option<String>, base: Option<String>) -> Option<String> {
    if non_blank(&overlay).is_some() {
        overlay
    } else {
        base
    }
}

impl Settings {
    fn credential(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => non_blank(&self.gemini_api_key),
            ProviderKind::Openrouter => non_blank(&self.openrouter_api_key),
            ProviderKind::Deepseek => non_blank(&self.deepseek_api_key),
            ProviderKind::Local => non_blank(&self.local_base_url),
        }
    }

    fn model_override(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => non_blank(&self.gemini_model),
            ProviderKind::Openrouter => non_blank(&self.openrouter_model),
            ProviderKind::Deepseek => non_blank(&self.deepseek_model),
            ProviderKind::Local => non_blank(&self.local_model),
        }
    }

    /// Credentials and model for `kind`, or `NotConfigured` when the credential is missing or blank.
    pub fn resolve(&self, kind: ProviderKind) -> Result<ResolvedProvider, ProviderError> {
        let credential = self
            .credential(kind)
            .ok_or(ProviderError::NotConfigured {
                what: if kind.is_local() {
                    "base URL"
                } else {
                    "API key"
                },
            })?;

        let model = self
            .model_override(kind)
            .unwrap_or(kind.config().model)
            .to_string();

        Ok(ResolvedProvider {
            credential: credential.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// False when not a single provider has credentials.
    pub fn is_configured(&self) -> bool {
        ProviderKind::CASCADE_ORDER
            .iter()
            .any(|kind| self.credential(*kind).is_some())
    }

    /// Non-blank values in `overlay` replace the ones in `self`.
    pub fn merge(self, overlay: Settings) -> Settings {
        Settings {
            gemini_api_key: prefer(overlay.gemini_api_key, self.gemini_api_key),
            gemini_model: prefer(overlay.gemini_model, self.gemini_model),
            openrouter_api_key: prefer(overlay.openrouter_api_key, self.openrouter_api_key),
            openrouter_model: prefer(overlay.openrouter_model, self.openrouter_model),
            deepseek_api_key: prefer(overlay.deepseek_api_key, self.deepseek_api_key),
            deepseek_model: prefer(overlay.deepseek_model, self.deepseek_model),
            local_base_url: prefer(overlay.local_base_url, self.local_base_url),
            local_model: prefer(overlay.local_model, self.local_model),
        }
    }
}

#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn load(&self) -> Result<Settings, SettingsError>;
}

#[async_trait]
impl SettingsSource for Settings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.clone())
    }
}

/// Reads credentials from the environment (`GEMINI_API_KEY`, `OLLAMA_BASE_URL`, ...).
pub struct EnvSettings;

impl EnvSettings {
    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl SettingsSource for EnvSettings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let key = |kind: ProviderKind| Self::var(kind.config().env_var);
        let model = |kind: ProviderKind| Self::var(kind.config().model_env_var);

        Ok(Settings {
            gemini_api_key: key(ProviderKind::Gemini),
            gemini_model: model(ProviderKind::Gemini),
            openrouter_api_key: key(ProviderKind::Openrouter),
            openrouter_model: model(ProviderKind::Openrouter),
            deepseek_api_key: key(ProviderKind::Deepseek),
            deepseek_model: model(ProviderKind::Deepseek),
            local_base_url: key(ProviderKind::Local),
            local_model: model(ProviderKind::Local),
        })
    }
}

/// A JSON settings file. A missing file is an empty record, not an error.
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skimmer")
            .join("settings.json")
    }

}

#[async_trait]
impl SettingsSource for FileSettings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        Ok(serde_json::from_str(&content)?)
    }
}

/// Stacks sources; later layers win field by field. A layer that fails to load is logged and
/// skipped so the remaining layers still apply.
pub struct LayeredSettings {
    layers: Vec<Arc<dyn SettingsSource>>,
}

impl LayeredSettings {
    pub fn new(layers: Vec<Arc<dyn SettingsSource>>) -> Self {
        Self { layers }
    }
}

#[async_trait]
impl SettingsSource for LayeredSettings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let mut merged = Settings::default();
        for layer in &self.layers {
            match layer.load().await {
                Ok(settings) => merged = merged.merge(settings),
                Err(e) => warn!(error = %e, "skipping unreadable settings layer"),
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_default_model_without_override() {
        let settings = Settings {
            deepseek_api_key: Some("sk-test".into()),
            ..Default::default()
        };

        let resolved = settings.resolve(ProviderKind::Deepseek).unwrap();
        assert_eq!(resolved.credential, "sk-test");
        assert_eq!(resolved.model, "deepseek-chat");
    }

    #[test]
    fn blank_credentials_are_not_configured() {
        let settings = Settings {
            gemini_api_key: Some("   ".into()),
            local_model: Some("mistral".into()),
            ..Default::default()
        };

        assert!(matches!(
            settings.resolve(ProviderKind::Gemini),
            Err(ProviderError::NotConfigured { what: "API key" })
        ));
        assert!(matches!(
            settings.resolve(ProviderKind::Local),
            Err(ProviderError::NotConfigured { what: "base URL" })
        ));
        assert!(!settings.is_configured());
    }

    #[test]
    fn local_base_url_alone_counts_as_configured() {
        let settings = Settings {
            local_base_url: Some("http://localhost:11434/".into()),
            local_model: Some("mistral".into()),
            ..Default::default()
        };

        assert!(settings.is_configured());
        let resolved = settings.resolve(ProviderKind::Local).unwrap();
        assert_eq!(resolved.credential, "http://localhost:11434");
        assert_eq!(resolved.model, "mistral");
    }

    #[test]
    fn settings_parse_from_flat_camel_case_record() {
        let settings: Settings = serde_json::from_str(
            r#"{"openrouterApiKey":"or-key","openrouterModel":"x/y","unknownKey":true}"#,
        )
        .unwrap();

        assert_eq!(settings.openrouter_api_key.as_deref(), Some("or-key"));
        assert_eq!(settings.openrouter_model.as_deref(), Some("x/y"));
        assert_eq!(settings.gemini_api_key, None);
    }

    #[tokio::test]
    async fn layered_sources_overlay_field_by_field() {
        let base = Settings {
            gemini_api_key: Some("file-key".into()),
            gemini_model: Some("file-model".into()),
            ..Default::default()
        };
        let overlay = Settings {
            gemini_api_key: Some("env-key".into()),
            ..Default::default()
        };

        let layered = LayeredSettings::new(vec![Arc::new(base), Arc::new(overlay)]);
        let settings = layered.load().await.unwrap();

        assert_eq!(settings.gemini_api_key.as_deref(), Some("env-key"));
        assert_eq!(settings.gemini_model.as_deref(), Some("file-model"));
    }

    #[tokio::test]
    async fn layered_sources_ignore_blank_overlay() {
        let file = Settings {
            gemini_api_key: Some("file-key".into()),
            ..Default::default()
        };
        let env = Settings {
            gemini_api_key: Some("".into()),
            gemini_model: Some("  ".into()),
            ..Default::default()
        };

        let layered = LayeredSettings::new(vec![Arc::new(file), Arc::new(env)]);
        let settings = layered.load().await.unwrap();

        assert_eq!(settings.gemini_api_key.as_deref(), Some("file-key"));
        let resolved = settings.resolve(ProviderKind::Gemini).unwrap();
        assert_eq!(resolved.credential, "file-key");
        assert_eq!(resolved.model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn unreadable_layer_does_not_hide_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let env = Settings {
            gemini_api_key: Some("env-key".into()),
            ..Default::default()
        };

        let layered = LayeredSettings::new(vec![Arc::new(FileSettings::new(&path)), Arc::new(env)]);
        let settings = layered.load().await.unwrap();

        assert!(settings.is_configured());
        assert_eq!(settings.gemini_api_key.as_deref(), Some("env-key"));
    }

    #[tokio::test]
    async fn missing_settings_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSettings::new(dir.path().join("settings.json"));

        assert_eq!(source.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn settings_file_is_reread_on_every_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let source = FileSettings::new(&path);

        tokio::fs::write(&path, r#"{"geminiApiKey":"first"}"#)
            .await
            .unwrap();
        assert_eq!(
            source.load().await.unwrap().gemini_api_key.as_deref(),
            Some("first")
        );

        tokio::fs::write(&path, r#"{"geminiApiKey":"second"}"#)
            .await
            .unwrap();
        assert_eq!(
            source.load().await.unwrap().gemini_api_key.as_deref(),
            Some("second")
        );
    }
}
