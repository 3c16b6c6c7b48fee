//! Bench configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//!
//! ```toml
//! [explanation]
//! endpoint = "http://localhost:8001/api/conversation/guide"
//! subject = "Chemistry"
//!
//! [speech]
//! proxy_threshold_chars = 200
//!
//! [guide]
//! language = "hi"
//! ```

use anyhow::Context;
use lab_explain::ExplanationConfig;
use lab_guide::GuideConfig;
use lab_speech::SpeechConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Explanation endpoint override
pub const ENV_EXPLAIN_ENDPOINT: &str = "LAB_EXPLAIN_ENDPOINT";
/// Speech proxy endpoint override
pub const ENV_TTS_ENDPOINT: &str = "LAB_TTS_ENDPOINT";
/// Narration language override
pub const ENV_LANGUAGE: &str = "LAB_LANGUAGE";

/// Full bench configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub explanation: ExplanationConfig,
    pub speech: SpeechConfig,
    pub guide: GuideConfig,
}

impl LabConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Fails on malformed TOML or mistyped fields.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid lab configuration")
    }

    /// Load from `path` if given, defaults otherwise, then apply environment overrides
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = get(ENV_EXPLAIN_ENDPOINT) {
            tracing::debug!(%endpoint, "explanation endpoint overridden");
            self.explanation.endpoint = endpoint;
        }
        if let Some(endpoint) = get(ENV_TTS_ENDPOINT) {
            tracing::debug!(%endpoint, "speech proxy endpoint overridden");
            self.speech.proxy_endpoint = endpoint;
        }
        if let Some(language) = get(ENV_LANGUAGE) {
            self.guide.language = language;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(LabConfig::from_toml_str("").unwrap(), LabConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = LabConfig::from_toml_str(
            r#"
            [speech]
            proxy_threshold_chars = 120

            [guide]
            language = "hi"
            "#,
        )
        .unwrap();
        assert_eq!(config.speech.proxy_threshold_chars, 120);
        assert_eq!(config.speech.max_chars, SpeechConfig::default().max_chars);
        assert_eq!(config.guide.language, "hi");
        assert!(config.guide.speak_explanations);
    }

    #[test]
    fn mistyped_field_is_an_error() {
        let err = LabConfig::from_toml_str("[speech]\nmax_chars = \"many\"").unwrap_err();
        assert!(err.to_string().contains("invalid lab configuration"));
    }

    #[test]
    fn overrides_replace_non_blank_values() {
        let mut config = LabConfig::default();
        config.apply_overrides(|key| match key {
            ENV_EXPLAIN_ENDPOINT => Some("http://ai.test/guide".into()),
            ENV_TTS_ENDPOINT => Some("   ".into()),
            _ => None,
        });
        assert_eq!(config.explanation.endpoint, "http://ai.test/guide");
        assert_eq!(config.speech.proxy_endpoint, SpeechConfig::default().proxy_endpoint);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[explanation]\ntimeout_secs = 5").unwrap();
        let config = LabConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.explanation.timeout_secs, 5);
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = LabConfig::load(Some(Path::new("/nonexistent/lab.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/lab.toml"));
    }
}
