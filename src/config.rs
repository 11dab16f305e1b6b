use crate::error::{Result, SummarizerError};
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const OUTPUT_DIR_VAR: &str = "REPORT_OUTPUT_DIR";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub struct SummarizerConfig {
    pub api_key: String,
    pub model: String,
    pub output_dir: PathBuf,
}

impl SummarizerConfig {
    /// Reads `GEMINI_API_KEY` (required), `GEMINI_MODEL` and
    /// `REPORT_OUTPUT_DIR` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR)
            .ok_or_else(|| SummarizerError::Config(format!("{} must be set", API_KEY_VAR)))?;

        Ok(Self {
            api_key,
            model: non_empty(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            output_dir: non_empty(OUTPUT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_output_dir),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

impl std::fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// The user's desktop, falling back to `~/Desktop` and then the working
/// directory.
pub fn default_output_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        let err = SummarizerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, SummarizerError::Config(_)));

        let blank = SummarizerConfig::from_lookup(lookup(&[(API_KEY_VAR, "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = SummarizerConfig::from_lookup(lookup(&[(API_KEY_VAR, "k")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.output_dir, default_output_dir());

        let config = SummarizerConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (MODEL_VAR, "gemini-2.5-flash"),
            (OUTPUT_DIR_VAR, "/tmp/reports"),
        ]))
        .unwrap()
        .with_model("gemini-2.5-pro");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
        assert!(!format!("{:?}", config).contains("\"k\""));
    }
}
