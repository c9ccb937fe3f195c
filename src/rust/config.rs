use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::classifier::{ClassifierError, InputMode, NewsClassifier, DEFAULT_PREVIEW_CHARS};
use crate::model_manager::{ModelManager, DEFAULT_MODEL_FILE};
use crate::runtime::{parse_optimization_level, RuntimeConfig};

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Application settings.
///
/// Resolved from defaults, then `GAZETTE_*` environment variables, then
/// command line flags (applied by the binary).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit pipeline artifact path; looked up when unset
    pub model_path: Option<PathBuf>,
    /// Expected SHA-256 of the artifact
    pub model_sha256: Option<String>,
    /// WordNet `dict` directory for the lemmatizer
    pub wordnet_dir: Option<PathBuf>,
    pub input_mode: InputMode,
    pub bind: SocketAddr,
    /// Description characters shown in the article preview
    pub preview_chars: usize,
    pub intra_threads: usize,
    /// "disable", "1", "2" or "3"
    pub optimization_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: None,
            model_sha256: None,
            wordnet_dir: None,
            input_mode: InputMode::default(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            intra_threads: 0,
            optimization_level: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(path) = get("GAZETTE_MODEL") {
            settings.model_path = Some(PathBuf::from(path));
        }
        settings.model_sha256 = get("GAZETTE_MODEL_SHA256");
        if let Some(dir) = get("GAZETTE_WORDNET") {
            settings.wordnet_dir = Some(PathBuf::from(dir));
        }
        if let Some(mode) = get("GAZETTE_INPUT_MODE") {
            settings.input_mode = mode.parse::<InputMode>().map_err(|message| ConfigError::Invalid {
                name: "GAZETTE_INPUT_MODE",
                message,
            })?;
        }
        if let Some(bind) = get("GAZETTE_BIND") {
            settings.bind = bind.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                name: "GAZETTE_BIND",
                message: e.to_string(),
            })?;
        }
        if let Some(threads) = get("GAZETTE_INTRA_THREADS") {
            settings.intra_threads = threads.parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "GAZETTE_INTRA_THREADS",
                message: e.to_string(),
            })?;
        }
        settings.optimization_level = get("GAZETTE_OPT_LEVEL");

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview_chars == 0 {
            return Err(ConfigError::Invalid {
                name: "preview_chars",
                message: "must be greater than 0".into(),
            });
        }
        if let Some(level) = &self.optimization_level {
            if parse_optimization_level(level).is_none() {
                return Err(ConfigError::Invalid {
                    name: "GAZETTE_OPT_LEVEL",
                    message: format!("unknown optimization level '{}'", level),
                });
            }
        }
        if let Some(hash) = &self.model_sha256 {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Invalid {
                    name: "GAZETTE_MODEL_SHA256",
                    message: "expected 64 hex characters".into(),
                });
            }
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig {
            intra_threads: self.intra_threads,
            ..RuntimeConfig::default()
        };
        if let Some(level) = self.optimization_level.as_deref().and_then(parse_optimization_level) {
            config.optimization_level = level;
        }
        config
    }

    /// The artifact path to load: the configured one, else the first
    /// existing default location, else `news.onnx` in the working directory
    /// so the missing file is reported by name.
    ///
    /// Resolved once when the classifier is built. A file that appears
    /// later is picked up only at the resolved path.
    pub fn resolved_model_path(&self) -> PathBuf {
        if let Some(path) = &self.model_path {
            return path.clone();
        }
        ModelManager::find_default_model().unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_FILE))
    }

    /// The WordNet dict directory: the configured one, else the first
    /// complete one in NLTK's data locations or the cache.
    pub fn resolved_wordnet_dir(&self) -> Option<PathBuf> {
        self.wordnet_dir
            .clone()
            .or_else(|| ModelManager::find_wordnet_dir(&ModelManager::wordnet_candidates()))
    }

    /// Builds a classifier for these settings. The pipeline itself is loaded
    /// on first use.
    pub fn build_classifier(&self) -> Result<NewsClassifier, ClassifierError> {
        let mut builder = NewsClassifier::builder()
            .with_runtime_config(self.runtime_config())
            .with_input_mode(self.input_mode)
            .with_model_path(self.resolved_model_path())?;
        if let Some(hash) = &self.model_sha256 {
            builder = builder.with_model_sha256(hash.clone());
        }
        if let Some(dir) = self.resolved_wordnet_dir() {
            builder = builder.with_wordnet_dir(dir);
        }
        builder.build()
    }
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
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.bind.to_string(), DEFAULT_BIND);
        assert_eq!(settings.input_mode, InputMode::Normalized);
        assert_eq!(settings.preview_chars, 300);
        assert!(settings.model_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("GAZETTE_MODEL", "/srv/news.onnx"),
            ("GAZETTE_INPUT_MODE", "raw"),
            ("GAZETTE_BIND", "0.0.0.0:9000"),
            ("GAZETTE_WORDNET", ""),
        ]))
        .unwrap();
        assert_eq!(settings.resolved_model_path(), PathBuf::from("/srv/news.onnx"));
        assert_eq!(settings.input_mode, InputMode::Raw);
        assert_eq!(settings.bind.port(), 9000);
        assert!(settings.wordnet_dir.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_lookup(lookup(&[("GAZETTE_INPUT_MODE", "stemmed")])).unwrap_err();
        assert!(err.to_string().contains("GAZETTE_INPUT_MODE"));
        assert!(Settings::from_lookup(lookup(&[("GAZETTE_BIND", "nowhere")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("GAZETTE_OPT_LEVEL", "fast")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("GAZETTE_MODEL_SHA256", "abc")])).is_err());
    }

    #[test]
    fn test_explicit_wordnet_dir_wins() {
        let settings = Settings {
            wordnet_dir: Some(PathBuf::from("/srv/wordnet")),
            ..Settings::default()
        };
        assert_eq!(settings.resolved_wordnet_dir(), Some(PathBuf::from("/srv/wordnet")));
    }

    #[test]
    fn test_default_model_path_is_named() {
        let path = Settings::default().resolved_model_path();
        assert!(path.ends_with(DEFAULT_MODEL_FILE));
    }

    #[test]
    fn test_build_classifier_is_lazy() {
        let settings = Settings {
            model_path: Some(PathBuf::from("/nonexistent/news.onnx")),
            ..Settings::default()
        };
        let classifier = settings.build_classifier().unwrap();
        assert!(!classifier.is_model_loaded());
    }
}
