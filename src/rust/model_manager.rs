use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::text::{Lexicon, LexiconError, WORDNET_FILES};

/// File name of the pipeline artifact when no explicit path is configured.
pub const DEFAULT_MODEL_FILE: &str = "news.onnx";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file '{0}' not found")]
    NotFound(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Downloaded WordNet files are unusable: {0}")]
    InvalidLexicon(#[from] LexiconError),
}

/// Locates, verifies and downloads the pipeline artifact.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("GAZETTE_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("gazette").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("gazette").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("gazette").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Where a downloaded artifact is stored.
    pub fn get_model_path(&self) -> PathBuf {
        self.models_dir.join(DEFAULT_MODEL_FILE)
    }

    /// Where downloaded WordNet dict files are stored.
    pub fn get_wordnet_dir(&self) -> PathBuf {
        self.models_dir.join("wordnet")
    }

    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        Self::candidate_paths_in(&self.models_dir)
    }

    /// Places the artifact is looked for, in order: beside the executable,
    /// the working directory, then `models_dir`. Nothing is created.
    pub fn candidate_paths_in(models_dir: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
            candidates.push(dir.join(DEFAULT_MODEL_FILE));
        }
        if let Ok(cwd) = env::current_dir() {
            candidates.push(cwd.join(DEFAULT_MODEL_FILE));
        }
        candidates.push(models_dir.join(DEFAULT_MODEL_FILE));
        candidates
    }

    /// Returns the first of `candidates` that is a file.
    pub fn find_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.iter().find_map(|path| {
            log::debug!("Looking for model at {:?} (exists: {})", path, path.is_file());
            path.is_file().then(|| path.clone())
        })
    }

    /// Resolves the artifact in the default locations without touching the
    /// file system beyond existence checks.
    pub fn find_default_model() -> Option<PathBuf> {
        Self::find_existing(&Self::candidate_paths_in(&Self::get_default_models_dir()))
    }

    /// Returns the first candidate path that exists.
    pub fn resolve_model_path(&self) -> Result<PathBuf, ModelError> {
        let path = Self::find_existing(&self.candidate_paths())
            .ok_or_else(|| ModelError::NotFound(DEFAULT_MODEL_FILE.to_string()))?;
        log::info!("Using model at {:?}", path);
        Ok(path)
    }

    /// WordNet dict directories looked for when none is configured: NLTK's
    /// data locations, then the cache.
    pub fn wordnet_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(paths) = env::var("NLTK_DATA") {
            candidates.extend(env::split_paths(&paths).map(|p| p.join("corpora").join("wordnet")));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("nltk_data").join("corpora").join("wordnet"));
        }
        candidates.push(Self::get_default_models_dir().join("wordnet"));
        candidates
    }

    /// Returns the first of `candidates` holding every WordNet dict file.
    pub fn find_wordnet_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates
            .iter()
            .find(|dir| WORDNET_FILES.iter().all(|file| dir.join(file).is_file()))
            .cloned()
    }

    pub fn is_model_present(&self) -> bool {
        self.resolve_model_path().is_ok()
    }

    /// Computes the SHA-256 of `path` and compares it with `expected_hash`
    /// (hex, case-insensitive).
    pub fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        log::info!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::info!("Calculated hash: {}", hash);
        log::info!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash.trim()))
    }

    /// Downloads the artifact into the models directory, verifying it
    /// before and after it is written. Returns the stored path.
    pub async fn download_model(&self, url: &str, expected_hash: &str) -> Result<PathBuf, ModelError> {
        let _lock = self.download_lock.lock().await;
        let path = self.get_model_path();

        if path.exists() {
            log::info!("Model file exists at {:?}, verifying...", path);
            if Self::verify_file(&path, expected_hash)? {
                log::info!("Existing model file verified successfully");
                return Ok(path);
            }
            log::warn!("Model file verification failed, redownloading");
        }

        match self.download_and_verify_file(url, &path, expected_hash).await {
            Ok(()) => {
                log::info!("Model ready to use");
                Ok(path)
            }
            Err(e) => {
                log::error!("Failed to setup model file: {}", e);
                // Cleanup on failure
                let _ = self.remove_download();
                Err(e)
            }
        }
    }

    async fn download_and_verify_file(&self, url: &str, path: &Path, expected_hash: &str) -> Result<(), ModelError> {
        log::info!("Downloading model from {} to {:?}", url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        log::info!("Download response status: {}", response.status());
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if !hash.eq_ignore_ascii_case(expected_hash.trim()) {
            log::error!("Model hash mismatch: expected {}, got {}", expected_hash, hash);
            return Err(ModelError::HashMismatch {
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(path, &bytes)?;

        // Verify after writing
        if !Self::verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("Model file downloaded and verified successfully");
        Ok(())
    }

    /// Downloads the WordNet dict files from `base_url` (a directory URL
    /// holding `index.verb`, `verb.exc`, `index.adv` and `adv.exc`) into the
    /// cache, and checks they load as a lexicon.
    pub async fn download_wordnet(&self, base_url: &str) -> Result<PathBuf, ModelError> {
        let _lock = self.download_lock.lock().await;
        let dir = self.get_wordnet_dir();
        fs::create_dir_all(&dir)?;

        let base_url = base_url.trim_end_matches('/');
        for file in WORDNET_FILES {
            let url = format!("{}/{}", base_url, file);
            log::info!("Downloading {}", url);
            let result = async {
                let response = reqwest::get(&url).await?.error_for_status()?;
                Ok::<_, ModelError>(response.bytes().await?)
            }
            .await;
            match result {
                Ok(bytes) => fs::write(dir.join(file), &bytes)?,
                Err(e) => {
                    log::error!("Failed to download {}: {}", url, e);
                    let _ = fs::remove_dir_all(&dir);
                    return Err(e);
                }
            }
        }

        if let Err(e) = Lexicon::from_wordnet_dir(&dir) {
            let _ = fs::remove_dir_all(&dir);
            return Err(e.into());
        }
        log::info!("WordNet lexicon ready at {:?}", dir);
        Ok(dir)
    }

    pub fn remove_download(&self) -> Result<(), ModelError> {
        let path = self.get_model_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_verify_file() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("news.onnx");
        fs::write(&path, "hello")?;

        assert!(ModelManager::verify_file(&path, HELLO_SHA256)?);
        assert!(ModelManager::verify_file(&path, &HELLO_SHA256.to_uppercase())?);

        fs::write(&path, "corrupted data")?;
        assert!(!ModelManager::verify_file(&path, HELLO_SHA256)?);
        Ok(())
    }

    #[test]
    fn test_models_dir_lookup() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path().join("models"))?;
        assert!(manager.models_dir().is_dir());
        assert!(manager.get_model_path().ends_with("models/news.onnx"));
        assert_eq!(manager.candidate_paths().last(), Some(&manager.get_model_path()));

        fs::write(manager.get_model_path(), "hello")?;
        assert!(manager.candidate_paths().iter().any(|p| p.is_file()));

        manager.remove_download()?;
        assert!(!manager.get_model_path().exists());
        Ok(())
    }

    #[test]
    fn test_candidate_lookup_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let models_dir = dir.path().join("cache").join("models");
        let candidates = ModelManager::candidate_paths_in(&models_dir);
        assert_eq!(candidates.last(), Some(&models_dir.join(DEFAULT_MODEL_FILE)));
        assert_eq!(ModelManager::find_existing(&candidates[candidates.len() - 1..]), None);
        assert!(!dir.path().join("cache").exists());
    }

    #[test]
    fn test_find_wordnet_dir() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let partial = dir.path().join("partial");
        let complete = dir.path().join("complete");
        fs::create_dir_all(&partial)?;
        fs::create_dir_all(&complete)?;
        fs::write(partial.join("index.verb"), "run v\n")?;
        for file in WORDNET_FILES {
            fs::write(complete.join(file), "run v\n")?;
        }

        let candidates = vec![dir.path().join("missing"), partial, complete.clone()];
        assert_eq!(ModelManager::find_wordnet_dir(&candidates), Some(complete));
        assert_eq!(ModelManager::find_wordnet_dir(&candidates[..2]), None);
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        let path = ModelManager::get_default_models_dir();
        assert!(path.ends_with("models"));
    }
}
