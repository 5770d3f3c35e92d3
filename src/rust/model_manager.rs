use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

/// Where to fetch a model artifact from and the SHA-256 it must hash to.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub model_hash: String,
}

/// A model named in the local cache, optionally fetched from a URL.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub name: String,
    pub url: Option<String>,
    pub sha256: Option<String>,
    /// Discard the cached file and download again; only honored with a URL
    pub fresh: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: String,
        actual: String,
    },
}

/// Keeps model artifacts in a local cache directory and checks their integrity.
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
        if let Ok(path) = env::var("FRACTURE_SCAN_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("fracture-scan").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("fracture-scan").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("fracture-scan").join("models")
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

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("model.onnx")
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    /// Returns the path of a cached model, failing if it has not been downloaded
    pub fn require_model(&self, name: &str) -> Result<PathBuf, ModelError> {
        let model_path = self.get_model_path(name);
        if !model_path.exists() {
            return Err(ModelError::NotDownloaded(name.to_string()));
        }
        Ok(model_path)
    }

    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(&info.name);
        let result = if model_path.exists() {
            log::info!("Model file exists at {:?}, verifying...", model_path);
            if !verify_file(&model_path, &info.model_hash)? {
                log::warn!("Model file verification failed, redownloading");
                self.download_and_verify_file(&info.model_url, &model_path, &info.model_hash).await
            } else {
                log::info!("Existing model file verified successfully");
                Ok(())
            }
        } else {
            log::info!("Model file does not exist, downloading...");
            self.download_and_verify_file(&info.model_url, &model_path, &info.model_hash).await
        };

        if let Err(e) = result {
            log::error!("Failed to setup model file: {}", e);
            // Cleanup on failure
            let _ = self.remove_download(&info.name);
            return Err(e);
        }

        log::info!("Model ready to use");
        Ok(())
    }

    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(&info.name);
        if !model_path.exists() {
            log::info!("Model file {:?} does not exist", model_path);
            return Ok(false);
        }

        let model_ok = verify_file(&model_path, &info.model_hash)?;
        log::info!("Model hash verification for {}: {}", info.name, model_ok);
        Ok(model_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading model from {} to {:?}", url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if !hash.eq_ignore_ascii_case(expected_hash) {
            log::error!("Model hash mismatch: expected {}, got {}", expected_hash, hash);
            return Err(ModelError::HashMismatch {
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        // Verify after writing
        if !verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("Model downloaded and verified successfully");
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.get_model_path(name);
        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model {} not found, downloading...", info.name);
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Model {} verified", info.name);
        }
        Ok(self.get_model_path(&info.name))
    }

    /// Resolves a cached model, downloading it when a URL and hash are given.
    ///
    /// A cached model is only removed for a fresh download when there is
    /// somewhere to download it from.
    pub async fn resolve(&self, request: &ModelRequest) -> Result<PathBuf, ModelError> {
        match (&request.url, &request.sha256) {
            (Some(url), Some(hash)) => {
                let info = ModelInfo {
                    name: request.name.clone(),
                    model_url: url.clone(),
                    model_hash: hash.clone(),
                };
                if request.fresh {
                    log::info!("Fresh download requested - removing any existing model file...");
                    self.remove_download(&info.name)?;
                }
                self.ensure_model_downloaded(&info).await
            }
            _ => {
                if request.fresh {
                    log::warn!("Fresh download requested without a model URL; keeping cached {}", request.name);
                }
                let path = self.require_model(&request.name)?;
                check_model_file(&path, request.sha256.as_deref())?;
                Ok(path)
            }
        }
    }
}

/// Hex-encoded SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Checks a file on disk against an expected hex SHA-256
pub fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
    let bytes = fs::read(path)?;
    let hash = sha256_hex(&bytes);
    log::debug!("Calculated hash {} for {:?} ({} bytes)", hash, path, bytes.len());
    Ok(hash.eq_ignore_ascii_case(expected_hash))
}

/// Fails with `HashMismatch` when an expected hash is given and the file does not match it
pub fn check_model_file(path: &Path, expected_hash: Option<&str>) -> Result<(), ModelError> {
    let Some(expected) = expected_hash else {
        return Ok(());
    };
    let actual = sha256_hex(&fs::read(path)?);
    if !actual.eq_ignore_ascii_case(expected) {
        log::error!("Model {:?} hash mismatch: expected {}, got {}", path, expected, actual);
        return Err(ModelError::HashMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info_for(bytes: &[u8]) -> ModelInfo {
        ModelInfo {
            name: "xray".to_string(),
            // Never reached in these tests: the cached file already verifies
            model_url: "http://127.0.0.1:9/model.onnx".to_string(),
            model_hash: sha256_hex(bytes),
        }
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_model_paths() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        assert!(manager.get_model_path("xray").ends_with("xray/model.onnx"));
        assert!(!manager.is_model_downloaded("xray"));
        assert!(matches!(manager.require_model("xray"), Err(ModelError::NotDownloaded(_))));
    }

    #[test]
    fn test_verify_model() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let bytes = b"onnx bytes";
        let info = info_for(bytes);

        assert!(!manager.verify_model(&info).unwrap());

        let path = manager.get_model_path(&info.name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        assert!(manager.verify_model(&info).unwrap());

        fs::write(&path, "corrupted data").unwrap();
        assert!(!manager.verify_model(&info).unwrap());

        manager.remove_download(&info.name).unwrap();
        assert!(!manager.is_model_downloaded(&info.name));
    }

    #[tokio::test]
    async fn test_ensure_uses_verified_cache() -> Result<(), ModelError> {
        let dir = TempDir::new()?;
        let manager = ModelManager::new(dir.path())?;
        let bytes = b"cached model";
        let info = info_for(bytes);

        let path = manager.get_model_path(&info.name);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, bytes)?;

        let resolved = manager.ensure_model_downloaded(&info).await?;
        assert_eq!(resolved, path);
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var("FRACTURE_SCAN_CACHE", "/tmp/test-fracture-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-fracture-cache/models"));
        env::remove_var("FRACTURE_SCAN_CACHE");

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("fracture-scan/models"));
    }
}
