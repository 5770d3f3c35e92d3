use fracture_scan::model_manager::{check_model_file, sha256_hex, verify_file, ModelRequest};
use fracture_scan::{ModelError, ModelInfo, ModelManager};
use tempfile::TempDir;

fn write_cached(manager: &ModelManager, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = manager.get_model_path(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_cached_model_is_reused() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let manager = ModelManager::new(dir.path().join("models"))?;
    let bytes = b"pretend this is an onnx graph";
    let path = write_cached(&manager, "bone-fracture", bytes);

    let info = ModelInfo {
        name: "bone-fracture".to_string(),
        model_url: "http://127.0.0.1:9/unreachable.onnx".to_string(),
        model_hash: sha256_hex(bytes),
    };

    assert!(manager.is_model_downloaded(&info.name));
    assert!(manager.verify_model(&info)?);
    assert_eq!(manager.ensure_model_downloaded(&info).await?, path);
    Ok(())
}

#[test]
fn test_download_failure_cleans_up() {
    let dir = TempDir::new().unwrap();
    let manager = ModelManager::new(dir.path()).unwrap();
    write_cached(&manager, "bone-fracture", b"stale bytes");

    let info = ModelInfo {
        name: "bone-fracture".to_string(),
        // Port 9 (discard) is not served locally, so the fetch fails fast
        model_url: "http://127.0.0.1:9/model.onnx".to_string(),
        model_hash: sha256_hex(b"fresh bytes"),
    };

    let result = tokio_test::block_on(manager.download_model(&info));
    assert!(matches!(
        result,
        Err(ModelError::DownloadError(_)) | Err(ModelError::HashMismatch { .. })
    ));
    assert!(!manager.is_model_downloaded(&info.name));
}

#[test]
fn test_verify_file_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, b"abc").unwrap();

    let upper = sha256_hex(b"abc").to_uppercase();
    assert!(verify_file(&path, &upper).unwrap());
    assert!(!verify_file(&path, "00").unwrap());
}

#[test]
fn test_missing_cached_model() {
    let dir = TempDir::new().unwrap();
    let manager = ModelManager::new(dir.path()).unwrap();
    let err = manager.require_model("bone-fracture").unwrap_err();
    assert!(err.to_string().contains("bone-fracture"));
}

#[test]
fn test_explicit_model_hash_is_checked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bone_fracture.onnx");
    std::fs::write(&path, b"explicit model").unwrap();

    assert!(check_model_file(&path, None).is_ok());
    assert!(check_model_file(&path, Some(sha256_hex(b"explicit model").as_str())).is_ok());

    let result = check_model_file(&path, Some("00"));
    assert!(matches!(result, Err(ModelError::HashMismatch { .. })));
}

#[tokio::test]
async fn test_fresh_without_url_keeps_cached_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let manager = ModelManager::new(dir.path())?;
    let path = write_cached(&manager, "bone-fracture", b"good cached model");

    let request = ModelRequest {
        name: "bone-fracture".to_string(),
        fresh: true,
        ..ModelRequest::default()
    };

    assert_eq!(manager.resolve(&request).await?, path);
    assert!(manager.is_model_downloaded("bone-fracture"));
    Ok(())
}

#[tokio::test]
async fn test_cached_model_hash_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let manager = ModelManager::new(dir.path())?;
    write_cached(&manager, "bone-fracture", b"tampered model");

    let request = ModelRequest {
        name: "bone-fracture".to_string(),
        sha256: Some(sha256_hex(b"original model")),
        ..ModelRequest::default()
    };

    let result = manager.resolve(&request).await;
    assert!(matches!(result, Err(ModelError::HashMismatch { .. })));
    assert!(manager.is_model_downloaded("bone-fracture"));
    Ok(())
}
