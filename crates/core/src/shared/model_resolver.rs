use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {name} is not cached and no download URL was given")]
    NoSource { name: String },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a detection model file.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory
/// 3. Download from `url` into the cache
pub fn resolve(
    explicit: Option<&Path>,
    name: &str,
    url: Option<&str>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::Missing(path.to_path_buf()))
        };
    }
    resolve_in(&model_cache_dir()?, name, url, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: Option<&str>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    let url = url.ok_or_else(|| ModelResolveError::NoSource {
        name: name.to_string(),
    })?;
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/maskreel/models/`
/// - Linux: `$XDG_CACHE_HOME/maskreel/models/` or `~/.cache/maskreel/models/`
/// - Windows: `%LOCALAPPDATA%/maskreel/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("maskreel").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("maskreel").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Written under a temp name and renamed so a failed download never
    // leaves a truncated model in the cache.
    let temp_path = dest.with_extension("part");
    let write_err = |source| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|source| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("custom.onnx");
        fs::write(&model, b"model").unwrap();
        let resolved = resolve(Some(&model), "ignored.onnx", None, None).unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = resolve(Some(Path::new("/nonexistent/model.onnx")), "x", None, None);
        assert!(matches!(result, Err(ModelResolveError::Missing(_))));
    }

    #[test]
    fn test_cached_file_is_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cached.onnx"), b"model").unwrap();
        let resolved = resolve_in(tmp.path(), "cached.onnx", None, None).unwrap();
        assert_eq!(resolved, tmp.path().join("cached.onnx"));
    }

    #[test]
    fn test_uncached_without_url_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_in(tmp.path(), "absent.onnx", None, None);
        assert!(matches!(result, Err(ModelResolveError::NoSource { .. })));
    }

    #[test]
    fn test_model_cache_dir_names_app() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("maskreel"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_failed_download_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
