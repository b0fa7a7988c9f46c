use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::{compile_pattern, match_options, BucketError, BucketStore};

/// Store backed by the local filesystem. Keys are plain paths.
#[derive(Debug, Clone, Default)]
pub struct LocalBucketStore;

impl LocalBucketStore {
    pub fn new() -> Self {
        Self
    }
}

fn map_io(key: &str, err: std::io::Error) -> BucketError {
    if err.kind() == ErrorKind::NotFound {
        BucketError::NotFound(key.to_string())
    } else {
        BucketError::io(key, err)
    }
}

fn path_to_key(path: &Path) -> Result<String, BucketError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| BucketError::Configuration(format!("non UTF-8 path: {}", path.display())))
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        if let Some(parent) = Path::new(key).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| BucketError::io(key, err))?;
            }
        }
        fs::write(key, &bytes).await.map_err(|err| map_io(key, err))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        let data = fs::read(key).await.map_err(|err| map_io(key, err))?;
        Ok(Bytes::from(data))
    }

    async fn delete_object(&self, key: &str) -> Result<(), BucketError> {
        fs::remove_file(key).await.map_err(|err| map_io(key, err))?;

        // Directories have no meaning in an object namespace: drop the parent once it is empty.
        if let Some(parent) = Path::new(key).parent() {
            if !parent.as_os_str().is_empty() && fs::remove_dir(parent).await.is_ok() {
                debug!(dir = %parent.display(), "removed empty directory");
            }
        }
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<(), BucketError> {
        if let Some(parent) = Path::new(to).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| BucketError::io(to, err))?;
            }
        }
        fs::copy(from, to).await.map_err(|err| map_io(from, err))?;
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BucketError> {
        let owned = prefix.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, BucketError> {
            let (dir, relative) = match owned.rfind('/') {
                Some(0) => (PathBuf::from("/"), false),
                Some(idx) => (PathBuf::from(&owned[..idx]), false),
                None => (PathBuf::from("."), true),
            };
            if !dir.is_dir() {
                return Ok(Vec::new());
            }

            let mut keys = Vec::new();
            for entry in WalkDir::new(&dir) {
                let entry = entry.map_err(|err| BucketError::io(&owned, err.into()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let path = if relative {
                    path.strip_prefix(".").unwrap_or(path)
                } else {
                    path
                };
                let key = path_to_key(path)?;
                if key.starts_with(&owned) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|err| BucketError::Configuration(format!("listing task failed: {err}")))?
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<String>, BucketError> {
        compile_pattern(pattern)?;
        let owned = pattern.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, BucketError> {
            let paths = glob::glob_with(&owned, match_options())
                .map_err(|err| BucketError::Pattern(format!("{owned}: {err}")))?;

            let mut keys = Vec::new();
            for entry in paths {
                let path = entry.map_err(|err| {
                    let key = err.path().display().to_string();
                    BucketError::io(key, err.into())
                })?;
                if path.is_file() {
                    keys.push(path_to_key(&path)?);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|err| BucketError::Configuration(format!("glob task failed: {err}")))?
    }
}
