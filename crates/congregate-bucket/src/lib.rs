//! Abstractions over the storage backends the congregate job reads shards from and writes
//! results to: local disk, S3-compatible buckets and Cloud Storage through its XML interop API.

mod local;
mod location;
mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use glob::{MatchOptions, Pattern};
use std::fmt;
use thiserror::Error;

pub use local::LocalBucketStore;
pub use location::{ObjectLocation, Scheme};
pub use memory::MemoryBucketStore;
pub use s3::{S3BucketStore, S3Config, GCS_INTEROP_ENDPOINT};

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("i/o error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pattern: {0}")]
    Pattern(String),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }

    fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;
    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError>;
    async fn delete_object(&self, key: &str) -> Result<(), BucketError>;
    async fn copy_object(&self, from: &str, to: &str) -> Result<(), BucketError>;

    /// All keys starting with `prefix`, sorted.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BucketError>;

    /// Keys matching a wildcard pattern, sorted. `*` and `?` stay inside one path segment,
    /// `**` spans segments.
    async fn glob(&self, pattern: &str) -> Result<Vec<String>, BucketError> {
        let matcher = compile_pattern(pattern)?;
        let candidates = self.list_prefix(literal_prefix(pattern)).await?;
        Ok(candidates
            .into_iter()
            .filter(|key| matcher.matches_with(key, match_options()))
            .collect())
    }
}

/// The part of `pattern` before its first wildcard character.
pub fn literal_prefix(pattern: &str) -> &str {
    match pattern.find(['*', '?', '[']) {
        Some(idx) => &pattern[..idx],
        None => pattern,
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Pattern, BucketError> {
    Pattern::new(pattern).map_err(|err| BucketError::Pattern(format!("{pattern}: {err}")))
}

pub(crate) fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}
