use std::fmt;

use crate::BucketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Local,
    S3,
    Gcs,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Scheme::Local => "",
            Scheme::S3 => "s3://",
            Scheme::Gcs => "gs://",
        }
    }
}

/// A parsed storage URI: `s3://bucket/key`, `gs://bucket/key`, `file:///path` or a bare path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    scheme: Scheme,
    bucket: Option<String>,
    key: String,
}

impl ObjectLocation {
    pub fn parse(uri: &str) -> Result<Self, BucketError> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            return Self::remote(Scheme::S3, uri, rest);
        }
        if let Some(rest) = uri.strip_prefix("gs://") {
            return Self::remote(Scheme::Gcs, uri, rest);
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(Self::local(path));
        }
        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(BucketError::Configuration(format!(
                "unsupported storage scheme '{scheme}' in '{uri}'"
            )));
        }
        if uri.is_empty() {
            return Err(BucketError::Configuration("storage path cannot be empty".into()));
        }
        Ok(Self::local(uri))
    }

    fn remote(scheme: Scheme, uri: &str, rest: &str) -> Result<Self, BucketError> {
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(BucketError::Configuration(format!(
                "missing bucket name in '{uri}'"
            )));
        }
        Ok(Self {
            scheme,
            bucket: Some(bucket.to_string()),
            key: key.to_string(),
        })
    }

    fn local(path: &str) -> Self {
        Self {
            scheme: Scheme::Local,
            bucket: None,
            key: path.to_string(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Object key for remote schemes, filesystem path for local ones.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            scheme: self.scheme,
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }

    /// Whether both locations are served by the same store instance.
    pub fn same_store(&self, other: &ObjectLocation) -> bool {
        self.scheme == other.scheme && self.bucket == other.bucket
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bucket {
            Some(bucket) => write!(f, "{}{}/{}", self.scheme.prefix(), bucket, self.key),
            None => f.write_str(&self.key),
        }
    }
}
