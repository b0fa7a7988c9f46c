// crates/congregate-core/src/error.rs

use congregate_bucket::BucketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CongregateError {
    #[error("Storage operation failed: {0}")]
    Bucket(#[from] BucketError),

    #[error("No input files matched '{0}'")]
    NoInputFiles(String),

    #[error("Shard '{path}' is not valid UTF-8: {source}")]
    Encoding {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Invalid sink configuration: {0}")]
    Sink(String),

    #[error("Invalid engine option --{name}: {message}")]
    EngineOption { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, CongregateError>;
