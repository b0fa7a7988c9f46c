//! Congregate: read header-prefixed text shards, drop the repeated header line and write the
//! surviving records behind a single header.

pub mod error;
pub mod header;
pub mod options;
pub mod pipeline;
pub mod records;
pub mod sink;
pub mod source;
pub mod storage;

pub use error::{CongregateError, Result};
pub use header::{strip_header, HEADER};
pub use options::{parse_args, EngineOptions, JobArgs};
pub use pipeline::{run, PipelineOptions, PipelineReport, ShardSummary, DEFAULT_INPUT};
pub use sink::SinkOptions;
pub use storage::{DefaultStores, SharedStore, StoreResolver};
