//! Read -> StripHeader -> Write.

use congregate_bucket::ObjectLocation;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::header::{is_near_header, strip_header};
use crate::options::EngineOptions;
use crate::sink::{self, SinkOptions};
use crate::source::{self, TextShard};
use crate::storage::StoreResolver;

pub const DEFAULT_INPUT: &str = "gs://york-project-bucket/congregate/part-r-*";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: String,
    pub output: String,
    pub sink: SinkOptions,
    pub engine: EngineOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSummary {
    pub path: String,
    pub records_read: usize,
    pub headers_stripped: usize,
    /// Header look-alikes that were kept as data.
    pub near_headers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub inputs: Vec<ShardSummary>,
    pub records_written: usize,
    pub outputs: Vec<String>,
}

/// Runs the job to completion. Nothing is retried; the first failure is returned.
pub async fn run(options: &PipelineOptions, stores: &dyn StoreResolver) -> Result<PipelineReport> {
    let input = ObjectLocation::parse(&options.input)?;
    let output = ObjectLocation::parse(&options.output)?;
    options.sink.validate()?;
    let workers = options.engine.workers()?;

    if !options.engine.is_direct_runner() {
        warn!(
            runner = options.engine.runner().unwrap_or_default(),
            "requested runner is not available, executing in-process"
        );
    }
    for (name, value) in options.engine.entries() {
        debug!(option = name, value, "engine option");
    }
    info!(input = %input, output = %output, workers, "starting pipeline");

    let source_store = stores.store_for(&input).await?;
    let stripped = source::read_text(source_store.as_ref(), &input, workers, strip_shard).await?;

    let mut inputs = Vec::with_capacity(stripped.len());
    let mut records = Vec::new();
    for (summary, kept) in stripped {
        if summary.near_headers > 0 {
            warn!(
                shard = %summary.path,
                count = summary.near_headers,
                "records resembling the header were kept as data"
            );
        }
        inputs.push(summary);
        records.extend(kept);
    }

    let sink_store = if output.same_store(&input) {
        source_store
    } else {
        stores.store_for(&output).await?
    };
    let outputs =
        sink::write_text(sink_store.as_ref(), &output, &records, &options.sink, workers).await?;

    info!(
        shards_read = inputs.len(),
        records_written = records.len(),
        files_written = outputs.len(),
        "pipeline finished"
    );

    Ok(PipelineReport {
        inputs,
        records_written: records.len(),
        outputs,
    })
}

/// Applies [`strip_header`] to every record of one shard.
pub fn strip_shard(shard: TextShard) -> (ShardSummary, Vec<String>) {
    let records_read = shard.records.len();
    let mut headers_stripped = 0;
    let mut near_headers = 0;
    let mut kept = Vec::with_capacity(records_read);

    for record in shard.records {
        if strip_header(&record).is_none() {
            headers_stripped += 1;
            continue;
        }
        if is_near_header(&record) {
            near_headers += 1;
        }
        kept.push(record);
    }

    let summary = ShardSummary {
        path: shard.path,
        records_read,
        headers_stripped,
        near_headers,
    };
    (summary, kept)
}
