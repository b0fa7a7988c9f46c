use std::collections::HashSet;
use std::fmt::Write as _;
use std::ops::Range;

use bytes::Bytes;
use congregate_bucket::{BucketStore, ObjectLocation};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CongregateError, Result};
use crate::header::HEADER;

pub const DEFAULT_SHARD_NAME_TEMPLATE: &str = "-SSSSS-of-NNNNN";
const CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOptions {
    pub file_name_suffix: String,
    /// Written as the first line of every output shard.
    pub header: Option<String>,
    pub num_shards: usize,
    pub shard_name_template: String,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            file_name_suffix: ".csv".to_string(),
            header: Some(HEADER.to_string()),
            num_shards: 1,
            shard_name_template: DEFAULT_SHARD_NAME_TEMPLATE.to_string(),
        }
    }
}

impl SinkOptions {
    pub fn validate(&self) -> Result<()> {
        if self.num_shards == 0 {
            return Err(CongregateError::Sink("num_shards must be at least 1".into()));
        }
        let distinct: HashSet<String> = (0..self.num_shards)
            .map(|index| expand_shard_template(&self.shard_name_template, index, self.num_shards))
            .collect();
        if distinct.len() != self.num_shards {
            return Err(CongregateError::Sink(format!(
                "shard name template '{}' does not give {} shards distinct names",
                self.shard_name_template, self.num_shards
            )));
        }
        Ok(())
    }

    /// Final keys for every shard of `prefix`.
    pub fn shard_keys(&self, prefix: &str) -> Vec<String> {
        (0..self.num_shards)
            .map(|index| {
                format!(
                    "{prefix}{}{}",
                    expand_shard_template(&self.shard_name_template, index, self.num_shards),
                    self.file_name_suffix
                )
            })
            .collect()
    }
}

/// Replaces the first run of `S` with the zero-padded shard index and the first run of `N`
/// with the zero-padded shard count; the run length sets the width.
pub fn expand_shard_template(template: &str, index: usize, count: usize) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut index_done = false;
    let mut count_done = false;

    while let Some(c) = chars.next() {
        let value = match c {
            'S' if !index_done => {
                index_done = true;
                index
            }
            'N' if !count_done => {
                count_done = true;
                count
            }
            _ => {
                out.push(c);
                continue;
            }
        };

        let mut width = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            width += 1;
        }
        let _ = write!(out, "{value:0width$}");
    }

    out
}

/// Contiguous, near-equal slices of `len` records over `shards` shards.
pub fn shard_ranges(len: usize, shards: usize) -> Vec<Range<usize>> {
    let base = len / shards;
    let extra = len % shards;
    let mut start = 0;
    (0..shards)
        .map(|shard| {
            let size = base + usize::from(shard < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

pub fn render_shard(header: Option<&str>, records: &[String]) -> String {
    let capacity = header.map_or(0, |h| h.len() + 1)
        + records.iter().map(|record| record.len() + 1).sum::<usize>();
    let mut body = String::with_capacity(capacity);
    for line in header.into_iter().chain(records.iter().map(String::as_str)) {
        body.push_str(line);
        body.push('\n');
    }
    body
}

fn staging_prefix(output_key: &str) -> String {
    let dir = format!(".congregate-temp-{}/", Uuid::new_v4());
    match output_key.rfind('/') {
        Some(idx) => format!("{}/{dir}", &output_key[..idx]),
        None => dir,
    }
}

/// Staged names depend only on the shard index, so they stay distinct whatever the template.
fn staged_key(staging: &str, index: usize, suffix: &str) -> String {
    format!("{staging}shard-{index:05}{suffix}")
}

/// Writes `records` as text shards under `output`, each starting with the header.
///
/// Shards are staged next to the output and only copied to their final names once every shard
/// has been written. Returns the final locations.
pub async fn write_text(
    store: &dyn BucketStore,
    output: &ObjectLocation,
    records: &[String],
    options: &SinkOptions,
    workers: usize,
) -> Result<Vec<String>> {
    options.validate()?;

    let final_keys = options.shard_keys(output.key());
    let ranges = shard_ranges(records.len(), options.num_shards);
    let staging = staging_prefix(output.key());
    let staging = staging.as_str();
    let header = options.header.as_deref();
    let suffix = options.file_name_suffix.as_str();

    let staged: Vec<String> = stream::iter(ranges.into_iter().enumerate())
        .map(|(index, range)| async move {
            let key = staged_key(staging, index, suffix);
            let body = render_shard(header, &records[range.clone()]);
            store
                .put_object(&key, Bytes::from(body), CONTENT_TYPE)
                .await?;
            debug!(key = %key, records = range.len(), "staged output shard");
            Ok::<_, CongregateError>(key)
        })
        .buffered(workers.max(1))
        .try_collect()
        .await?;

    for (staged_path, final_key) in staged.iter().zip(&final_keys) {
        store.copy_object(staged_path, final_key).await?;
        store.delete_object(staged_path).await?;
    }

    let written: Vec<String> = final_keys
        .into_iter()
        .map(|key| output.with_key(key).to_string())
        .collect();
    info!(shards = written.len(), records = records.len(), "finalized output");
    Ok(written)
}
