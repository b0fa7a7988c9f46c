use congregate_bucket::{BucketStore, ObjectLocation};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::error::{CongregateError, Result};
use crate::records::split_records;

/// One input file, split into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextShard {
    pub path: String,
    pub records: Vec<String>,
}

/// Expands `pattern`, reads every matching shard and hands it to `per_shard`.
///
/// Up to `workers` shards are in flight at once. Results come back in sorted shard order.
pub async fn read_text<T, F>(
    store: &dyn BucketStore,
    pattern: &ObjectLocation,
    workers: usize,
    per_shard: F,
) -> Result<Vec<T>>
where
    F: Fn(TextShard) -> T,
{
    let keys = store.glob(pattern.key()).await?;
    if keys.is_empty() {
        return Err(CongregateError::NoInputFiles(pattern.to_string()));
    }
    info!(pattern = %pattern, shards = keys.len(), "expanded input pattern");

    let per_shard = &per_shard;
    stream::iter(keys)
        .map(|key| async move {
            let shard = read_shard(store, pattern, &key).await?;
            Ok::<_, CongregateError>(per_shard(shard))
        })
        .buffered(workers.max(1))
        .try_collect()
        .await
}

pub async fn read_shard(
    store: &dyn BucketStore,
    location: &ObjectLocation,
    key: &str,
) -> Result<TextShard> {
    let bytes = store.get_object(key).await?;
    let path = location.with_key(key).to_string();
    let text = std::str::from_utf8(&bytes).map_err(|source| CongregateError::Encoding {
        path: path.clone(),
        source,
    })?;
    let records: Vec<String> = split_records(text).map(str::to_string).collect();
    debug!(shard = %path, bytes = bytes.len(), records = records.len(), "read shard");

    Ok(TextShard { path, records })
}
