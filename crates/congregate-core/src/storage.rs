use std::sync::Arc;

use async_trait::async_trait;
use congregate_bucket::{
    BucketError, BucketStore, LocalBucketStore, ObjectLocation, S3BucketStore, S3Config, Scheme,
};

use crate::error::Result;

/// Picks the store serving a location.
#[async_trait]
pub trait StoreResolver: Send + Sync {
    async fn store_for(&self, location: &ObjectLocation) -> Result<Arc<dyn BucketStore>>;
}

/// Local paths go to disk; `s3://` and `gs://` buckets get an S3 client configured from the
/// `S3_*` environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStores;

#[async_trait]
impl StoreResolver for DefaultStores {
    async fn store_for(&self, location: &ObjectLocation) -> Result<Arc<dyn BucketStore>> {
        match (location.scheme(), location.bucket()) {
            (Scheme::Local, _) => Ok(Arc::new(LocalBucketStore::new())),
            (scheme, Some(bucket)) => {
                let config = S3Config::for_bucket(scheme, bucket).with_env();
                Ok(Arc::new(S3BucketStore::new(config).await?))
            }
            (_, None) => Err(BucketError::Configuration(format!(
                "no bucket in '{location}'"
            ))
            .into()),
        }
    }
}

/// Serves every location from one store.
#[derive(Clone)]
pub struct SharedStore(pub Arc<dyn BucketStore>);

#[async_trait]
impl StoreResolver for SharedStore {
    async fn store_for(&self, _location: &ObjectLocation) -> Result<Arc<dyn BucketStore>> {
        Ok(Arc::clone(&self.0))
    }
}
