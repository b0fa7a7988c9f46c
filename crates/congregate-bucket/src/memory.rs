use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BucketError, BucketStore};

/// In-process store. Behaves like a flat object namespace, so it exercises the same globbing
/// path as the remote stores.
#[derive(Debug, Default)]
pub struct MemoryBucketStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        self.lock().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| BucketError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> Result<(), BucketError> {
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BucketError::NotFound(key.to_string()))
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<(), BucketError> {
        let mut objects = self.lock();
        let bytes = objects
            .get(from)
            .cloned()
            .ok_or_else(|| BucketError::NotFound(from.to_string()))?;
        objects.insert(to.to_string(), bytes);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BucketError> {
        Ok(self
            .lock()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
