use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Durable string key-value store backing the session
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<S: Storage + ?Sized> Storage for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
}
