//! Async twins of the store operations.
//!
//! Each method runs the synchronous body on the store's [`Executor`] and
//! awaits it. Semantics are identical to the blocking versions.

use super::Store;
use crate::codec::{Data, Kind, StoreData};
use crate::error::Result;
use std::time::Duration;

impl Store {
    /// Async [`read`](Self::read).
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), plus [`Error::Join`](crate::Error::Join)
    /// if the task panics.
    pub async fn read_async<T>(&self, key: &str, ttl_enabled: Option<bool>) -> Result<Option<T>>
    where
        T: StoreData + Send + 'static,
    {
        let store = self.clone();
        let key = key.to_string();
        self.executor()
            .run(move || store.read::<T>(&key, ttl_enabled))
            .await?
    }

    /// Async [`read_or`](Self::read_or).
    ///
    /// # Errors
    ///
    /// Same as [`read_or`](Self::read_or).
    pub async fn read_or_async<T>(&self, key: &str, default: T, ttl_enabled: Option<bool>) -> Result<T>
    where
        T: StoreData + Send + 'static,
    {
        let store = self.clone();
        let key = key.to_string();
        self.executor()
            .run(move || store.read_or(&key, default, ttl_enabled))
            .await?
    }

    /// Async [`get_data_by_kind`](Self::get_data_by_kind).
    ///
    /// # Errors
    ///
    /// Same as [`get_data_by_kind`](Self::get_data_by_kind).
    pub async fn get_data_by_kind_async(
        &self,
        key: &str,
        kind: Kind,
        ttl_enabled: Option<bool>,
    ) -> Result<Option<Data>> {
        let store = self.clone();
        let key = key.to_string();
        self.executor()
            .run(move || store.get_data_by_kind(&key, kind, ttl_enabled))
            .await?
    }

    /// Async [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn save_async<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<bool>
    where
        T: StoreData + Send + 'static,
    {
        let store = self.clone();
        let key = key.to_string();
        self.executor()
            .run(move || store.save(&key, value, ttl))
            .await?
    }

    /// Async [`save_data`](Self::save_data).
    ///
    /// # Errors
    ///
    /// Same as [`save_data`](Self::save_data).
    pub async fn save_data_async(&self, key: &str, data: Data, ttl: Option<Duration>) -> Result<bool> {
        let store = self.clone();
        let key = key.to_string();
        self.executor()
            .run(move || store.save_data(&key, data, ttl))
            .await?
    }

    /// Async [`contains_key`](Self::contains_key).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`](crate::Error::Join) if the task panics.
    pub async fn contains_key_async(&self, key: &str) -> Result<bool> {
        let store = self.clone();
        let key = key.to_string();
        Ok(self.executor().run(move || store.contains_key(&key)).await?)
    }

    /// Async [`is_alive`](Self::is_alive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`](crate::Error::Join) if the task panics.
    pub async fn is_alive_async(&self, key: &str, ttl_enabled: Option<bool>) -> Result<bool> {
        let store = self.clone();
        let key = key.to_string();
        Ok(self
            .executor()
            .run(move || store.is_alive(&key, ttl_enabled))
            .await?)
    }

    /// Async [`remove`](Self::remove).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`](crate::Error::Join) if the task panics.
    pub async fn remove_async<I, K>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let store = self.clone();
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Ok(self
            .executor()
            .run(move || {
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                store.remove(&keys)
            })
            .await?)
    }

    /// Async [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`](crate::Error::Join) if the task panics.
    pub async fn clear_async(&self) -> Result<bool> {
        let store = self.clone();
        Ok(self.executor().run(move || store.clear()).await?)
    }
}
