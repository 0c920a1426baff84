use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::IndexSetError;

use super::client::Client;
use super::dirs::filter_out_directories;
use super::{FileReader, IndexFile, ReadSeek};

/// Storage operations for user-based or common index tables.
#[async_trait]
pub trait IndexSet: Send + Sync {
    async fn refresh_index_table_cache(&self, table_name: &str);
    async fn list_files(&self, table_name: &str, user_id: &str, bypass_cache: bool) -> Result<Vec<IndexFile>>;
    async fn get_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<FileReader>;
    async fn put_file(&self, table_name: &str, user_id: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()>;
    async fn delete_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<()>;
    fn is_file_not_found_err(&self, err: &anyhow::Error) -> bool;
    fn is_user_based_index_set(&self) -> bool;
}

/// Routes every call to the per-tenant or the shared family of `Client` methods,
/// depending on the mode fixed at construction.
#[derive(Clone)]
pub struct IndexSetDispatcher {
    client: Arc<dyn Client>,
    user_based_index: bool,
}

/// Build an index set over `client`. The mode cannot change afterwards.
pub fn new_index_set(client: Arc<dyn Client>, user_based_index: bool) -> IndexSetDispatcher {
    IndexSetDispatcher::new(client, user_based_index)
}

impl IndexSetDispatcher {
    pub fn new(client: Arc<dyn Client>, user_based_index: bool) -> Self {
        Self { client, user_based_index }
    }

    /// Tenant presence must match the mode. Runs before anything reaches the client.
    fn validate_user_id(&self, user_id: &str) -> Result<(), IndexSetError> {
        let res = if self.user_based_index && user_id.is_empty() {
            Err(IndexSetError::UserIdMustNotBeEmpty)
        } else if !self.user_based_index && !user_id.is_empty() {
            Err(IndexSetError::UserIdMustBeEmpty)
        } else {
            Ok(())
        };
        if let Err(ref e) = res {
            warn!(target: "indexset::storage", "rejected call: {} (user_based={} user_id='{}')", e, self.user_based_index, user_id);
        }
        res
    }
}

#[async_trait]
impl IndexSet for IndexSetDispatcher {
    async fn refresh_index_table_cache(&self, table_name: &str) {
        debug!(target: "indexset::storage", "refresh_index_table_cache: table='{}'", table_name);
        self.client.refresh_index_table_cache(table_name).await;
    }

    async fn list_files(&self, table_name: &str, user_id: &str, bypass_cache: bool) -> Result<Vec<IndexFile>> {
        self.validate_user_id(user_id)?;

        let files = if self.user_based_index {
            self.client.list_user_files(table_name, user_id, bypass_cache).await?
        } else {
            // tenant directories under a common table are not part of the result
            self.client.list_files(table_name, bypass_cache).await?.files
        };

        let listed = files.len();
        let files = filter_out_directories(files);
        debug!(
            target: "indexset::storage",
            "list_files: table='{}' user_id='{}' bypass_cache={} listed={} kept={}",
            table_name, user_id, bypass_cache, listed, files.len()
        );
        Ok(files)
    }

    async fn get_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<FileReader> {
        self.validate_user_id(user_id)?;
        debug!(target: "indexset::storage", "get_file: table='{}' user_id='{}' file='{}'", table_name, user_id, file_name);

        if self.user_based_index {
            return self.client.get_user_file(table_name, user_id, file_name).await;
        }
        self.client.get_file(table_name, file_name).await
    }

    async fn put_file(&self, table_name: &str, user_id: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()> {
        self.validate_user_id(user_id)?;
        debug!(target: "indexset::storage", "put_file: table='{}' user_id='{}' file='{}'", table_name, user_id, file_name);

        if self.user_based_index {
            return self.client.put_user_file(table_name, user_id, file_name, file).await;
        }
        self.client.put_file(table_name, file_name, file).await
    }

    async fn delete_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<()> {
        self.validate_user_id(user_id)?;
        debug!(target: "indexset::storage", "delete_file: table='{}' user_id='{}' file='{}'", table_name, user_id, file_name);

        if self.user_based_index {
            return self.client.delete_user_file(table_name, user_id, file_name).await;
        }
        self.client.delete_file(table_name, file_name).await
    }

    fn is_file_not_found_err(&self, err: &anyhow::Error) -> bool {
        self.client.is_file_not_found_err(err)
    }

    fn is_user_based_index_set(&self) -> bool {
        self.user_based_index
    }
}

#[cfg(test)]
#[path = "index_set_tests.rs"]
mod index_set_tests;
