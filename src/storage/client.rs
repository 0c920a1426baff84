use anyhow::Result;
use async_trait::async_trait;

use super::{FileReader, IndexFile, ReadSeek};

/// Result of listing a table in the common layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableListing {
    /// Files stored directly under the table.
    pub files: Vec<IndexFile>,
    /// Tenant directories found under the table.
    pub user_ids: Vec<String>,
}

/// Storage operations an index set routes to. Every capability comes in a shared
/// flavour and a per-tenant (`*_user_*`) flavour that differ only in scoping.
///
/// Implementations own retries, caching and "not found" classification.
#[async_trait]
pub trait Client: Send + Sync {
    /// Drop any cached listing for the table. Best effort.
    async fn refresh_index_table_cache(&self, table_name: &str);

    async fn list_files(&self, table_name: &str, bypass_cache: bool) -> Result<TableListing>;
    async fn list_user_files(&self, table_name: &str, user_id: &str, bypass_cache: bool) -> Result<Vec<IndexFile>>;

    async fn get_file(&self, table_name: &str, file_name: &str) -> Result<FileReader>;
    async fn get_user_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<FileReader>;

    async fn put_file(&self, table_name: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()>;
    async fn put_user_file(&self, table_name: &str, user_id: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()>;

    async fn delete_file(&self, table_name: &str, file_name: &str) -> Result<()>;
    async fn delete_user_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<()>;

    fn is_file_not_found_err(&self, err: &anyhow::Error) -> bool;
}
