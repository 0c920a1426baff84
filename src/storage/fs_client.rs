//! Local-filesystem storage client.
//!
//! Objects live under a root folder using the same naming an object store would:
//! `<root>/<table>/<file>` for common tables and `<root>/<table>/<userID>/<file>` for
//! per-tenant files. Writes land in a staging folder first and are renamed into
//! place, so a reader never observes a half-written index file.
//!
//! Listings are cached per `(table, tenant)` until the TTL expires, the table is
//! refreshed, or a put/delete touches the table.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::StorageConfig;

use super::client::{Client, TableListing};
use super::names::{validate_object_name, validate_segment, STAGING_DIR};
use super::{FileReader, IndexFile, ReadSeek};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    table: String,
    user_id: Option<String>,
}

struct CachedListing {
    at: Instant,
    listing: TableListing,
}

/// Listings plus a per-table generation. A scan only lands in the cache if no
/// invalidation of its table happened while it ran.
#[derive(Default)]
struct ListingCache {
    entries: HashMap<CacheKey, CachedListing>,
    generations: HashMap<String, u64>,
}

impl ListingCache {
    fn generation(&self, table: &str) -> u64 {
        self.generations.get(table).copied().unwrap_or(0)
    }
}

pub struct FsObjectClient {
    root: PathBuf,
    emit_directory_entries: bool,
    list_cache_ttl: Duration,
    cache: Mutex<ListingCache>,
}

impl FsObjectClient {
    /// Create a client rooted at the given folder. The folder is created on first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let defaults = StorageConfig::default();
        Self {
            root: root.as_ref().to_path_buf(),
            emit_directory_entries: defaults.emit_directory_entries,
            list_cache_ttl: Duration::from_millis(defaults.list_cache_ttl_ms),
            cache: Mutex::new(ListingCache::default()),
        }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self::new(&cfg.root)
            .with_emit_directory_entries(cfg.emit_directory_entries)
            .with_list_cache_ttl(Duration::from_millis(cfg.list_cache_ttl_ms))
    }

    /// Report intermediate directories of per-tenant listings as files, like a
    /// hierarchical-namespace object store does.
    pub fn with_emit_directory_entries(mut self, on: bool) -> Self {
        self.emit_directory_entries = on;
        self
    }

    /// `Duration::ZERO` disables listing cache.
    pub fn with_list_cache_ttl(mut self, ttl: Duration) -> Self {
        self.list_cache_ttl = ttl;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    fn table_dir(&self, table_name: &str) -> Result<PathBuf> {
        validate_segment(table_name)?;
        Ok(self.root.join(table_name))
    }

    fn user_dir(&self, table_name: &str, user_id: &str) -> Result<PathBuf> {
        validate_segment(user_id)?;
        Ok(self.table_dir(table_name)?.join(user_id))
    }

    fn object_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
        validate_object_name(file_name)?;
        Ok(file_name.split('/').fold(dir.to_path_buf(), |p, seg| p.join(seg)))
    }

    fn cached(&self, key: &CacheKey, bypass_cache: bool) -> Option<TableListing> {
        if bypass_cache || self.list_cache_ttl.is_zero() {
            return None;
        }
        let cache = self.cache.lock();
        cache
            .entries
            .get(key)
            .filter(|c| c.at.elapsed() < self.list_cache_ttl)
            .map(|c| c.listing.clone())
    }

    /// Read before scanning; hand the value back to `remember`.
    fn table_generation(&self, table_name: &str) -> u64 {
        self.cache.lock().generation(table_name)
    }

    fn remember(&self, key: CacheKey, scanned_at_gen: u64, listing: &TableListing) {
        if self.list_cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.lock();
        if cache.generation(&key.table) != scanned_at_gen {
            debug!(target: "indexset::fs_client", "list: table='{}' changed during scan, not cached", key.table);
            return;
        }
        cache.entries.insert(key, CachedListing { at: Instant::now(), listing: listing.clone() });
    }

    fn invalidate_table(&self, table_name: &str) {
        let mut cache = self.cache.lock();
        *cache.generations.entry(table_name.to_string()).or_insert(0) += 1;
        cache.entries.retain(|k, _| k.table != table_name);
    }

    /// Objects are regular files; a directory at `path` is reported as missing.
    async fn ensure_object(path: &Path, op: &str) -> Result<()> {
        let meta = fs::metadata(path)
            .await
            .with_context(|| format!("{} object '{}'", op, path.display()))?;
        if !meta.is_file() {
            return Err(anyhow::Error::new(std::io::Error::from(ErrorKind::NotFound))
                .context(format!("{} object '{}': not a file", op, path.display())));
        }
        Ok(())
    }

    async fn read_object(&self, path: PathBuf) -> Result<FileReader> {
        Self::ensure_object(&path, "open").await?;
        let f = fs::File::open(&path)
            .await
            .with_context(|| format!("open object '{}'", path.display()))?;
        Ok(Box::new(f))
    }

    async fn write_object(&self, table_name: &str, target: PathBuf, file: &mut dyn ReadSeek) -> Result<()> {
        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await?;

        // The temp path removes its file when dropped, so an error or a cancelled
        // put leaves nothing behind in staging.
        let res = async {
            let (std_file, tmp) = tempfile::Builder::new().prefix("put-").tempfile_in(&staging)?.into_parts();
            let mut out = fs::File::from_std(std_file);
            let written = tokio::io::copy(file, &mut out).await?;
            out.flush().await?;
            out.sync_all().await?;
            drop(out);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            tmp.persist(&target)?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        match res {
            Ok(written) => {
                debug!(target: "indexset::fs_client", "put: '{}' bytes={}", target.display(), written);
                self.invalidate_table(table_name);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context(format!("write object '{}'", target.display()))),
        }
    }

    /// Remove the object, then any directories it leaves empty up to (not including) `stop`.
    async fn remove_object(&self, table_name: &str, path: PathBuf, stop: &Path) -> Result<()> {
        Self::ensure_object(&path, "delete").await?;
        fs::remove_file(&path)
            .await
            .with_context(|| format!("delete object '{}'", path.display()))?;
        let mut dir = path.parent().map(Path::to_path_buf);
        while let Some(d) = dir {
            if d.as_path() == stop || !d.starts_with(stop) {
                break;
            }
            if fs::remove_dir(&d).await.is_err() {
                break;
            }
            dir = d.parent().map(Path::to_path_buf);
        }
        debug!(target: "indexset::fs_client", "delete: '{}'", path.display());
        self.invalidate_table(table_name);
        Ok(())
    }
}

fn modified_at(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified().map(DateTime::<Utc>::from).unwrap_or_default()
}

/// One level under the table: files are index files, directories are tenants.
fn scan_table(dir: &Path) -> Result<TableListing> {
    let mut listing = TableListing::default();
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(listing),
        Err(e) => return Err(anyhow::Error::new(e).context(format!("list table '{}'", dir.display()))),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = entry.metadata()?;
        if meta.is_dir() {
            listing.user_ids.push(name);
        } else if meta.is_file() {
            listing.files.push(IndexFile::new(name, modified_at(&meta)).with_size(meta.len()));
        }
    }
    listing.files.sort_by(|a, b| a.name.cmp(&b.name));
    listing.user_ids.sort();
    Ok(listing)
}

/// Everything under the tenant directory, named relative to it with '/' separators.
fn scan_user(dir: &Path, emit_directory_entries: bool) -> Result<Vec<IndexFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("list tenant dir '{}'", dir.display()))?;
        let is_dir = entry.file_type().is_dir();
        if is_dir && !emit_directory_entries {
            continue;
        }
        let rel = entry.path().strip_prefix(dir)?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let meta = entry.metadata()?;
        let size = if is_dir { 0 } else { meta.len() };
        files.push(IndexFile::new(name, modified_at(&meta)).with_size(size));
    }
    Ok(files)
}

#[async_trait]
impl Client for FsObjectClient {
    async fn refresh_index_table_cache(&self, table_name: &str) {
        debug!(target: "indexset::fs_client", "refresh: table='{}'", table_name);
        self.invalidate_table(table_name);
    }

    async fn list_files(&self, table_name: &str, bypass_cache: bool) -> Result<TableListing> {
        let dir = self.table_dir(table_name)?;
        let key = CacheKey { table: table_name.to_string(), user_id: None };
        if let Some(hit) = self.cached(&key, bypass_cache) {
            debug!(target: "indexset::fs_client", "list: cache hit table='{}'", table_name);
            return Ok(hit);
        }
        let gen = self.table_generation(table_name);
        let listing = tokio::task::spawn_blocking(move || scan_table(&dir)).await??;
        debug!(
            target: "indexset::fs_client",
            "list: table='{}' files={} users={} bypass_cache={}",
            table_name, listing.files.len(), listing.user_ids.len(), bypass_cache
        );
        self.remember(key, gen, &listing);
        Ok(listing)
    }

    async fn list_user_files(&self, table_name: &str, user_id: &str, bypass_cache: bool) -> Result<Vec<IndexFile>> {
        let dir = self.user_dir(table_name, user_id)?;
        let key = CacheKey { table: table_name.to_string(), user_id: Some(user_id.to_string()) };
        if let Some(hit) = self.cached(&key, bypass_cache) {
            debug!(target: "indexset::fs_client", "list: cache hit table='{}' user='{}'", table_name, user_id);
            return Ok(hit.files);
        }
        let emit = self.emit_directory_entries;
        let gen = self.table_generation(table_name);
        let files = tokio::task::spawn_blocking(move || scan_user(&dir, emit)).await??;
        debug!(
            target: "indexset::fs_client",
            "list: table='{}' user='{}' entries={} bypass_cache={}",
            table_name, user_id, files.len(), bypass_cache
        );
        let listing = TableListing { files, user_ids: Vec::new() };
        self.remember(key, gen, &listing);
        Ok(listing.files)
    }

    async fn get_file(&self, table_name: &str, file_name: &str) -> Result<FileReader> {
        let path = Self::object_path(&self.table_dir(table_name)?, file_name)?;
        self.read_object(path).await
    }

    async fn get_user_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<FileReader> {
        let path = Self::object_path(&self.user_dir(table_name, user_id)?, file_name)?;
        self.read_object(path).await
    }

    async fn put_file(&self, table_name: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()> {
        let path = Self::object_path(&self.table_dir(table_name)?, file_name)?;
        self.write_object(table_name, path, file).await
    }

    async fn put_user_file(&self, table_name: &str, user_id: &str, file_name: &str, file: &mut dyn ReadSeek) -> Result<()> {
        let path = Self::object_path(&self.user_dir(table_name, user_id)?, file_name)?;
        self.write_object(table_name, path, file).await
    }

    async fn delete_file(&self, table_name: &str, file_name: &str) -> Result<()> {
        let table_dir = self.table_dir(table_name)?;
        let path = Self::object_path(&table_dir, file_name)?;
        self.remove_object(table_name, path, &table_dir).await
    }

    async fn delete_user_file(&self, table_name: &str, user_id: &str, file_name: &str) -> Result<()> {
        let table_dir = self.table_dir(table_name)?;
        let path = Self::object_path(&self.user_dir(table_name, user_id)?, file_name)?;
        self.remove_object(table_name, path, &table_dir).await
    }

    fn is_file_not_found_err(&self, err: &anyhow::Error) -> bool {
        err.chain()
            .filter_map(|e| e.downcast_ref::<std::io::Error>())
            .any(|io| io.kind() == ErrorKind::NotFound)
    }
}

#[cfg(test)]
#[path = "fs_client_tests.rs"]
mod fs_client_tests;
