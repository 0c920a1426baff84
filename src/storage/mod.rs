//!
//! indexset storage module
//! -----------------------
//! Uniform list/get/put/delete access to index table files stored in one of two
//! layouts:
//!
//! - common: `<table>/<file>`, shared by everyone;
//! - user-based: `<table>/<userID>/<file>`, one directory per tenant.
//!
//! The `IndexSet` dispatcher checks that the tenant identifier agrees with the
//! layout the set was built for, routes the call to the matching `Client` method,
//! and strips synthetic directory entries from listings. Byte IO, caching and
//! retries belong to the `Client` implementation (see `FsObjectClient` for the
//! local filesystem one).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncSeek};

pub mod client;
pub mod dirs;
pub mod fs_client;
pub mod index_set;
mod names;

pub use client::{Client, TableListing};
pub use dirs::{clean_path, filter_out_directories, parent_dir};
pub use fs_client::FsObjectClient;
pub use index_set::{new_index_set, IndexSet, IndexSetDispatcher};

/// A named file inside an index table, as reported by a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexFile {
    /// `/`-separated path relative to the table (or the tenant directory).
    pub name: String,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}

impl IndexFile {
    pub fn new<S: Into<String>>(name: S, modified_at: DateTime<Utc>) -> Self {
        Self { name: name.into(), modified_at, size: 0 }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// Readable stream handed back by `get_file`; the caller owns and drops it.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Seekable source accepted by `put_file`. Borrowed for the duration of the call.
pub trait ReadSeek: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin + ?Sized> ReadSeek for T {}
