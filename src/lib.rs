pub mod config;
pub mod error;
pub mod storage;

pub use config::{StorageConfig, StorageOverrides};
pub use error::IndexSetError;
pub use storage::{
    filter_out_directories, new_index_set, Client, FileReader, FsObjectClient, IndexFile, IndexSet,
    IndexSetDispatcher, ReadSeek, TableListing,
};
