pub mod file_store;
pub mod snapshot;

pub use file_store::{FileEntry, FileHandle, FileStore};
