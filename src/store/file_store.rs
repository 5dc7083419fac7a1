use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::debug;

use crate::error::{FsError, Result};

/// Shared handle on a named file. Descriptors clone it so the bytes outlive an unlink of the name.
pub type FileHandle = Arc<FileEntry>;

// A named file: its name at creation time and its bytes behind their own lock.
#[derive(Debug)]
pub struct FileEntry {
    name: String,
    data: Mutex<Vec<u8>>,
}

impl FileEntry {
    fn new(name: &str, data: Vec<u8>) -> Self {
        FileEntry {
            name: name.to_string(),
            data: Mutex::new(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.lock_data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Copy of the current bytes.
    pub fn contents(&self) -> Vec<u8> {
        self.lock_data().clone()
    }

    // Copies bytes starting at `offset` into `buffer` and returns how many were copied.
    pub fn read_at(&self, offset: usize, buffer: &mut [u8]) -> usize {
        let data = self.lock_data();
        let start = std::cmp::min(offset, data.len());
        let end = std::cmp::min(data.len(), start + buffer.len());
        let count = end - start;
        buffer[..count].copy_from_slice(&data[start..end]);
        count
    }

    // Overwrites bytes from `offset`, growing the file when the write runs past its end.
    pub fn write_at(&self, offset: usize, bytes: &[u8]) -> usize {
        let mut data = self.lock_data();
        if offset > data.len() {
            data.resize(offset, 0);
        }
        let overwrite_end = std::cmp::min(data.len(), offset + bytes.len());
        data.splice(offset..overwrite_end, bytes.iter().cloned());
        bytes.len()
    }

    fn lock_data(&self) -> MutexGuard<'_, Vec<u8>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// A name made only of whitespace counts as empty.
pub fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// Flat name-to-file index shared by every process.
#[derive(Debug, Default)]
pub struct FileStore {
    files: RwLock<BTreeMap<String, FileHandle>>,
}

impl FileStore {
    pub fn new() -> Self {
        FileStore {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    // Creates an empty file under `name`. An existing file of that name is replaced by a fresh
    // empty one; descriptors still holding the old entry keep its bytes.
    pub fn create(&self, name: &str) -> Result<FileHandle> {
        self.insert(name, Vec::new())
    }

    pub(crate) fn insert(&self, name: &str, data: Vec<u8>) -> Result<FileHandle> {
        if is_blank(name) {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let file = Arc::new(FileEntry::new(name, data));
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        if files.insert(name.to_string(), Arc::clone(&file)).is_some() {
            debug!("create {:?}: truncated existing file", name);
        } else {
            debug!("create {:?}: new file", name);
        }
        Ok(file)
    }

    pub fn lookup(&self, name: &str) -> Result<FileHandle> {
        if is_blank(name) {
            return Err(FsError::NotFound(name.to_string()));
        }
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    // Removes the name binding only. Open handles keep working on their own reference.
    pub fn unlink(&self, name: &str) -> Result<()> {
        if is_blank(name) {
            return Err(FsError::NotFound(name.to_string()));
        }
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        match files.remove(name) {
            Some(file) => {
                debug!("unlink {:?}: {} handle(s) still attached", name, Arc::strong_count(&file) - 1);
                Ok(())
            }
            None => Err(FsError::NotFound(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    // Names currently bound, in sorted order.
    pub fn list(&self) -> Vec<String> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn entries(&self) -> Vec<FileHandle> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.values().map(Arc::clone).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let store = FileStore::new();
        let created = store.create("readme.txt").unwrap();
        let found = store.lookup("readme.txt").unwrap();
        assert!(Arc::ptr_eq(&created, &found));
        assert_eq!(found.name(), "readme.txt");
        assert!(found.is_empty());
    }

    #[test]
    fn test_blank_names() {
        let store = FileStore::new();
        assert!(matches!(store.create(""), Err(FsError::InvalidName(_))));
        assert!(matches!(store.create("   "), Err(FsError::InvalidName(_))));
        assert!(matches!(store.lookup(""), Err(FsError::NotFound(_))));
        assert!(matches!(store.unlink(""), Err(FsError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_at_overwrites_and_extends() {
        let store = FileStore::new();
        let file = store.create("log.txt").unwrap();
        assert_eq!(file.write_at(0, b"Hello"), 5);
        assert_eq!(file.write_at(5, b", world!"), 8);
        assert_eq!(file.write_at(0, b"J"), 1);
        assert_eq!(file.contents(), b"Jello, world!");
    }

    #[test]
    fn test_read_at_short_and_past_end() {
        let store = FileStore::new();
        let file = store.create("short.txt").unwrap();
        file.write_at(0, b"abc");
        let mut buffer = [0u8; 8];
        assert_eq!(file.read_at(1, &mut buffer), 2);
        assert_eq!(&buffer[..2], b"bc");
        assert_eq!(file.read_at(3, &mut buffer), 0);
        assert_eq!(file.read_at(10, &mut buffer), 0);
    }

    #[test]
    fn test_unlink_detaches_handle() {
        let store = FileStore::new();
        let file = store.create("delete_me.txt").unwrap();
        file.write_at(0, &[1, 2, 3]);
        assert!(store.unlink("delete_me.txt").is_ok());
        assert!(store.lookup("delete_me.txt").is_err());
        assert!(store.unlink("delete_me.txt").is_err());
        assert_eq!(file.contents(), vec![1, 2, 3]);
    }

    #[test]
    fn test_recreate_truncates_without_touching_old_handle() {
        let store = FileStore::new();
        let old = store.create("data").unwrap();
        old.write_at(0, b"old bytes");
        let fresh = store.create("data").unwrap();
        assert!(fresh.is_empty());
        assert_eq!(old.contents(), b"old bytes");
        assert!(Arc::ptr_eq(&fresh, &store.lookup("data").unwrap()));
    }

    #[test]
    fn test_list_is_sorted() {
        let store = FileStore::new();
        store.create("b").unwrap();
        store.create("a").unwrap();
        store.create("c").unwrap();
        assert_eq!(store.list(), vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
        assert!(store.contains("b"));
    }
}
