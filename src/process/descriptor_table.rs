//! Per-process descriptor table.
//!
//! Slots 0 and 1 are bound to the console when the table is built and never change.
//! Every other slot is either free or holds an [`OpenFile`]: a cursor plus a shared
//! handle on the file's bytes, so a descriptor keeps working after its name is
//! unlinked or recreated.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::console::Console;
use crate::config::{current_config, FsConfig};
use crate::error::{FsError, Result};
use crate::store::file_store::is_blank;
use crate::store::{FileHandle, FileStore};

pub const STDIN_FD: i32 = 0;
pub const STDOUT_FD: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardStream {
    Input,
    Output,
}

/// A descriptor's binding to a file and its current position within it.
#[derive(Debug)]
pub struct OpenFile {
    file: FileHandle,
    position: usize,
}

impl OpenFile {
    fn new(file: FileHandle) -> Self {
        OpenFile { file, position: 0 }
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug)]
pub enum Slot {
    Free,
    Standard(StandardStream),
    Open(OpenFile),
}

pub struct DescriptorTable {
    store: Arc<FileStore>,
    console: Box<dyn Console>,
    slots: Vec<Slot>,
    max_name_len: usize,
}

impl DescriptorTable {
    /// Builds a table sized from the process-wide config.
    pub fn new(store: Arc<FileStore>, console: Box<dyn Console>) -> Self {
        Self::with_config(store, console, &current_config())
    }

    pub fn with_config(store: Arc<FileStore>, console: Box<dyn Console>, config: &FsConfig) -> Self {
        let mut slots = Vec::with_capacity(config.max_fds);
        slots.push(Slot::Standard(StandardStream::Input));
        slots.push(Slot::Standard(StandardStream::Output));
        slots.resize_with(std::cmp::max(config.max_fds, 2), || Slot::Free);
        DescriptorTable {
            store,
            console,
            slots,
            max_name_len: config.max_name_len,
        }
    }

    pub fn store(&self) -> &Arc<FileStore> {
        &self.store
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Creates (or truncates) `name` and binds it to the lowest free descriptor.
    pub fn creat(&mut self, name: &str) -> Result<i32> {
        self.check_name(name)?;
        let index = self.free_slot()?;
        let file = self.store.create(name)?;
        Ok(self.install(index, file))
    }

    /// Binds the current file named `name` to the lowest free descriptor, positioned at 0.
    pub fn open(&mut self, name: &str) -> Result<i32> {
        self.check_name(name)?;
        let index = self.free_slot()?;
        let file = self.store.lookup(name)?;
        Ok(self.install(index, file))
    }

    /// Frees a descriptor. The standard descriptors accept close as a no-op.
    pub fn close(&mut self, fd: i32) -> Result<()> {
        let index = self.index_of(fd)?;
        match self.slots[index] {
            Slot::Standard(_) => Ok(()),
            Slot::Free => Err(FsError::BadDescriptor(fd)),
            Slot::Open(_) => {
                self.slots[index] = Slot::Free;
                debug!("fd {} closed", fd);
                Ok(())
            }
        }
    }

    /// Removes `name` from the store. Descriptors open on it are left untouched.
    pub fn unlink(&mut self, name: &str) -> Result<()> {
        if is_blank(name) {
            return Err(FsError::NotFound(name.to_string()));
        }
        self.store.unlink(name)
    }

    /// Reads up to `buffer.len()` bytes at the cursor. End of file yields 0, not an error.
    pub fn read(&mut self, fd: i32, buffer: &mut [u8]) -> Result<usize> {
        let index = self.index_of(fd)?;
        match &mut self.slots[index] {
            Slot::Free => Err(FsError::BadDescriptor(fd)),
            Slot::Standard(StandardStream::Input) => Ok(self.console.read(buffer)),
            Slot::Standard(StandardStream::Output) => Err(FsError::WrongDirection(fd)),
            Slot::Open(open_file) => {
                let count = open_file.file.read_at(open_file.position, buffer);
                open_file.position += count;
                Ok(count)
            }
        }
    }

    /// Writes all of `data` at the cursor, growing the file as needed.
    pub fn write(&mut self, fd: i32, data: &[u8]) -> Result<usize> {
        let index = self.index_of(fd)?;
        match &mut self.slots[index] {
            Slot::Free => Err(FsError::BadDescriptor(fd)),
            Slot::Standard(StandardStream::Output) => Ok(self.console.write(data)),
            Slot::Standard(StandardStream::Input) => Err(FsError::WrongDirection(fd)),
            Slot::Open(open_file) => {
                let count = open_file.file.write_at(open_file.position, data);
                open_file.position += count;
                Ok(count)
            }
        }
    }

    pub fn seek(&mut self, fd: i32, position: usize) -> Result<()> {
        let index = self.index_of(fd)?;
        match &mut self.slots[index] {
            Slot::Open(open_file) => {
                let available = open_file.file.len();
                if position > available {
                    return Err(FsError::InvalidCount {
                        count: position as i64,
                        available,
                    });
                }
                open_file.position = position;
                Ok(())
            }
            _ => Err(FsError::BadDescriptor(fd)),
        }
    }

    /// Frees every user descriptor, as on process exit.
    pub fn close_all(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Slot::Open(_) = slot {
                *slot = Slot::Free;
            }
        }
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot, Slot::Open(_))).count()
    }

    pub fn slot(&self, fd: i32) -> Option<&Slot> {
        self.index_of(fd).ok().map(|index| &self.slots[index])
    }

    pub fn is_open(&self, fd: i32) -> bool {
        matches!(self.slot(fd), Some(Slot::Open(_)) | Some(Slot::Standard(_)))
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if is_blank(name) || name.len() > self.max_name_len {
            return Err(FsError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn index_of(&self, fd: i32) -> Result<usize> {
        usize::try_from(fd)
            .ok()
            .filter(|&index| index < self.slots.len())
            .ok_or(FsError::BadDescriptor(fd))
    }

    fn free_slot(&self) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Slot::Free))
            .ok_or(FsError::DescriptorExhausted(self.slots.len()))
    }

    fn install(&mut self, index: usize, file: FileHandle) -> i32 {
        debug!("fd {} bound to {:?}", index, file.name());
        self.slots[index] = Slot::Open(OpenFile::new(file));
        // slot count comes from config and stays far below i32::MAX
        index as i32
    }
}

impl fmt::Debug for DescriptorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorTable")
            .field("slots", &self.slots)
            .field("max_name_len", &self.max_name_len)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DescriptorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Descriptor table ({} slots):", self.slots.len())?;
        for (fd, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Free => {}
                Slot::Standard(StandardStream::Input) => writeln!(f, "  {}: stdin", fd)?,
                Slot::Standard(StandardStream::Output) => writeln!(f, "  {}: stdout", fd)?,
                Slot::Open(open_file) => writeln!(
                    f,
                    "  {}: {:?} at {}/{}",
                    fd,
                    open_file.file.name(),
                    open_file.position,
                    open_file.file.len()
                )?,
            }
        }
        Ok(())
    }
}
