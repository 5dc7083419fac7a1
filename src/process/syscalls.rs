//! Syscall-style surface over a process's descriptor table.
//!
//! Every call returns an `i32`: a descriptor, a byte count or 0 on success, -1 on failure.
//! Failures are logged at debug level with their cause and never abort the caller.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::console::Console;
use super::descriptor_table::DescriptorTable;
use crate::config::FsConfig;
use crate::error::{FsError, Result};
use crate::store::FileStore;

/// Syscall numbers of the file subset of the user ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Syscall {
    Creat = 4,
    Open = 5,
    Read = 6,
    Write = 7,
    Close = 8,
    Unlink = 9,
}

impl TryFrom<i32> for Syscall {
    type Error = i32;

    fn try_from(number: i32) -> std::result::Result<Self, Self::Error> {
        match number {
            4 => Ok(Syscall::Creat),
            5 => Ok(Syscall::Open),
            6 => Ok(Syscall::Read),
            7 => Ok(Syscall::Write),
            8 => Ok(Syscall::Close),
            9 => Ok(Syscall::Unlink),
            other => Err(other),
        }
    }
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Syscall::Creat => "creat",
            Syscall::Open => "open",
            Syscall::Read => "read",
            Syscall::Write => "write",
            Syscall::Close => "close",
            Syscall::Unlink => "unlink",
        };
        f.write_str(name)
    }
}

/// Arguments of one call, already decoded from the caller's address space.
#[derive(Debug)]
pub enum SyscallRequest<'a> {
    Creat { name: &'a str },
    Open { name: &'a str },
    Read { fd: i32, buffer: &'a mut [u8], count: i32 },
    Write { fd: i32, buffer: &'a [u8], count: i32 },
    Close { fd: i32 },
    Unlink { name: &'a str },
}

impl SyscallRequest<'_> {
    pub fn syscall(&self) -> Syscall {
        match self {
            SyscallRequest::Creat { .. } => Syscall::Creat,
            SyscallRequest::Open { .. } => Syscall::Open,
            SyscallRequest::Read { .. } => Syscall::Read,
            SyscallRequest::Write { .. } => Syscall::Write,
            SyscallRequest::Close { .. } => Syscall::Close,
            SyscallRequest::Unlink { .. } => Syscall::Unlink,
        }
    }
}

/// The file-related state of one user process.
#[derive(Debug)]
pub struct UserProcess {
    fds: DescriptorTable,
}

impl UserProcess {
    pub fn new(store: Arc<FileStore>, console: Box<dyn Console>) -> Self {
        UserProcess {
            fds: DescriptorTable::new(store, console),
        }
    }

    pub fn with_config(store: Arc<FileStore>, console: Box<dyn Console>, config: &FsConfig) -> Self {
        UserProcess {
            fds: DescriptorTable::with_config(store, console, config),
        }
    }

    pub fn descriptors(&self) -> &DescriptorTable {
        &self.fds
    }

    pub fn handle_syscall(&mut self, request: SyscallRequest<'_>) -> i32 {
        match request {
            SyscallRequest::Creat { name } => self.creat(name),
            SyscallRequest::Open { name } => self.open(name),
            SyscallRequest::Read { fd, buffer, count } => self.read(fd, buffer, count),
            SyscallRequest::Write { fd, buffer, count } => self.write(fd, buffer, count),
            SyscallRequest::Close { fd } => self.close(fd),
            SyscallRequest::Unlink { name } => self.unlink(name),
        }
    }

    pub fn creat(&mut self, name: &str) -> i32 {
        let result = self.fds.creat(name);
        finish(Syscall::Creat, result)
    }

    pub fn open(&mut self, name: &str) -> i32 {
        let result = self.fds.open(name);
        finish(Syscall::Open, result)
    }

    pub fn close(&mut self, fd: i32) -> i32 {
        let result = self.fds.close(fd).map(|()| 0);
        finish(Syscall::Close, result)
    }

    pub fn unlink(&mut self, name: &str) -> i32 {
        let result = self.fds.unlink(name).map(|()| 0);
        finish(Syscall::Unlink, result)
    }

    /// Reads up to `count` bytes into the front of `buffer`.
    pub fn read(&mut self, fd: i32, buffer: &mut [u8], count: i32) -> i32 {
        let result = checked_count(count, buffer.len())
            .and_then(|count| self.fds.read(fd, &mut buffer[..count]))
            .map(byte_count);
        finish(Syscall::Read, result)
    }

    /// Writes the first `count` bytes of `buffer`; a buffer shorter than `count` fails.
    pub fn write(&mut self, fd: i32, buffer: &[u8], count: i32) -> i32 {
        let result = checked_count(count, buffer.len())
            .and_then(|count| self.fds.write(fd, &buffer[..count]))
            .map(byte_count);
        finish(Syscall::Write, result)
    }
}

impl Drop for UserProcess {
    fn drop(&mut self) {
        self.fds.close_all();
    }
}

fn checked_count(count: i32, available: usize) -> Result<usize> {
    usize::try_from(count)
        .ok()
        .filter(|&count| count <= available)
        .ok_or(FsError::InvalidCount {
            count: i64::from(count),
            available,
        })
}

// counts are bounded by an i32 request, so they fit back into one
fn byte_count(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn finish(syscall: Syscall, result: Result<i32>) -> i32 {
    match result {
        Ok(value) => value,
        Err(error) => {
            debug!("{} failed: {}", syscall, error);
            -1
        }
    }
}
