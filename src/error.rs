/// Error kinds raised by the file store and the descriptor table.
/// At the syscall boundary every one of them collapses to the -1 sentinel.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("file not found: {0:?}")]
    NotFound(String),

    #[error("bad file descriptor: {0}")]
    BadDescriptor(i32),

    #[error("no free file descriptor (table holds {0} slots)")]
    DescriptorExhausted(usize),

    #[error("invalid byte count {count} (buffer holds {available})")]
    InvalidCount { count: i64, available: usize },

    #[error("descriptor {0} does not support this direction")]
    WrongDirection(i32),
}

pub type Result<T> = std::result::Result<T, FsError>;
