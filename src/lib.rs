pub mod config;
pub mod error;
pub mod logger;
pub mod process;
pub mod store;

pub use config::{FsConfig, GLOBAL_FS_CONFIG};
pub use error::{FsError, Result};
pub use process::{DescriptorTable, UserProcess};
pub use store::FileStore;

#[macro_use]
extern crate lazy_static;
