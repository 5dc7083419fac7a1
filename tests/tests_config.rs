use std::sync::Arc;

use userfs::config::{current_config, install_config};
use userfs::process::{BufferConsole, UserProcess};
use userfs::{FileStore, FsConfig};

#[cfg(test)]
mod tests {
    use super::*;

    // the only test in this binary, so nothing else observes the global config change
    #[test]
    fn test_process_uses_global_config() {
        assert_eq!(current_config(), FsConfig::default());
        assert!(install_config(FsConfig::new(2, 8)).is_err());
        install_config(FsConfig::new(3, 8)).unwrap();

        let mut process = UserProcess::new(Arc::new(FileStore::new()), Box::new(BufferConsole::new()));
        assert_eq!(process.descriptors().capacity(), 3);
        assert_eq!(process.creat("eight888"), 2);
        assert_eq!(process.creat("nine99999"), -1);
        assert_eq!(process.open("eight888"), -1);
    }
}
