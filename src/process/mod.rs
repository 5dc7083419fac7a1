pub mod console;
pub mod descriptor_table;
pub mod syscalls;

pub use console::{BufferConsole, Console, StdConsole};
pub use descriptor_table::{DescriptorTable, OpenFile, Slot, StandardStream, STDIN_FD, STDOUT_FD};
pub use syscalls::{Syscall, SyscallRequest, UserProcess};
