use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Byte stream behind the two standard descriptors.
pub trait Console: Send {
    /// Fills `buf` with whatever input is available and returns the count.
    fn read(&mut self, buf: &mut [u8]) -> usize;
    fn write(&mut self, data: &[u8]) -> usize;
}

/// Host terminal.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        io::stdin().read(buf).unwrap_or(0)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let mut stdout = io::stdout();
        match stdout.write_all(data).and_then(|_| stdout.flush()) {
            Ok(()) => data.len(),
            Err(_) => 0,
        }
    }
}

#[derive(Debug, Default)]
struct ConsoleBuffers {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

/// In-memory console. Clones share the same buffers, so a caller can keep one
/// handle to feed input and inspect output while a process owns another.
#[derive(Clone, Debug, Default)]
pub struct BufferConsole {
    buffers: Arc<Mutex<ConsoleBuffers>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        BufferConsole::default()
    }

    pub fn push_input(&self, data: &[u8]) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.input.extend(data.iter().copied());
    }

    pub fn output(&self) -> Vec<u8> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner).output.clone()
    }
}

impl Console for BufferConsole {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        let count = std::cmp::min(buf.len(), buffers.input.len());
        for (slot, byte) in buf.iter_mut().zip(buffers.input.drain(..count)) {
            *slot = byte;
        }
        count
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.output.extend_from_slice(data);
        data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_shares_state() {
        let feeder = BufferConsole::new();
        let mut console = feeder.clone();
        feeder.push_input(b"abc");

        let mut buf = [0u8; 2];
        assert_eq!(console.read(&mut buf), 2);
        assert_eq!(&buf, b"ab");
        assert_eq!(console.read(&mut buf), 1);
        assert_eq!(buf[0], b'c');
        assert_eq!(console.read(&mut buf), 0);

        assert_eq!(console.write(b"out"), 3);
        assert_eq!(feeder.output(), b"out");
    }
}
