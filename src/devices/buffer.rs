use std::fmt::{self, Display, Formatter};

use crate::serial::SerialDevice;

/// Captures every byte tapped off the serial port into an in-memory buffer;
/// used by the test harness to assert on a ROM's serial output (e.g. the
/// "Passed" banner emitted by Blargg-style CPU instruction tests).
#[derive(Default)]
pub struct BufferDevice {
    buffer: Vec<u8>,
}

impl BufferDevice {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

impl SerialDevice for BufferDevice {
    fn receive(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn description(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

impl Display for BufferDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.buffer))
    }
}
