use std::io::{stdout, Write};

use crate::serial::SerialDevice;

pub struct StdoutDevice {
    flush: bool,
}

impl StdoutDevice {
    pub fn new(flush: bool) -> Self {
        Self { flush }
    }
}

impl SerialDevice for StdoutDevice {
    fn receive(&mut self, byte: u8) {
        print!("{}", byte as char);
        if self.flush {
            let _ = stdout().flush();
        }
    }

    fn description(&self) -> String {
        String::from("stdout")
    }
}

impl Default for StdoutDevice {
    fn default() -> Self {
        Self::new(true)
    }
}
