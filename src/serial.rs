//! Serial data transfer — reduced, per `spec.md`, to a register-level
//! "byte-out debug tap": writing `0x81` to SC immediately delivers the SB
//! byte to the attached [`SerialDevice`] and raises the Serial interrupt,
//! with no shift-register timing modeled.

use crate::{
    consts::{SB_ADDR, SC_ADDR},
    interrupt::{InterruptBus, InterruptKind},
    mmu::BusComponent,
    util::SharedMut,
    warnln,
};

pub trait SerialDevice {
    /// Receives a byte tapped off the serial data register.
    fn receive(&mut self, byte: u8);

    /// Short description, useful for debugging / test assertions.
    fn description(&self) -> String;
}

#[derive(Default)]
pub struct NullDevice;

impl SerialDevice for NullDevice {
    fn receive(&mut self, _byte: u8) {}

    fn description(&self) -> String {
        String::from("null")
    }
}

pub struct Serial {
    data: u8,
    control: u8,
    intr: SharedMut<InterruptBus>,
    device: Box<dyn SerialDevice>,
}

impl Serial {
    pub fn new(intr: SharedMut<InterruptBus>) -> Self {
        Self {
            data: 0x00,
            control: 0x00,
            intr,
            device: Box::<NullDevice>::default(),
        }
    }

    pub fn reset(&mut self) {
        self.data = 0x00;
        self.control = 0x00;
    }

    pub fn attach(&mut self, device: Box<dyn SerialDevice>) {
        self.device = device;
    }

    pub fn device(&self) -> &dyn SerialDevice {
        self.device.as_ref()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            SB_ADDR => self.data,
            SC_ADDR => self.control,
            _ => {
                warnln!("reading from unknown Serial location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            SB_ADDR => self.data = value,
            SC_ADDR => {
                self.control = value;
                if value == 0x81 {
                    self.device.receive(self.data);
                    self.intr.borrow_mut().request(InterruptKind::Serial);
                    self.control &= 0x7f;
                }
            }
            _ => warnln!("writing to unknown Serial location 0x{:04x}", addr),
        }
    }
}

impl BusComponent for Serial {
    fn read(&self, addr: u16) -> u8 {
        Serial::read(self, addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        Serial::write(self, addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shared;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct BufferDevice {
        bytes: Rc<RefCell<Vec<u8>>>,
    }

    impl SerialDevice for BufferDevice {
        fn receive(&mut self, byte: u8) {
            self.bytes.borrow_mut().push(byte);
        }

        fn description(&self) -> String {
            String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
        }
    }

    #[test]
    fn writing_0x81_to_sc_taps_sb_and_raises_interrupt() {
        let intr = shared(InterruptBus::new());
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut serial = Serial::new(intr.clone());
        serial.attach(Box::new(BufferDevice { bytes: bytes.clone() }));
        serial.write(SB_ADDR, b'P');
        serial.write(SC_ADDR, 0x81);
        assert_eq!(&*bytes.borrow(), b"P");
        assert_eq!(intr.borrow().highest_priority(), Some(InterruptKind::Serial));
        assert_eq!(serial.read(SC_ADDR) & 0x80, 0);
    }

    #[test]
    fn other_control_writes_do_not_tap() {
        let intr = shared(InterruptBus::new());
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut serial = Serial::new(intr);
        serial.attach(Box::new(BufferDevice { bytes: bytes.clone() }));
        serial.write(SB_ADDR, b'X');
        serial.write(SC_ADDR, 0x01);
        assert!(bytes.borrow().is_empty());
    }
}
