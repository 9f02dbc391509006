//! Error types shared across the crate.

use std::fmt::{self, Display, Formatter};

/// Top level error enum for the dotmatrix core.
///
/// Most bus-level conditions (`BadRead`/`BadWrite`) are logged via
/// [`crate::warnln`] and handled as no-ops rather than surfaced as `Err`,
/// matching real Game Boy hardware (which does not raise a fault on an
/// out-of-range access). `Error` is reserved for load-time and decode-time
/// failures that a caller genuinely needs to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The ROM could not be loaded: missing/unreadable data, or a header
    /// checksum mismatch. The core may still choose to run.
    LoadFailure(String),
    /// The cartridge header names a controller type other than ROM-only or
    /// MBC1. Fatal at construction time.
    UnsupportedCartridge(u8),
    /// A write landed in echo RAM or the unusable region.
    BadWrite(u16),
    /// A read landed in echo RAM or the unusable region.
    BadRead(u16),
    /// One of the eleven undefined SM83 opcodes was fetched.
    UnknownOpcode(u8),
    /// Malformed input that doesn't fit a more specific variant.
    InvalidData,
    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::LoadFailure(message) => format!("Failed to load ROM: {}", message),
            Error::UnsupportedCartridge(kind) => {
                format!("Unsupported cartridge type 0x{:02x}", kind)
            }
            Error::BadWrite(addr) => format!("Bad write at 0x{:04x}", addr),
            Error::BadRead(addr) => format!("Bad read at 0x{:04x}", addr),
            Error::UnknownOpcode(opcode) => format!("Unknown opcode 0x{:02x}", opcode),
            Error::InvalidData => String::from("Invalid data format"),
            Error::CustomError(message) => message.clone(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Error {}
