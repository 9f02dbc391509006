//! Serial tap devices: purely virtual endpoints that observe the byte-out
//! debug tap described in `spec.md` §6 (FF01/FF02). [`buffer::BufferDevice`]
//! is used by the test harness to capture a ROM's serial output; [`stdout`]
//! mirrors it to the host terminal for interactive debugging.

pub mod buffer;
pub mod stdout;
