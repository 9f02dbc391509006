//! Low-level diagnostic utilities used by [`crate::panic_gb`].
//!
//! Keeps a raw pointer to the last `GameBoy` that registered itself so a
//! panic triggered deep inside the CPU loop can still dump register state
//! before unwinding. This is strictly a debugging aid: the emulator never
//! reads this pointer during normal operation.

use std::ptr::null;

use crate::gb::GameBoy;

static mut GLOBAL_INSTANCE: *const GameBoy = null();

impl GameBoy {
    /// Registers `self` as the instance used by panic diagnostics.
    pub fn set_diag(&self) {
        unsafe {
            GLOBAL_INSTANCE = self;
        }
    }

    /// Clears the panic-diagnostics instance if it currently points at `self`.
    pub fn unset_diag(&self) {
        unsafe {
            if GLOBAL_INSTANCE == self as *const GameBoy {
                GLOBAL_INSTANCE = null();
            }
        }
    }

    /// Dumps the diagnostics for the registered global instance to stdout.
    pub fn dump_diagnostics() {
        if let Some(gb) = Self::global() {
            println!("Dumping dotmatrix diagnostics:");
            println!("{}", gb.description());
        }
    }

    fn global() -> Option<&'static Self> {
        unsafe {
            if GLOBAL_INSTANCE.is_null() {
                None
            } else {
                Some(&*GLOBAL_INSTANCE)
            }
        }
    }
}
