//! Feature-gated diagnostic macros used throughout the crate.
//!
//! `debugln!`/`warnln!` are no-ops unless the `debug` feature is enabled, so
//! hot paths (the CPU fetch/decode/execute loop, the PPU line renderer) never
//! pay for formatting they don't need. `panic_gb!`/`assert_pedantic_gb!`
//! follow the same split for invariant checks gated by `pedantic`.

#[cfg(feature = "debug")]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        std::println!($($rest)*)
    };
}

#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        ()
    };
}

#[cfg(feature = "debug")]
#[macro_export]
macro_rules! warnln {
    ($($rest:tt)*) => {
        std::eprintln!($($rest)*)
    };
}

#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! warnln {
    ($($rest:tt)*) => {
        ()
    };
}

#[macro_export]
macro_rules! panic_gb {
    ($msg:expr) => {{
        $crate::gb::GameBoy::dump_diagnostics();
        panic!($msg);
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::gb::GameBoy::dump_diagnostics();
        panic!($fmt, $($arg)*);
    }};
}

#[cfg(feature = "pedantic")]
#[macro_export]
macro_rules! assert_pedantic_gb {
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::panic_gb!($fmt, $($arg)*);
        }
    };
    ($cond:expr) => {
        if !$cond {
            $crate::panic_gb!(stringify!($cond));
        }
    };
}

#[cfg(not(feature = "pedantic"))]
#[macro_export]
macro_rules! assert_pedantic_gb {
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        ()
    };
    ($cond:expr) => {
        ()
    };
}
