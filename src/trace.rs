//! Diagnostics go to the RTT up-channel when the `rtt` feature is enabled.
//! Without it the arguments are still type-checked but nothing is emitted, so host
//! builds never touch the RTT control block.

#[cfg(feature = "rtt")]
macro_rules! trace {
    ($($arg:tt)*) => {
        rtt_target::rprintln!($($arg)*)
    };
}

#[cfg(not(feature = "rtt"))]
macro_rules! trace {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}
