//! Configuration constants for the telemetry logger

/// Capacity of each of the two log buffers.
pub const LOG_BUFFER_LEN: usize = 512;

/// Max interval between two flushes, regardless of how full the active buffer is.
pub const MAX_LOG_INTERVAL_MS: u32 = 1000;

/// How long a flush may spin on a busy transmitter before giving up.
/// A full buffer drains in ~45 ms at [`LOGGER_BAUDRATE`].
pub const DEFAULT_STALL_TIMEOUT_MS: u32 = 250;

/// UART baudrate of the log line.
pub const LOGGER_BAUDRATE: u32 = 115_200;

/// Runtime knobs of the [`TelemetryLogger`](crate::TelemetryLogger).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// flush the active buffer once this much time passed since the last flush
    pub flush_interval_ms: u32,
    /// give up waiting on the transmitter after this long
    pub stall_timeout_ms: u32,
}

impl LoggerConfig {
    pub const fn new() -> Self {
        Self {
            flush_interval_ms: MAX_LOG_INTERVAL_MS,
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
        }
    }

    pub const fn with_flush_interval_ms(mut self, flush_interval_ms: u32) -> Self {
        self.flush_interval_ms = flush_interval_ms;
        self
    }

    pub const fn with_stall_timeout_ms(mut self, stall_timeout_ms: u32) -> Self {
        self.stall_timeout_ms = stall_timeout_ms;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}
