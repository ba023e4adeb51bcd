use crate::buffer::DoubleBuffer;
use crate::config::LoggerConfig;
use crate::datamodel::log_error::LogError;
use crate::encoder::ByteSink;
use crate::transmit::{MonotonicClock, SerialTransmitter};

/// Counters kept by the logger, themselves worth logging. All of them wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// buffers handed to the transmitter
    pub flushes: u32,
    pub bytes_sent: u32,
    /// flushes abandoned because the transmitter stayed busy
    pub stalls: u32,
    pub dropped_bytes: u32,
}

/// The producer side of the log: two buffers, a flush policy and the transmitter.
///
/// There is exactly one writer. Every entry point takes `&mut self`, and the only
/// synchronisation with the hardware is the transmitter's busy flag.
pub struct TelemetryLogger<T, C> {
    buffers: DoubleBuffer,
    transmitter: T,
    clock: C,
    config: LoggerConfig,
    last_flush_ms: u32,
    stats: LoggerStats,
}

impl<T, C> TelemetryLogger<T, C>
where
    T: SerialTransmitter,
    C: MonotonicClock,
{
    pub fn new(buffers: DoubleBuffer, transmitter: T, clock: C) -> Self {
        Self::with_config(buffers, transmitter, clock, LoggerConfig::default())
    }

    pub fn with_config(buffers: DoubleBuffer, transmitter: T, clock: C, config: LoggerConfig) -> Self {
        // the flush interval counts from start-up, not from the epoch of the clock
        let last_flush_ms = clock.now_ms();
        Self {
            buffers,
            transmitter,
            clock,
            config,
            last_flush_ms,
            stats: LoggerStats::default(),
        }
    }

    /// Append one byte to the active buffer, flushing it when full or stale.
    pub fn append_byte(&mut self, byte: u8) -> Result<(), LogError> {
        // a full buffer is always flushed or discarded before we get back here
        let stored = self.buffers.push(byte);
        debug_assert!(stored, "active log buffer overran");

        if self.buffers.is_full() || self.flush_interval_elapsed() {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Hand the pending bytes to the transmitter and switch buffers.
    ///
    /// Spins until the previous transfer is done. If it does not finish within the
    /// stall timeout the pending bytes are dropped and
    /// [`LogError::TransmitterStalled`] is returned.
    pub fn flush(&mut self) -> Result<(), LogError> {
        if self.buffers.is_empty() {
            return Ok(());
        }

        if let Err(waited_ms) = self.wait_for_transmitter() {
            let dropped = self.buffers.discard();
            self.last_flush_ms = self.clock.now_ms();
            self.stats.stalls = self.stats.stalls.wrapping_add(1);
            self.stats.dropped_bytes = self.stats.dropped_bytes.wrapping_add(dropped as u32);
            trace!(
                "[WARNING] log transmitter busy for {} ms, dropping {} bytes",
                waited_ms,
                dropped
            );
            return Err(LogError::TransmitterStalled { waited_ms, dropped });
        }

        self.last_flush_ms = self.clock.now_ms();
        let slot = self.buffers.active_slot();
        let filled = self.buffers.swap();
        trace!("sending log buffer {} ({} bytes)", slot, filled.len());
        self.stats.flushes = self.stats.flushes.wrapping_add(1);
        self.stats.bytes_sent = self.stats.bytes_sent.wrapping_add(filled.len() as u32);
        self.transmitter.start(filled);
        Ok(())
    }

    pub fn stats(&self) -> LoggerStats {
        self.stats
    }

    pub fn buffers(&self) -> &DoubleBuffer {
        &self.buffers
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current time on the logger's clock.
    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    fn flush_interval_elapsed(&self) -> bool {
        self.clock.now_ms().wrapping_sub(self.last_flush_ms) > self.config.flush_interval_ms
    }

    /// Spin on the busy flag. `Err` carries how long we waited before giving up.
    fn wait_for_transmitter(&self) -> Result<(), u32> {
        let started = self.clock.now_ms();
        while self.transmitter.is_busy() {
            let waited = self.clock.now_ms().wrapping_sub(started);
            if waited > self.config.stall_timeout_ms {
                return Err(waited);
            }
            core::hint::spin_loop();
        }
        Ok(())
    }
}

impl<T, C> ByteSink for TelemetryLogger<T, C>
where
    T: SerialTransmitter,
    C: MonotonicClock,
{
    type Error = LogError;

    fn push_byte(&mut self, byte: u8) -> Result<(), LogError> {
        self.append_byte(byte)
    }
}
