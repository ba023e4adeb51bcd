//! Frame composition. Called once per telemetry cycle from the control loop.
//!
//! Every frame is `marker, timestamp, payload`:
//! - RC channels: tag [`RC_CHANNELS_TAG`] then 16 big endian `u16`, always 2 bytes each
//! - samples: one varint field per sample, the tag byte carrying type and width

use crate::datamodel::log_error::LogError;
use crate::datamodel::rc_channels::RcChannels;
use crate::datamodel::record::{Sample, MAX_SAMPLES, RC_CHANNELS_TAG};
use crate::encoder::{FrameEncoder, FRAME_MARKER, TYPE_MASK};
use crate::logger::TelemetryLogger;
use crate::transmit::{MonotonicClock, SerialTransmitter};

/// Write an RC channels frame, or nothing if no channels were received yet.
pub fn write_rc_channels<S>(sink: &mut S, timestamp_ms: u32, rc: &RcChannels) -> Result<(), S::Error>
where
    S: FrameEncoder + ?Sized,
{
    if !rc.is_known() {
        return Ok(());
    }
    sink.emit_raw(FRAME_MARKER)?;
    sink.emit_timestamp(timestamp_ms)?;
    // the tag is outside the escaped range, it goes out as is
    sink.emit_raw(RC_CHANNELS_TAG)?;
    for value in rc.channels_us.iter() {
        sink.emit_u16(*value)?;
    }
    Ok(())
}

/// Write a samples frame. Tags must have passed [`check_samples`].
pub fn write_samples<S>(sink: &mut S, timestamp_ms: u32, samples: &[Sample]) -> Result<(), S::Error>
where
    S: FrameEncoder + ?Sized,
{
    sink.emit_raw(FRAME_MARKER)?;
    sink.emit_timestamp(timestamp_ms)?;
    for sample in samples {
        sink.emit_varint(sample.kind, sample.value)?;
    }
    Ok(())
}

/// Reject samples a receiver could not tell apart from something else.
pub fn check_samples(samples: &[Sample]) -> Result<(), LogError> {
    if samples.len() > MAX_SAMPLES {
        return Err(LogError::TooManySamples {
            count: samples.len(),
            max: MAX_SAMPLES,
        });
    }
    // a 4 byte varint of type 40 would read as an RC channels tag
    match samples
        .iter()
        .find(|sample| sample.kind & !TYPE_MASK != 0 || sample.kind == RC_CHANNELS_TAG)
    {
        Some(bad) => Err(LogError::InvalidSampleTag(bad.kind)),
        None => Ok(()),
    }
}

impl<T, C> TelemetryLogger<T, C>
where
    T: SerialTransmitter,
    C: MonotonicClock,
{
    /// Log all 16 RC channels, stamped with the current time.
    pub fn log_rc_channels(&mut self, rc: &RcChannels) -> Result<(), LogError> {
        let now = self.now_ms();
        write_rc_channels(self, now, rc)
    }

    /// Log a batch of typed values as one frame. An empty batch logs nothing.
    pub fn log_samples(&mut self, samples: &[Sample]) -> Result<(), LogError> {
        if let Err(err) = check_samples(samples) {
            trace!("[ERROR] refusing to log samples: {}", err);
            return Err(err);
        }
        if samples.is_empty() {
            return Ok(());
        }
        let now = self.now_ms();
        write_samples(self, now, samples)
    }
}
