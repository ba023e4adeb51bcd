use serde::Serialize;

use crate::datamodel::log_error::DecodeError;
use crate::datamodel::rc_channels::RC_CHANNEL_COUNT;

/// Type tag of the RC channels frame.
pub const RC_CHANNELS_TAG: u8 = 40;

/// Most samples carried by one samples frame.
pub const MAX_SAMPLES: usize = 16;

/// Largest unstuffed frame body (timestamp plus payload, marker excluded).
pub const MAX_FRAME_LEN: usize = 4 + MAX_SAMPLES * 5;

/// One typed value of a samples frame.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// sample type, 6 bits
    pub kind: u8,
    pub value: i32,
}

impl Sample {
    pub const fn new(kind: u8, value: i32) -> Self {
        Self { kind, value }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcChannelsFrame {
    pub timestamp_ms: u32,
    pub channels_us: [u16; RC_CHANNEL_COUNT],
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SamplesFrame {
    pub timestamp_ms: u32,
    pub samples: heapless::Vec<Sample, MAX_SAMPLES>,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    RcChannels(RcChannelsFrame),
    Samples(SamplesFrame),
}

impl Record {
    pub fn timestamp_ms(&self) -> u32 {
        match self {
            Record::RcChannels(frame) => frame.timestamp_ms,
            Record::Samples(frame) => frame.timestamp_ms,
        }
    }

    /// Render the record as a single JSON object into `out`, returning its length.
    pub fn write_json(&self, out: &mut [u8]) -> Result<usize, DecodeError> {
        let written = match self {
            Record::RcChannels(frame) => serde_json_core::to_slice(frame, out),
            Record::Samples(frame) => serde_json_core::to_slice(frame, out),
        };
        written.map_err(|_| DecodeError::OutputTooSmall)
    }
}
