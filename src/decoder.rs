//! Receiving side of the log line.
//!
//! Bytes before the first [`FRAME_MARKER`] are skipped. A frame ends where the next
//! marker starts (or at [`FrameDecoder::finish`]), so after any byte loss the decoder
//! is back in sync at the following frame.

use core::mem;

use crate::datamodel::log_error::DecodeError;
use crate::datamodel::rc_channels::RC_CHANNEL_COUNT;
use crate::datamodel::record::{
    RcChannelsFrame, Record, Sample, SamplesFrame, MAX_FRAME_LEN, MAX_SAMPLES, RC_CHANNELS_TAG,
};
use crate::encoder::{decode_varint, unstuff, VarintWidth, ESCAPE, FRAME_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// waiting for a frame marker
    Hunting,
    Collecting,
    /// previous byte was an escape
    Escaping,
    /// the current frame is lost; report once it ends
    Corrupt(DecodeError),
}

/// Streaming frame decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    body: heapless::Vec<u8, MAX_FRAME_LEN>,
    state: State,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            body: heapless::Vec::new(),
            state: State::Hunting,
        }
    }

    /// Feed one byte from the line. Returns the previous frame once a new one starts.
    pub fn push(&mut self, byte: u8) -> Option<Result<Record, DecodeError>> {
        if byte == FRAME_MARKER {
            let completed = self.complete();
            self.state = State::Collecting;
            return completed;
        }

        let state = self.state;
        match state {
            State::Hunting | State::Corrupt(_) => {}
            State::Collecting if byte == ESCAPE => self.state = State::Escaping,
            State::Collecting => self.store(byte),
            State::Escaping => match unstuff(byte) {
                Some(unescaped) => {
                    self.state = State::Collecting;
                    self.store(unescaped);
                }
                None => self.state = State::Corrupt(DecodeError::InvalidEscape(byte)),
            },
        }
        None
    }

    /// Feed a chunk, yielding every frame it completes.
    pub fn decode<'a>(
        &'a mut self,
        bytes: &'a [u8],
    ) -> impl Iterator<Item = Result<Record, DecodeError>> + 'a {
        bytes.iter().filter_map(move |byte| self.push(*byte))
    }

    /// End of stream: decode whatever frame is still open.
    pub fn finish(&mut self) -> Option<Result<Record, DecodeError>> {
        self.complete()
    }

    fn store(&mut self, byte: u8) {
        if self.body.push(byte).is_err() {
            self.state = State::Corrupt(DecodeError::FrameTooLong { max: MAX_FRAME_LEN });
        }
    }

    fn complete(&mut self) -> Option<Result<Record, DecodeError>> {
        let result = match mem::replace(&mut self.state, State::Hunting) {
            State::Hunting => None,
            State::Collecting => Some(parse_frame(&self.body)),
            State::Escaping => Some(Err(DecodeError::Truncated(self.body.len()))),
            State::Corrupt(err) => Some(Err(err)),
        };
        self.body.clear();
        if let Some(Err(err)) = &result {
            trace!("[WARNING] dropping log frame: {}", err);
        }
        result
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an unstuffed frame body (everything after the marker).
pub fn parse_frame(body: &[u8]) -> Result<Record, DecodeError> {
    if body.len() < 5 {
        return Err(DecodeError::Truncated(body.len()));
    }
    let timestamp_ms = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);

    if body[4] == RC_CHANNELS_TAG {
        parse_rc_channels(timestamp_ms, &body[5..], body.len())
    } else {
        parse_samples(timestamp_ms, &body[4..], body.len())
    }
}

fn parse_rc_channels(
    timestamp_ms: u32,
    payload: &[u8],
    frame_len: usize,
) -> Result<Record, DecodeError> {
    let expected = RC_CHANNEL_COUNT * 2;
    if payload.len() < expected {
        return Err(DecodeError::Truncated(frame_len));
    }
    if payload.len() > expected {
        return Err(DecodeError::TrailingBytes(payload.len() - expected));
    }

    let mut channels_us = [0u16; RC_CHANNEL_COUNT];
    for (channel, pair) in channels_us.iter_mut().zip(payload.chunks_exact(2)) {
        *channel = u16::from_be_bytes([pair[0], pair[1]]);
    }
    Ok(Record::RcChannels(RcChannelsFrame {
        timestamp_ms,
        channels_us,
    }))
}

fn parse_samples(
    timestamp_ms: u32,
    mut fields: &[u8],
    frame_len: usize,
) -> Result<Record, DecodeError> {
    let mut samples = heapless::Vec::new();
    while let Some((&tag, rest)) = fields.split_first() {
        let width = VarintWidth::from_tag(tag).len();
        if rest.len() < width {
            return Err(DecodeError::Truncated(frame_len));
        }
        let (payload, rest) = rest.split_at(width);
        let (kind, value) =
            decode_varint(tag, payload).ok_or(DecodeError::Truncated(frame_len))?;
        samples
            .push(Sample::new(kind, value))
            .map_err(|_| DecodeError::TooManySamples { max: MAX_SAMPLES })?;
        fields = rest;
    }
    Ok(Record::Samples(SamplesFrame {
        timestamp_ms,
        samples,
    }))
}
