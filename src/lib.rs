//! Double-buffered, byte-stuffed telemetry logging for a flight controller.
//!
//! The producer (control loop) appends frames to one of two static buffers while the
//! transmitter (a DMA-paced UART) drains the other. Frames start with an unescaped
//! [`FRAME_MARKER`](encoder::FRAME_MARKER); every other byte is stuffed so a receiver
//! can resynchronise after arbitrary byte loss.
//!
//! Layout, leaf first:
//! - [`encoder`]: byte stuffing and the minimal-width integer encoding
//! - [`buffer`]: the two buffers, the write cursor and the active slot
//! - [`logger`]: flush policy and hand-off to the [`SerialTransmitter`](transmit::SerialTransmitter)
//! - [`producer`]: frame composition (RC channels, samples)
//! - [`decoder`]: the receiving side of the wire format
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod trace;

pub mod buffer;
pub mod config;
pub mod datamodel;
pub mod decoder;
pub mod encoder;
pub mod logger;
pub mod producer;
pub mod transmit;

pub use buffer::{DoubleBuffer, LogBuffer};
pub use config::LoggerConfig;
pub use datamodel::log_error::{DecodeError, LogError};
pub use datamodel::rc_channels::RcChannels;
pub use datamodel::record::{Record, Sample};
pub use decoder::FrameDecoder;
pub use encoder::{ByteSink, FrameEncoder};
pub use logger::{LoggerStats, TelemetryLogger};
pub use transmit::{MonotonicClock, SerialTransmitter, TxSlice};
