//! Types shared between the producer and the receiving side of the log.

pub mod log_error;
pub mod rc_channels;
pub mod record;
