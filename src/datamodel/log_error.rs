use thiserror::Error;

/// Errors raised while producing the log.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// The previous transfer did not finish in time; the pending buffer was dropped.
    #[error("transmitter still busy after {waited_ms} ms, {dropped} bytes dropped")]
    TransmitterStalled { waited_ms: u32, dropped: usize },

    /// Sample tags must fit in 6 bits and must not collide with a fixed frame tag.
    #[error("sample tag {0:#04x} is reserved or does not fit in 6 bits")]
    InvalidSampleTag(u8),

    /// A samples frame is limited to what a receiver can hold.
    #[error("{count} samples in one frame, at most {max} allowed")]
    TooManySamples { count: usize, max: usize },
}

/// Errors raised while decoding a captured log stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// An escape byte was followed by something other than 0x5E or 0x5D.
    #[error("invalid escape sequence 0x7D {0:#04x}")]
    InvalidEscape(u8),

    /// The frame ended before its header or a field was complete.
    #[error("frame truncated after {0} bytes")]
    Truncated(usize),

    /// The frame did not fit in the decoder's frame buffer.
    #[error("frame longer than {max} bytes")]
    FrameTooLong { max: usize },

    /// A samples frame carried more fields than a record can hold.
    #[error("more than {max} samples in one frame")]
    TooManySamples { max: usize },

    /// A fixed-size frame had bytes left over.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    /// The rendered record did not fit in the output buffer.
    #[error("record does not fit in the output buffer")]
    OutputTooSmall,
}
