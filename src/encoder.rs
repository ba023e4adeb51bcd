//! Byte stuffing and the minimal-width integer encoding used on the log line.
//!
//! Wire rules:
//! - every frame starts with a literal [`FRAME_MARKER`], which is never escaped
//! - any other `0x7E` becomes `0x7D 0x5E`, any `0x7D` becomes `0x7D 0x5D`
//!
//! Integers are sent big endian in 1 to 4 bytes. The two high bits of the tag byte
//! carry the width, the low six bits the sample type:
//! ```text
//! 11tttttt b0                 value fits in 8 bits
//! 10tttttt b1 b0              value fits in 16 bits
//! 01tttttt b2 b1 b0           value fits in 24 bits
//! 00tttttt b3 b2 b1 b0        anything else
//! ```

/// Start of frame. Only ever written unescaped.
pub const FRAME_MARKER: u8 = 0x7E;
/// Escape byte, followed by the escaped value.
pub const ESCAPE: u8 = 0x7D;
/// Second byte of an escaped [`FRAME_MARKER`].
pub const ESCAPED_MARKER: u8 = 0x5E;
/// Second byte of an escaped [`ESCAPE`].
pub const ESCAPED_ESCAPE: u8 = 0x5D;

/// Width bits of a varint tag.
pub const WIDTH_MASK: u8 = 0xC0;
/// Sample type bits of a varint tag.
pub const TYPE_MASK: u8 = 0x3F;

/// A byte as it appears on the wire after stuffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stuffed {
    Plain(u8),
    /// Sent as [`ESCAPE`] followed by the contained byte.
    Escaped(u8),
}

impl Stuffed {
    pub const fn of(byte: u8) -> Self {
        match byte {
            FRAME_MARKER => Stuffed::Escaped(ESCAPED_MARKER),
            ESCAPE => Stuffed::Escaped(ESCAPED_ESCAPE),
            other => Stuffed::Plain(other),
        }
    }
}

/// Inverse of [`Stuffed::of`] for the byte following an [`ESCAPE`].
pub const fn unstuff(escaped: u8) -> Option<u8> {
    match escaped {
        ESCAPED_MARKER => Some(FRAME_MARKER),
        ESCAPED_ESCAPE => Some(ESCAPE),
        _ => None,
    }
}

/// Width class of a varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintWidth {
    One,
    Two,
    Three,
    Four,
}

impl VarintWidth {
    /// Smallest class whose bytes hold the raw bit pattern of `value`.
    ///
    /// The test runs on the two's complement bits, so every negative value lands in
    /// [`VarintWidth::Four`].
    pub const fn of(value: i32) -> Self {
        let bits = value as u32;
        if bits & 0xFFFF_FF00 == 0 {
            VarintWidth::One
        } else if bits & 0xFFFF_0000 == 0 {
            VarintWidth::Two
        } else if bits & 0xFF00_0000 == 0 {
            VarintWidth::Three
        } else {
            VarintWidth::Four
        }
    }

    pub const fn from_tag(tag: u8) -> Self {
        match tag & WIDTH_MASK {
            0xC0 => VarintWidth::One,
            0x80 => VarintWidth::Two,
            0x40 => VarintWidth::Three,
            _ => VarintWidth::Four,
        }
    }

    pub const fn tag_bits(self) -> u8 {
        match self {
            VarintWidth::One => 0xC0,
            VarintWidth::Two => 0x80,
            VarintWidth::Three => 0x40,
            VarintWidth::Four => 0x00,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            VarintWidth::One => 1,
            VarintWidth::Two => 2,
            VarintWidth::Three => 3,
            VarintWidth::Four => 4,
        }
    }
}

/// An encoded varint payload, before stuffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varint {
    width: VarintWidth,
    be: [u8; 4],
}

impl Varint {
    pub const fn new(value: i32) -> Self {
        Self {
            width: VarintWidth::of(value),
            be: (value as u32).to_be_bytes(),
        }
    }

    pub const fn width(&self) -> VarintWidth {
        self.width
    }

    /// Tag byte for a sample of type `type_tag`.
    pub const fn tag(&self, type_tag: u8) -> u8 {
        type_tag | self.width.tag_bits()
    }

    /// Payload bytes, most significant first.
    pub fn payload(&self) -> &[u8] {
        &self.be[4 - self.width.len()..]
    }
}

/// Pure form of the width selection: value to (width class, payload bytes).
pub const fn encode_varint(value: i32) -> Varint {
    Varint::new(value)
}

/// Reassemble a varint from its tag and unstuffed payload.
///
/// Returns the sample type and the value, or `None` when `payload` does not have the
/// length the tag announces.
pub fn decode_varint(tag: u8, payload: &[u8]) -> Option<(u8, i32)> {
    if payload.len() != VarintWidth::from_tag(tag).len() {
        return None;
    }
    let bits = payload
        .iter()
        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
    Some((tag & TYPE_MASK, bits as i32))
}

/// Anything bytes can be appended to.
pub trait ByteSink {
    type Error;

    fn push_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

/// Frame level writes on top of a [`ByteSink`].
pub trait FrameEncoder: ByteSink {
    /// Append without escaping. Only for [`FRAME_MARKER`].
    fn emit_raw(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.push_byte(byte)
    }

    fn emit_stuffed(&mut self, byte: u8) -> Result<(), Self::Error> {
        match Stuffed::of(byte) {
            Stuffed::Plain(plain) => self.push_byte(plain),
            Stuffed::Escaped(escaped) => {
                self.push_byte(ESCAPE)?;
                self.push_byte(escaped)
            }
        }
    }

    fn emit_u16(&mut self, value: u16) -> Result<(), Self::Error> {
        for byte in value.to_be_bytes() {
            self.emit_stuffed(byte)?;
        }
        Ok(())
    }

    /// Milliseconds since boot, big endian.
    fn emit_timestamp(&mut self, timestamp_ms: u32) -> Result<(), Self::Error> {
        for byte in timestamp_ms.to_be_bytes() {
            self.emit_stuffed(byte)?;
        }
        Ok(())
    }

    /// `type_tag` must fit in [`TYPE_MASK`]; higher bits would alias the width.
    fn emit_varint(&mut self, type_tag: u8, value: i32) -> Result<(), Self::Error> {
        let varint = encode_varint(value);
        self.emit_stuffed(varint.tag(type_tag))?;
        for byte in varint.payload() {
            self.emit_stuffed(*byte)?;
        }
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> FrameEncoder for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use proptest::prelude::*;

    impl ByteSink for Vec<u8> {
        type Error = Infallible;

        fn push_byte(&mut self, byte: u8) -> Result<(), Infallible> {
            self.push(byte);
            Ok(())
        }
    }

    fn unstuff_all(wire: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(wire.len());
        let mut bytes = wire.iter();
        while let Some(&byte) = bytes.next() {
            if byte == ESCAPE {
                let escaped = *bytes.next().expect("dangling escape");
                out.push(unstuff(escaped).expect("bad escape"));
            } else {
                out.push(byte);
            }
        }
        out
    }

    #[test]
    fn stuffing_escapes_reserved_bytes() {
        let mut wire: Vec<u8> = Vec::new();
        for byte in [0x00, 0x7E, 0x7D, 0x5E, 0xFF] {
            wire.emit_stuffed(byte).unwrap();
        }
        assert_eq!(wire, vec![0x00, 0x7D, 0x5E, 0x7D, 0x5D, 0x5E, 0xFF]);
    }

    #[test]
    fn raw_bypasses_stuffing() {
        let mut wire: Vec<u8> = Vec::new();
        wire.emit_raw(FRAME_MARKER).unwrap();
        assert_eq!(wire, vec![FRAME_MARKER]);
    }

    #[test]
    fn unstuff_rejects_unknown_escapes() {
        assert_eq!(unstuff(0x5E), Some(0x7E));
        assert_eq!(unstuff(0x5D), Some(0x7D));
        assert_eq!(unstuff(0x7E), None);
        assert_eq!(unstuff(0x00), None);
    }

    #[test]
    fn timestamp_is_big_endian_and_stuffed() {
        let mut wire: Vec<u8> = Vec::new();
        wire.emit_timestamp(0x0102_7E04).unwrap();
        assert_eq!(wire, vec![0x01, 0x02, 0x7D, 0x5E, 0x04]);
    }

    #[test]
    fn varint_width_boundaries() {
        let table: [(i32, VarintWidth, &[u8]); 8] = [
            (0, VarintWidth::One, &[0x00]),
            (255, VarintWidth::One, &[0xFF]),
            (256, VarintWidth::Two, &[0x01, 0x00]),
            (65_535, VarintWidth::Two, &[0xFF, 0xFF]),
            (65_536, VarintWidth::Three, &[0x01, 0x00, 0x00]),
            (16_777_215, VarintWidth::Three, &[0xFF, 0xFF, 0xFF]),
            (16_777_216, VarintWidth::Four, &[0x01, 0x00, 0x00, 0x00]),
            (i32::MAX, VarintWidth::Four, &[0x7F, 0xFF, 0xFF, 0xFF]),
        ];
        for (value, width, payload) in table {
            let varint = encode_varint(value);
            assert_eq!(varint.width(), width, "width of {}", value);
            assert_eq!(varint.payload(), payload, "payload of {}", value);
        }
    }

    #[test]
    fn varint_tag_carries_width_bits() {
        assert_eq!(encode_varint(1).tag(0x05), 0xC5);
        assert_eq!(encode_varint(300).tag(0x05), 0x85);
        assert_eq!(encode_varint(70_000).tag(0x05), 0x45);
        assert_eq!(encode_varint(-1).tag(0x05), 0x05);
    }

    #[test]
    fn negative_values_use_four_bytes() {
        for value in [-1, -256, i32::MIN] {
            let varint = encode_varint(value);
            assert_eq!(varint.width(), VarintWidth::Four);
            assert_eq!(decode_varint(varint.tag(3), varint.payload()), Some((3, value)));
        }
    }

    #[test]
    fn emit_varint_stuffs_tag_and_payload() {
        // 0x3E | 0x40 == 0x7E, and the payload holds 0x7D
        let mut wire: Vec<u8> = Vec::new();
        wire.emit_varint(0x3E, 0x01_7D_00).unwrap();
        assert_eq!(wire, vec![0x7D, 0x5E, 0x01, 0x7D, 0x5D, 0x00]);
    }

    #[test]
    fn decode_varint_checks_payload_length() {
        assert_eq!(decode_varint(0xC1, &[1, 2]), None);
        assert_eq!(decode_varint(0x81, &[1, 2]), Some((1, 0x0102)));
    }

    proptest! {
        #[test]
        fn stuffing_round_trips(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let mut wire: Vec<u8> = Vec::new();
            for byte in &data {
                wire.emit_stuffed(*byte).unwrap();
            }
            prop_assert!(!wire.contains(&FRAME_MARKER));
            prop_assert_eq!(unstuff_all(&wire), data);
        }

        #[test]
        fn varint_is_minimal_and_round_trips(value in 0..=i32::MAX, type_tag in 0u8..=TYPE_MASK) {
            let varint = encode_varint(value);
            let needed = match value {
                0..=0xFF => 1,
                0x100..=0xFFFF => 2,
                0x1_0000..=0xFF_FFFF => 3,
                _ => 4,
            };
            prop_assert_eq!(varint.payload().len(), needed);
            prop_assert_eq!(
                decode_varint(varint.tag(type_tag), varint.payload()),
                Some((type_tag, value))
            );
        }
    }
}
