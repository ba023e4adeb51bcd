/// Number of receiver channels carried by an RC channels frame.
pub const RC_CHANNEL_COUNT: usize = 16;

/// Latest pulse widths (in µs) seen on each receiver channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RcChannels {
    pub channels_us: [u16; RC_CHANNEL_COUNT],
    /// `None` until the receiver delivered a first complete set of channels.
    pub last_update_ms: Option<u32>,
}

impl RcChannels {
    pub const fn new() -> Self {
        Self {
            channels_us: [0; RC_CHANNEL_COUNT],
            last_update_ms: None,
        }
    }

    /// Store a complete set of channels received at `now_ms`.
    pub fn update(&mut self, channels_us: [u16; RC_CHANNEL_COUNT], now_ms: u32) {
        self.channels_us = channels_us;
        self.last_update_ms = Some(now_ms);
    }

    /// Store a single channel received at `now_ms`. Out of range indices are ignored.
    pub fn set_channel(&mut self, index: usize, value_us: u16, now_ms: u32) {
        if let Some(slot) = self.channels_us.get_mut(index) {
            *slot = value_us;
            self.last_update_ms = Some(now_ms);
        }
    }

    /// Channels are only worth logging once something real arrived.
    pub fn is_known(&self) -> bool {
        self.last_update_ms.is_some()
    }
}
