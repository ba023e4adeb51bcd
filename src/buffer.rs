use crate::config::LOG_BUFFER_LEN;
use crate::transmit::TxSlice;

/// Storage of one log buffer.
pub type LogBuffer = [u8; LOG_BUFFER_LEN];

/// Two log buffers: one being written, the other free or owned by the transmitter.
///
/// Buffers are `'static` so their address stays valid while a DMA stream reads them,
/// whatever happens to the `DoubleBuffer` value itself.
pub struct DoubleBuffer {
    slots: [&'static mut LogBuffer; 2],
    /// slot currently written by the producer
    active: usize,
    /// bytes written to the active slot
    cursor: usize,
}

impl DoubleBuffer {
    pub fn new(first: &'static mut LogBuffer, second: &'static mut LogBuffer) -> Self {
        Self {
            slots: [first, second],
            active: 0,
            cursor: 0,
        }
    }

    pub fn active_slot(&self) -> usize {
        self.active
    }

    /// Bytes waiting in the active slot.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= LOG_BUFFER_LEN
    }

    /// Append to the active slot. Returns false, leaving the buffer untouched, when full.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.slots[self.active].get_mut(self.cursor) {
            Some(slot) => {
                *slot = byte;
                self.cursor += 1;
                true
            }
            None => false,
        }
    }

    /// Base address of `slot`.
    pub fn slot_address(&self, slot: usize) -> usize {
        self.slots[slot % 2].as_ptr() as usize
    }

    /// Hand the pending bytes over and make the other slot active.
    ///
    /// The caller owns the returned slice until the transfer reading it completes, and
    /// must not call this again before then.
    pub(crate) fn swap(&mut self) -> TxSlice {
        let filled = TxSlice::new(&self.slots[self.active][..self.cursor]);
        self.active = (self.active + 1) % self.slots.len();
        self.cursor = 0;
        filled
    }

    /// Drop the pending bytes. Returns how many were lost.
    pub(crate) fn discard(&mut self) -> usize {
        core::mem::replace(&mut self.cursor, 0)
    }
}

#[cfg(test)]
pub(crate) fn leaked_buffers() -> DoubleBuffer {
    DoubleBuffer::new(
        Box::leak(Box::new([0; LOG_BUFFER_LEN])),
        Box::leak(Box::new([0; LOG_BUFFER_LEN])),
    )
}
