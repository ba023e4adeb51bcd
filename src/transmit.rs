//! The two collaborators the logger drives: the serial transmitter and the clock.

use embedded_dma::ReadBuffer;

/// A filled log buffer handed to the transmitter.
///
/// Points into one of the `'static` log buffers; the logger does not write that
/// buffer again until [`SerialTransmitter::is_busy`] reported the transfer done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSlice {
    ptr: *const u8,
    len: usize,
}

impl TxSlice {
    /// Only called on slices of the `'static` buffers owned by a [`DoubleBuffer`](crate::DoubleBuffer).
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    /// Base address of the buffer, as programmed into a DMA memory address register.
    pub fn address(&self) -> usize {
        self.ptr as usize
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// SAFETY: the pointer targets a `'static` log buffer and stays valid for the whole
// transfer; the logger only writes it again after the transmitter went idle.
#[allow(unsafe_code)]
unsafe impl ReadBuffer for TxSlice {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.ptr, self.len)
    }
}

/// Output side of the log: typically a UART fed by a DMA stream.
pub trait SerialTransmitter {
    /// Start sending `buffer`. Returns immediately.
    fn start(&mut self, buffer: TxSlice);

    /// True while the last started transfer is still running.
    fn is_busy(&self) -> bool;
}

/// Milliseconds since boot. Expected to wrap at `u32::MAX`.
pub trait MonotonicClock {
    fn now_ms(&self) -> u32;
}

impl<T: SerialTransmitter + ?Sized> SerialTransmitter for &mut T {
    fn start(&mut self, buffer: TxSlice) {
        (**self).start(buffer)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
