use embedded_dma::ReadBuffer;
use stm32f4xx_hal::pac::{DMA2, USART1};
use stm32f4xx_hal::serial;
use telemetry_logger::{SerialTransmitter, TxSlice};

/// DMA2 stream serving USART1_TX.
const STREAM: usize = 7;
/// Request channel of USART1_TX on that stream.
const CHANNEL: u8 = 4;

/// USART1 transmitter fed by DMA2 stream 7, one transfer per log buffer.
///
/// The stream clears its EN bit itself once the transfer count reaches zero, so the
/// busy flag needs no interrupt.
pub(crate) struct Usart1DmaTx {
    // held so nobody else reconfigures the TX pin or the USART
    _tx: serial::Tx<USART1>,
    dma: DMA2,
}

impl Usart1DmaTx {
    /// `tx` must have been configured with `DmaConfig::Tx`.
    #[allow(unsafe_code)]
    pub(crate) fn new(tx: serial::Tx<USART1>, dma: DMA2) -> Self {
        let stream = &dma.st[STREAM];
        stream.cr.modify(|_, w| w.en().disabled());
        while stream.cr.read().en().is_enabled() {}

        // SAFETY: USART1 DR is the fixed peripheral-side address of every transfer.
        let data_register = unsafe { &(*USART1::ptr()).dr as *const _ as u32 };
        // SAFETY: plain address and channel numbers, checked by the constants above.
        stream.par.write(|w| unsafe { w.pa().bits(data_register) });
        stream.cr.write(|w| unsafe {
            w.chsel()
                .bits(CHANNEL)
                .dir()
                .memory_to_peripheral()
                .minc()
                .incremented()
                .pinc()
                .fixed()
                .msize()
                .bits8()
                .psize()
                .bits8()
        });
        Self { _tx: tx, dma }
    }
}

impl SerialTransmitter for Usart1DmaTx {
    #[allow(unsafe_code)]
    fn start(&mut self, buffer: TxSlice) {
        // SAFETY: the logger keeps the buffer untouched until `is_busy` goes false.
        let (address, len) = unsafe { buffer.read_buffer() };
        let stream = &self.dma.st[STREAM];

        // stream 7 flags live in HIFCR; a stale TCIF would keep the stream from starting
        self.dma.hifcr.write(|w| {
            w.ctcif7()
                .set_bit()
                .chtif7()
                .set_bit()
                .cteif7()
                .set_bit()
                .cdmeif7()
                .set_bit()
                .cfeif7()
                .set_bit()
        });
        // SAFETY: address and count describe one of the static log buffers.
        stream.m0ar.write(|w| unsafe { w.m0a().bits(address as u32) });
        stream.ndtr.write(|w| w.ndt().bits(len as u16));
        stream.cr.modify(|_, w| w.en().enabled());
    }

    fn is_busy(&self) -> bool {
        self.dma.st[STREAM].cr.read().en().is_enabled()
    }
}
