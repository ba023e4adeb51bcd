//! Hardware side of the logger's collaborators.

mod dwt_clock;
mod usart1_dma;

pub(crate) use dwt_clock::DwtClock;
pub(crate) use usart1_dma::Usart1DmaTx;
