/// Errors that can occur while arming or tearing down the sampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Every DMA channel of the engine is already claimed.
    #[error("No free DMA channel")]
    NoFreeChannel,
    /// The requested DMA channel is already claimed.
    #[error("DMA channel {0} already claimed")]
    ChannelClaimed(u8),
    /// The requested DMA channel does not exist on this chip.
    #[error("DMA channel {0} does not exist")]
    InvalidChannel(u8),
    /// The ADC did not report READY after power-up.
    #[error("ADC not ready")]
    AdcNotReady,
    /// A DMA channel abort did not complete.
    #[error("DMA abort timed out")]
    AbortTimeout,
    /// The clock divider would start conversions faster than the ADC can
    /// complete them.
    #[error("Invalid ADC clock divider")]
    Divider,
}
