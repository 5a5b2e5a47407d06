use fugit::HertzU32;

/// The number of ADC inputs sampled round-robin. This is also the number of
/// slots in the sample buffer and the number of DMA transfers per pass.
pub const NUM_ADC_INPUTS: usize = 8;

/// The nominal ADC clock (CLK_ADC, taken from the USB PLL).
pub const ADC_CLOCK: HertzU32 = HertzU32::MHz(48);

/// A single conversion takes 96 ADC clock cycles. Any clock divider setting
/// that would start conversions faster than this is invalid.
pub const ADC_CONVERSION_CYCLES: u32 = 96;

/// Resolution of a raw ADC code.
pub const ADC_RESOLUTION_BITS: u8 = 12;

/// The nominal ADC reference voltage on Raspberry Pi boards.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;

// The ADC reports READY within a few ADC clock cycles after power-up. The
// bound only catches an unclocked or held-in-reset ADC.
pub const ADC_READY_POLLS: u32 = 10_000;

// A channel abort completes within a few bus cycles.
pub const DMA_ABORT_POLLS: u32 = 10_000;

/// FIFO fill level at which the ADC raises its DMA request.
pub const ADC_FIFO_THRESHOLD: u8 = 1;
