//! Hardware profile selection
//!
//! # Design
//! The sampler supports a closed set of target chips. The chips share the
//! ADC and DMA architecture but differ in the GPIO pins wired to the ADC, the
//! number of ADC inputs and DMA channels, the DREQ number of the ADC and a few
//! register layouts. Each difference is captured by [HardwareProfile].
//!
//! Exactly one profile is selected at build time with the `rp2040` or
//! `rp2350b` Cargo feature and exposed as [HardwareProfile::ACTIVE]. The
//! feature also selects the peripheral access crate re-exported as
//! [pac](super::pac), which supplies the register addresses.
use strum::{EnumIter, IntoStaticStr};

#[cfg(all(feature = "rp2040", feature = "rp2350b"))]
compile_error!(
    "Features `rp2040` and `rp2350b` are mutually exclusive, enable exactly one"
);

#[cfg(not(any(feature = "rp2040", feature = "rp2350b")))]
compile_error!(
    "No hardware profile selected, enable either feature `rp2040` or `rp2350b`"
);

/// A supported target chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum HardwareProfile {
    /// RP2040: ADC inputs 0-3 on GPIO26-29, temperature sensor on input 4.
    Rp2040,
    /// RP2350B (QFN-80): ADC inputs 0-7 on GPIO40-47, temperature sensor on
    /// input 8.
    Rp2350b,
}

impl HardwareProfile {
    /// The profile selected by the enabled Cargo feature.
    #[cfg(feature = "rp2040")]
    pub const ACTIVE: Self = Self::Rp2040;

    /// The profile selected by the enabled Cargo feature.
    #[cfg(all(feature = "rp2350b", not(feature = "rp2040")))]
    pub const ACTIVE: Self = Self::Rp2350b;

    /// GPIO number of ADC input 0.
    pub const fn base_pin(&self) -> u8 {
        match self {
            Self::Rp2040 => 26,
            Self::Rp2350b => 40,
        }
    }

    /// Number of ADC inputs that are wired to GPIO pins.
    pub const fn gpio_inputs(&self) -> usize {
        match self {
            Self::Rp2040 => 4,
            Self::Rp2350b => 8,
        }
    }

    /// Total number of ADC inputs, including the temperature sensor which
    /// always follows the GPIO inputs.
    pub const fn adc_inputs(&self) -> usize {
        self.gpio_inputs() + 1
    }

    /// ADC input index of the on-die temperature sensor.
    pub const fn temperature_input(&self) -> usize {
        self.gpio_inputs()
    }

    /// Number of channels in the DMA engine.
    pub const fn dma_channels(&self) -> u8 {
        match self {
            Self::Rp2040 => 12,
            Self::Rp2350b => 16,
        }
    }

    /// DMA request line raised by the ADC FIFO.
    pub const fn adc_dreq(&self) -> u8 {
        match self {
            Self::Rp2040 => 36,
            Self::Rp2350b => 48,
        }
    }

    /// The GPIO pin that feeds ADC input `input`, if the input is wired to a
    /// pin at all.
    pub const fn pin(&self, input: usize) -> Option<u8> {
        if input < self.gpio_inputs() {
            Some(self.base_pin() + input as u8)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
