//! Runtime sampler settings
//!
//! The hardware profile and the number of sampled inputs are fixed at build
//! time. The remaining knobs of the sampler are plain settings that firmware
//! can keep in its settings store and deserialize at startup.
use fugit::HertzU32;
use serde::{Deserialize, Serialize};

use super::{design_parameters::ADC_CONVERSION_CYCLES, Error};

/// Settings applied when the sampler is armed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Integer part of the ADC clock divider. With both divider parts zero
    /// the ADC converts back-to-back.
    pub divider: u16,

    /// Fractional part of the ADC clock divider in 1/256 steps.
    pub divider_frac: u8,

    /// Discard the four least significant bits of every result.
    pub shift_8bit: bool,

    /// Run both DMA channels at high priority.
    pub high_priority: bool,
}

impl SamplerConfig {
    /// Construct the settings for a target aggregate conversion rate, i.e.
    /// the rate summed over all inputs.
    ///
    /// # Args
    /// * `adc_clock` - The ADC clock frequency.
    /// * `rate` - The desired aggregate conversion rate.
    pub fn for_conversion_rate(
        adc_clock: HertzU32,
        rate: HertzU32,
    ) -> Result<Self, Error> {
        if rate.raw() == 0 {
            return Err(Error::Divider);
        }
        let interval = ((adc_clock.raw() as u64) << 8) / rate.raw() as u64;
        if interval < (ADC_CONVERSION_CYCLES as u64) << 8
            || interval > ((u16::MAX as u64 + 1) << 8) + 0xff
        {
            return Err(Error::Divider);
        }
        Ok(Self {
            divider: ((interval >> 8) - 1) as u16,
            divider_frac: (interval & 0xff) as u8,
            ..Default::default()
        })
    }

    /// Interval between conversion starts in 1/256 ADC clock cycles.
    pub fn interval(&self) -> u32 {
        if self.divider == 0 && self.divider_frac == 0 {
            ADC_CONVERSION_CYCLES << 8
        } else {
            ((1 + self.divider as u32) << 8) + self.divider_frac as u32
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.interval() < ADC_CONVERSION_CYCLES << 8 {
            return Err(Error::Divider);
        }
        Ok(())
    }

    /// Aggregate conversion rate at the given ADC clock.
    pub fn conversion_rate(&self, adc_clock: HertzU32) -> HertzU32 {
        let rate = ((adc_clock.raw() as u64) << 8) / self.interval() as u64;
        HertzU32::from_raw(rate as u32)
    }
}
