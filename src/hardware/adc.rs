//! ADC free-running round-robin configuration
//!
//! # Design
//! The ADC is run in free-running mode (`START_MANY`) with the round-robin
//! mask covering the sampled inputs, starting at input 0. Every conversion
//! result is pushed into the result FIFO, which raises the ADC DMA request as
//! soon as it holds a single sample. The DMA sampling channel therefore sees
//! the results in input order, one per conversion.
//!
//! Inputs that are wired to GPIO pins need their pads in analog mode: digital
//! function disconnected, pulls and input buffer disabled and, on the RP2350,
//! pad isolation removed. The input following the GPIO inputs is the
//! temperature sensor, powered through `TS_EN` when it is part of the
//! round-robin.
use arbitrary_int::{u4, u5};

use super::{
    bus::RegisterBus,
    configuration::SamplerConfig,
    design_parameters::{ADC_FIFO_THRESHOLD, ADC_READY_POLLS},
    profile::HardwareProfile,
    registers::{
        self, AdcControl, AdcDiv, AdcFcs, AdcRegister, GpioControl,
        PadControl, GPIO_FUNC_NULL,
    },
    Error,
};

// Upper bound on FIFO entries read while draining; the FIFO is shallower.
const FIFO_DRAIN_LIMIT: usize = 16;

/// Round-robin mask selecting ADC inputs `0..inputs`.
pub const fn round_robin_mask(inputs: usize) -> u16 {
    ((1u32 << inputs) - 1) as u16
}

/// Register-level driver of the ADC block.
pub struct Adc<'a, B> {
    bus: &'a mut B,
    profile: HardwareProfile,
}

impl<'a, B: RegisterBus> Adc<'a, B> {
    pub fn new(bus: &'a mut B, profile: HardwareProfile) -> Self {
        Self { bus, profile }
    }

    /// Bus address of the result FIFO, the read address of the sampling
    /// channel.
    pub fn fifo_address(&self) -> u32 {
        registers::adc_register(AdcRegister::Fifo)
    }

    fn control(&mut self) -> AdcControl {
        let cs = registers::adc_register(AdcRegister::Cs);
        AdcControl::decode(self.profile, self.bus.read(cs))
    }

    fn set_control(&mut self, control: AdcControl) {
        let cs = registers::adc_register(AdcRegister::Cs);
        self.bus.write(cs, control.encode(self.profile));
    }

    /// Put the pads of the first `inputs` ADC inputs into analog mode.
    ///
    /// The digital function is disconnected before pad isolation is removed.
    pub fn select_analog_pins(&mut self, inputs: usize) {
        let profile = self.profile;
        for pin in (0..inputs).filter_map(|input| profile.pin(input)) {
            self.bus.write(
                registers::gpio_ctrl(pin),
                GpioControl::DEFAULT
                    .with_funcsel(u5::new(GPIO_FUNC_NULL))
                    .raw_value(),
            );
            self.bus.modify(registers::pad(pin), |raw| {
                PadControl::new_with_raw_value(raw)
                    .with_pue(false)
                    .with_pde(false)
                    .with_ie(false)
                    .with_od(false)
                    .with_iso(false)
                    .raw_value()
            });
            log::debug!("GPIO{} in analog mode", pin);
        }
    }

    /// Power up the ADC and wait for it to become ready.
    pub fn enable(&mut self) -> Result<(), Error> {
        self.set_control(AdcControl {
            en: true,
            ..Default::default()
        });
        for _ in 0..ADC_READY_POLLS {
            if self.control().ready {
                return Ok(());
            }
        }
        Err(Error::AdcNotReady)
    }

    /// Empty the result FIFO. Returns the number of discarded results.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while drained < FIFO_DRAIN_LIMIT {
            let raw = self.bus.read(registers::adc_register(AdcRegister::Fcs));
            if AdcFcs::new_with_raw_value(raw).empty() {
                break;
            }
            self.bus.read(registers::adc_register(AdcRegister::Fifo));
            drained += 1;
        }
        drained
    }

    /// Enable the result FIFO with DMA requests at a fill level of one.
    pub fn configure_fifo(&mut self, shift_8bit: bool) {
        let fcs = registers::adc_register(AdcRegister::Fcs);
        self.bus.write(fcs, AdcFcs::DEFAULT.raw_value());
        let drained = self.drain();
        if drained > 0 {
            log::debug!("Discarded {} stale ADC results", drained);
        }
        self.bus.write(
            fcs,
            AdcFcs::DEFAULT
                .with_en(true)
                .with_dreq_en(true)
                .with_thresh(u4::new(ADC_FIFO_THRESHOLD))
                .with_shift(shift_8bit)
                .with_err(false)
                // Write-one-to-clear stale overflow and underflow flags.
                .with_over(true)
                .with_under(true)
                .raw_value(),
        );
    }

    /// Disable the FIFO and its DMA request and discard its contents.
    pub fn disable_fifo(&mut self) {
        let fcs = registers::adc_register(AdcRegister::Fcs);
        self.bus.write(fcs, AdcFcs::DEFAULT.raw_value());
        self.drain();
    }

    pub fn set_divider(&mut self, config: &SamplerConfig) {
        let div = registers::adc_register(AdcRegister::Div);
        self.bus.write(
            div,
            AdcDiv::DEFAULT
                .with_int(config.divider)
                .with_frac(config.divider_frac)
                .raw_value(),
        );
    }

    /// Round-robin over inputs `0..inputs`, starting at input 0. Free-running
    /// conversion is left stopped.
    pub fn set_round_robin(&mut self, inputs: usize) {
        let ts_en = inputs > self.profile.temperature_input();
        self.set_control(AdcControl {
            en: true,
            ts_en,
            start_many: false,
            ainsel: 0,
            rrobin: round_robin_mask(inputs),
            ..Default::default()
        });
    }

    pub fn set_free_running(&mut self, run: bool) {
        let control = self.control();
        self.set_control(AdcControl {
            start_many: run,
            ..control
        });
    }

    pub fn is_free_running(&mut self) -> bool {
        self.control().start_many
    }
}
