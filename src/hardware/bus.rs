//! Peripheral register access
//!
//! All register traffic of the sampler goes through [RegisterBus] so the
//! sequencing can be exercised against a model of the hardware.
use super::{pac, registers};

/// Word access to peripheral registers by 32-bit bus address.
pub trait RegisterBus {
    fn read(&mut self, address: u32) -> u32;

    fn write(&mut self, address: u32, value: u32);

    /// Read-modify-write of a single register.
    fn modify(&mut self, address: u32, f: impl FnOnce(u32) -> u32) {
        let value = self.read(address);
        self.write(address, f(value));
    }
}

impl<T: RegisterBus> RegisterBus for &mut T {
    fn read(&mut self, address: u32) -> u32 {
        (**self).read(address)
    }

    fn write(&mut self, address: u32, value: u32) {
        (**self).write(address, value)
    }
}

/// Memory-mapped register access on the target.
///
/// Accesses are restricted to the ADC, DMA, IO_BANK0 and PADS_BANK0 blocks.
pub struct Mmio {
    _adc: pac::ADC,
}

impl Mmio {
    /// Construct the memory-mapped register bus.
    ///
    /// # Args
    /// * `adc` - The ADC block, owned by the sampler from here on.
    ///
    /// # Safety
    /// The IO and pad registers of the sampled ADC pins must not be used by
    /// another driver. DMA channel registers are only written for channels
    /// claimed from [DmaChannels](super::DmaChannels).
    pub unsafe fn new(adc: pac::ADC) -> Self {
        Self { _adc: adc }
    }

    fn check(address: u32) {
        assert!(
            address % 4 == 0 && registers::is_sampler_register(address),
            "Register access outside the sampler blocks: {:#010x}",
            address
        );
    }
}

impl RegisterBus for Mmio {
    fn read(&mut self, address: u32) -> u32 {
        Self::check(address);
        // Note(unsafe): The address is an aligned register of a block driven
        // by the sampler.
        unsafe { core::ptr::read_volatile(address as usize as *const u32) }
    }

    fn write(&mut self, address: u32, value: u32) {
        Self::check(address);
        // Note(unsafe): See `read()`. Ownership of the registers is asserted
        // by the caller of `Mmio::new`.
        unsafe {
            core::ptr::write_volatile(address as usize as *mut u32, value)
        }
    }
}
