//! Module for all hardware-specific setup of the ADC/DMA sampler
#[cfg(feature = "rp2040")]
pub use rp2040_pac as pac;
#[cfg(all(feature = "rp2350b", not(feature = "rp2040")))]
pub use rp235x_pac as pac;

pub mod adc;
pub mod bus;
pub mod configuration;
pub mod design_parameters;
pub mod dma;
mod error;
pub mod profile;
pub mod registers;
mod sample_buffer;
mod sampler;

#[cfg(test)]
mod sim;

pub use bus::{Mmio, RegisterBus};
pub use configuration::SamplerConfig;
pub use dma::{Channel, ClaimedChannel, DmaChannels};
pub use error::Error;
pub use profile::HardwareProfile;
pub use sample_buffer::*;
pub use sampler::*;
