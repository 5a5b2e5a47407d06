//! Free-running, round-robin ADC sampling into memory via chained DMA on the
//! RP2040 and RP2350B.
//!
//! # Example
//! ```no_run
//! use adcless::hardware::{
//!     pac, AdcSampler, DmaChannels, Mmio, PointerTable, SampleBuffer,
//!     SamplerConfig,
//! };
//!
//! // Sample the first four inputs. RP2040 builds must pick N <= 5.
//! static SAMPLES: SampleBuffer<4> = SampleBuffer::new();
//! static SAMPLES_PTR: PointerTable = PointerTable::new();
//!
//! fn start(p: pac::Peripherals) {
//!     let mut channels = DmaChannels::new(p.DMA);
//!     // Note(unsafe): The ADC pins are not used elsewhere.
//!     let bus = unsafe { Mmio::new(p.ADC) };
//!     let sampler = AdcSampler::new(bus, &SAMPLES, &SAMPLES_PTR)
//!         .configure(&mut channels, &SamplerConfig::default())
//!         .unwrap();
//!
//!     let reader = sampler.reader();
//!     let latest = reader.get(0);
//! }
//! ```
#![no_std]

pub mod hardware;
