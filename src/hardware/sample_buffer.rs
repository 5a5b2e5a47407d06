//! Hardware-refreshed sample storage
//!
//! # Design
//! The sample buffer is written by the DMA engine and read by software. The
//! hardware writer cannot be blocked, so no lock guards the buffer. Every slot
//! is an [AtomicU16] with the same in-memory representation as the `u16` the
//! DMA engine writes: a read of one slot always returns a complete sample,
//! but a read of several slots may mix samples from different round-robin
//! passes.
//!
//! The pointer table holds the bus address of the sample buffer. The DMA
//! control channel copies it into the sampling channel's write address at the
//! end of every pass.
use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use super::design_parameters::{
    ADC_REFERENCE_VOLTS, ADC_RESOLUTION_BITS, NUM_ADC_INPUTS,
};

/// A raw ADC conversion result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AdcCode(pub u16);

impl AdcCode {
    /// Convert to volts given the ADC reference voltage.
    pub fn to_volts(self, reference: f32) -> f32 {
        self.0 as f32 * reference / (1u32 << ADC_RESOLUTION_BITS) as f32
    }
}

impl From<AdcCode> for f32 {
    /// Convert raw ADC codes to voltage levels at the nominal reference.
    fn from(code: AdcCode) -> f32 {
        code.to_volts(ADC_REFERENCE_VOLTS)
    }
}

/// One slot per ADC input, refreshed by DMA.
#[repr(C, align(16))]
pub struct SampleBuffer<const N: usize = NUM_ADC_INPUTS> {
    slots: [AtomicU16; N],
}

impl<const N: usize> SampleBuffer<N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU16::new(0) }; N],
        }
    }

    /// A read-only handle for a consumer of the samples.
    pub fn reader(&self) -> SampleReader<'_, N> {
        SampleReader { buffer: self }
    }

    /// The bus address the DMA engine writes slot 0 to.
    pub fn dma_address(&self) -> u32 {
        self.slots.as_ptr() as usize as u32
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    // Only the DMA engine writes slots; the hardware model in the tests
    // stands in for it.
    #[cfg(test)]
    pub(crate) fn slot(&self, index: usize) -> Option<&AtomicU16> {
        self.slots.get(index)
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [SampleBuffer].
#[derive(Copy, Clone)]
pub struct SampleReader<'a, const N: usize = NUM_ADC_INPUTS> {
    buffer: &'a SampleBuffer<N>,
}

impl<'a, const N: usize> SampleReader<'a, N> {
    /// The most recent sample of ADC input `input`.
    pub fn get(&self, input: usize) -> Option<AdcCode> {
        self.buffer
            .slots
            .get(input)
            .map(|slot| AdcCode(slot.load(Ordering::Relaxed)))
    }

    /// Copy out all slots.
    ///
    /// # Note
    /// The DMA engine keeps writing while the slots are copied, so the
    /// snapshot may combine samples from two consecutive passes.
    pub fn snapshot(&self) -> [AdcCode; N] {
        core::array::from_fn(|i| {
            AdcCode(self.buffer.slots[i].load(Ordering::Relaxed))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = AdcCode> + 'a {
        let buffer = self.buffer;
        buffer
            .slots
            .iter()
            .map(|slot| AdcCode(slot.load(Ordering::Relaxed)))
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

/// The single-entry table the DMA control channel reads the sample buffer
/// address from.
pub struct PointerTable {
    entries: [AtomicU32; 1],
}

impl PointerTable {
    pub const fn new() -> Self {
        Self {
            entries: [AtomicU32::new(0)],
        }
    }

    /// Point the table at `buffer`.
    pub fn point_at<const N: usize>(&self, buffer: &SampleBuffer<N>) {
        self.entries[0].store(buffer.dma_address(), Ordering::Release);
    }

    /// The bus address currently stored in the table.
    pub fn target(&self) -> u32 {
        self.entries[0].load(Ordering::Acquire)
    }

    /// The bus address of the table itself.
    pub fn dma_address(&self) -> u32 {
        self.entries.as_ptr() as usize as u32
    }
}

impl Default for PointerTable {
    fn default() -> Self {
        Self::new()
    }
}
