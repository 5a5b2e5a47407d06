//! DMA channel bookkeeping and control words
//!
//! # Design
//! Channels are plain indices into the DMA engine. [DmaChannels] owns the DMA
//! block and records which channels are in use, so that independent drivers
//! sharing the engine never program the same channel. A claim yields a
//! [ClaimedChannel] which is the only way to give the channel back.
//!
//! [ChannelConfig] describes a channel's `CTRL` word independent of the chip
//! and is encoded into the register layout of a [HardwareProfile] when the
//! channel is programmed.
use arbitrary_int::{u2, u4, u6};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::{
    pac,
    profile::HardwareProfile,
    registers::{Rp2040DmaCtrl, Rp2350DmaCtrl, TREQ_PERMANENT},
    Error,
};

/// A DMA channel index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Channel(u4);

impl Channel {
    /// Construct a channel index. Channels above 15 do not exist on any
    /// supported chip.
    pub const fn new(index: u8) -> Option<Self> {
        if index < 16 {
            Some(Self(u4::new(index)))
        } else {
            None
        }
    }

    pub const fn index(&self) -> u8 {
        self.0.value()
    }

    const fn mask(&self) -> u16 {
        1 << self.0.value()
    }
}

/// Size of a single DMA transfer.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum DataSize {
    Byte = 0,
    HalfWord = 1,
    Word = 2,
}

impl DataSize {
    pub const fn bytes(&self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => 4,
        }
    }
}

/// A DMA channel claimed from [DmaChannels].
///
/// Only [DmaChannels] hands these out and returning one consumes it, so a
/// channel cannot be released by a driver that does not hold it.
#[derive(Debug, PartialEq, Eq)]
pub struct ClaimedChannel(Channel);

impl ClaimedChannel {
    pub fn channel(&self) -> Channel {
        self.0
    }

    pub fn index(&self) -> u8 {
        self.0.index()
    }
}

/// Ownership record of the channels of the DMA engine.
///
/// Owns the DMA block of the peripheral access crate. Drivers sharing the
/// engine program only the channels they have claimed.
#[derive(Debug)]
pub struct DmaChannels {
    _dma: pac::DMA,
    claimed: u16,
    count: u8,
}

impl DmaChannels {
    /// Start with every channel of the active profile free.
    pub fn new(dma: pac::DMA) -> Self {
        Self {
            _dma: dma,
            claimed: 0,
            count: HardwareProfile::ACTIVE.dma_channels(),
        }
    }

    /// Claim a specific channel, e.g. one hard-wired into another driver.
    pub fn claim(&mut self, index: u8) -> Result<ClaimedChannel, Error> {
        let channel = Channel::new(index)
            .filter(|_| index < self.count)
            .ok_or(Error::InvalidChannel(index))?;
        if self.claimed & channel.mask() != 0 {
            return Err(Error::ChannelClaimed(index));
        }
        self.claimed |= channel.mask();
        Ok(ClaimedChannel(channel))
    }

    /// Claim the lowest-numbered free channel.
    pub fn claim_unused(&mut self) -> Result<ClaimedChannel, Error> {
        let index = (0..self.count)
            .find(|&i| self.claimed & (1 << i) == 0)
            .ok_or(Error::NoFreeChannel)?;
        self.claim(index)
    }

    /// Return a channel to the pool. The channel must not be running.
    pub fn unclaim(&mut self, channel: ClaimedChannel) {
        self.claimed &= !channel.0.mask();
    }

    pub fn is_claimed(&self, index: u8) -> bool {
        index < 16 && self.claimed & (1 << index) != 0
    }

    /// Number of free channels.
    pub fn available(&self) -> u8 {
        self.count - self.claimed.count_ones() as u8
    }
}

/// Chip-neutral description of a DMA channel control word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub enable: bool,
    pub high_priority: bool,
    pub data_size: DataSize,
    pub incr_read: bool,
    pub incr_write: bool,
    /// Channel triggered when this one completes. Chaining a channel to
    /// itself disables chaining.
    pub chain_to: Channel,
    /// Transfer request signal pacing the channel.
    pub dreq: u8,
    pub irq_quiet: bool,
}

impl ChannelConfig {
    /// Default control word for `channel`: enabled, 32-bit transfers with an
    /// incrementing read address, unpaced and not chained.
    pub fn new(channel: Channel) -> Self {
        Self {
            enable: true,
            high_priority: false,
            data_size: DataSize::Word,
            incr_read: true,
            incr_write: false,
            chain_to: channel,
            dreq: TREQ_PERMANENT,
            irq_quiet: false,
        }
    }

    pub fn data_size(mut self, size: DataSize) -> Self {
        self.data_size = size;
        self
    }

    pub fn incr_read(mut self, incr: bool) -> Self {
        self.incr_read = incr;
        self
    }

    pub fn incr_write(mut self, incr: bool) -> Self {
        self.incr_write = incr;
        self
    }

    pub fn dreq(mut self, dreq: u8) -> Self {
        self.dreq = dreq;
        self
    }

    pub fn chain_to(mut self, channel: Channel) -> Self {
        self.chain_to = channel;
        self
    }

    pub fn high_priority(mut self, high: bool) -> Self {
        self.high_priority = high;
        self
    }

    pub fn irq_quiet(mut self, quiet: bool) -> Self {
        self.irq_quiet = quiet;
        self
    }

    pub fn enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }

    /// Encode into the `CTRL` layout of `profile`.
    pub fn encode(&self, profile: HardwareProfile) -> u32 {
        let size = u2::new(self.data_size.into());
        let treq = u6::new(self.dreq & 0x3f);
        match profile {
            HardwareProfile::Rp2040 => Rp2040DmaCtrl::DEFAULT
                .with_en(self.enable)
                .with_high_priority(self.high_priority)
                .with_data_size(size)
                .with_incr_read(self.incr_read)
                .with_incr_write(self.incr_write)
                .with_chain_to(self.chain_to.0)
                .with_treq_sel(treq)
                .with_irq_quiet(self.irq_quiet)
                .raw_value(),
            HardwareProfile::Rp2350b => Rp2350DmaCtrl::DEFAULT
                .with_en(self.enable)
                .with_high_priority(self.high_priority)
                .with_data_size(size)
                .with_incr_read(self.incr_read)
                .with_incr_write(self.incr_write)
                .with_chain_to(self.chain_to.0)
                .with_treq_sel(treq)
                .with_irq_quiet(self.irq_quiet)
                .raw_value(),
        }
    }

    /// Decode a `CTRL` word read back from `profile`. Returns `None` for the
    /// reserved data size encoding.
    pub fn decode(profile: HardwareProfile, raw: u32) -> Option<Self> {
        let (en, high, size, incr_read, incr_write, chain, treq, quiet) =
            match profile {
                HardwareProfile::Rp2040 => {
                    let c = Rp2040DmaCtrl::new_with_raw_value(raw);
                    (
                        c.en(),
                        c.high_priority(),
                        c.data_size(),
                        c.incr_read(),
                        c.incr_write(),
                        c.chain_to(),
                        c.treq_sel(),
                        c.irq_quiet(),
                    )
                }
                HardwareProfile::Rp2350b => {
                    let c = Rp2350DmaCtrl::new_with_raw_value(raw);
                    (
                        c.en(),
                        c.high_priority(),
                        c.data_size(),
                        c.incr_read(),
                        c.incr_write(),
                        c.chain_to(),
                        c.treq_sel(),
                        c.irq_quiet(),
                    )
                }
            };
        Some(Self {
            enable: en,
            high_priority: high,
            data_size: DataSize::try_from(size.value()).ok()?,
            incr_read,
            incr_write,
            chain_to: Channel(chain),
            dreq: treq.value(),
            irq_quiet: quiet,
        })
    }
}
