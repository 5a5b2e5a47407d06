//! Register addresses and field layouts of the ADC, DMA, IO_BANK0 and
//! PADS_BANK0 blocks
//!
//! # Design
//! Register addresses come from the peripheral access crate of the active
//! chip. Register traffic itself goes through a [RegisterBus](super::bus)
//! on those addresses, so the field layouts are [bitbybit] bitfields over the
//! raw words. Where a layout differs between chips, a chip-neutral field
//! struct ([AdcControl]) is encoded into the layout of the requested
//! [HardwareProfile].
use core::mem::size_of;

use arbitrary_int::{u2, u3, u4, u5, u6, u9};
use bitbybit::bitfield;
use strum::EnumIter;

use super::{dma::Channel, pac, profile::HardwareProfile};

/// ADC registers used by the sampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum AdcRegister {
    Cs,
    Fcs,
    Fifo,
    Div,
}

/// DMA channel registers used by the sampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum ChannelRegister {
    ReadAddr,
    WriteAddr,
    TransCount,
    CtrlTrig,
    Al1Ctrl,
    Al2WriteAddrTrig,
}

impl ChannelRegister {
    /// Whether a write starts the channel.
    pub const fn is_trigger(&self) -> bool {
        matches!(self, Self::CtrlTrig | Self::Al2WriteAddrTrig)
    }
}

fn address<T>(register: &T) -> u32 {
    register as *const T as usize as u32
}

fn block<T>(ptr: *const T) -> core::ops::Range<u32> {
    let base = ptr as usize as u32;
    base..base + size_of::<T>() as u32
}

// Note(unsafe): The register blocks are only used to compute addresses and
// are never accessed through the returned references.
fn adc() -> &'static pac::adc::RegisterBlock {
    unsafe { &*pac::ADC::ptr() }
}

fn dma() -> &'static pac::dma::RegisterBlock {
    unsafe { &*pac::DMA::ptr() }
}

fn io_bank0() -> &'static pac::io_bank0::RegisterBlock {
    unsafe { &*pac::IO_BANK0::ptr() }
}

fn pads_bank0() -> &'static pac::pads_bank0::RegisterBlock {
    unsafe { &*pac::PADS_BANK0::ptr() }
}

pub fn adc_register(register: AdcRegister) -> u32 {
    let adc = adc();
    match register {
        AdcRegister::Cs => address(adc.cs()),
        AdcRegister::Fcs => address(adc.fcs()),
        AdcRegister::Fifo => address(adc.fifo()),
        AdcRegister::Div => address(adc.div()),
    }
}

/// Address of `register` of DMA channel `channel`. The channel must exist
/// on the active chip.
pub fn dma_channel(channel: Channel, register: ChannelRegister) -> u32 {
    let ch = dma().ch(channel.index() as usize);
    match register {
        ChannelRegister::ReadAddr => address(ch.ch_read_addr()),
        ChannelRegister::WriteAddr => address(ch.ch_write_addr()),
        ChannelRegister::TransCount => address(ch.ch_trans_count()),
        ChannelRegister::CtrlTrig => address(ch.ch_ctrl_trig()),
        ChannelRegister::Al1Ctrl => address(ch.ch_al1_ctrl()),
        ChannelRegister::Al2WriteAddrTrig => {
            address(ch.ch_al2_write_addr_trig())
        }
    }
}

pub fn dma_chan_abort() -> u32 {
    address(dma().chan_abort())
}

/// `GPIOx_CTRL` in IO_BANK0.
pub fn gpio_ctrl(pin: u8) -> u32 {
    address(io_bank0().gpio(pin as usize).gpio_ctrl())
}

/// `GPIOx` pad control in PADS_BANK0.
pub fn pad(pin: u8) -> u32 {
    address(pads_bank0().gpio(pin as usize))
}

/// Whether `address` lies in one of the blocks the sampler drives.
pub fn is_sampler_register(address: u32) -> bool {
    [
        block(pac::ADC::ptr()),
        block(pac::DMA::ptr()),
        block(pac::IO_BANK0::ptr()),
        block(pac::PADS_BANK0::ptr()),
    ]
    .iter()
    .any(|range| range.contains(&address))
}

/// `TREQ_SEL` value for an unpaced channel.
pub const TREQ_PERMANENT: u8 = 0x3f;

/// `GPIOx_CTRL.FUNCSEL` value that disconnects all digital functions.
pub const GPIO_FUNC_NULL: u8 = 0x1f;

/// DMA `CTRL_TRIG` on the RP2040.
#[bitfield(u32, default = 0)]
pub struct Rp2040DmaCtrl {
    #[bit(31, r)]
    pub ahb_error: bool,
    #[bit(24, r)]
    pub busy: bool,
    #[bit(21, rw)]
    pub irq_quiet: bool,
    #[bits(15..=20, rw)]
    pub treq_sel: u6,
    #[bits(11..=14, rw)]
    pub chain_to: u4,
    #[bit(5, rw)]
    pub incr_write: bool,
    #[bit(4, rw)]
    pub incr_read: bool,
    #[bits(2..=3, rw)]
    pub data_size: u2,
    #[bit(1, rw)]
    pub high_priority: bool,
    #[bit(0, rw)]
    pub en: bool,
}

/// DMA `CTRL_TRIG` on the RP2350. Address decrement (`*_REV`) is not used.
#[bitfield(u32, default = 0)]
pub struct Rp2350DmaCtrl {
    #[bit(31, r)]
    pub ahb_error: bool,
    #[bit(26, r)]
    pub busy: bool,
    #[bit(23, rw)]
    pub irq_quiet: bool,
    #[bits(17..=22, rw)]
    pub treq_sel: u6,
    #[bits(13..=16, rw)]
    pub chain_to: u4,
    #[bit(6, rw)]
    pub incr_write: bool,
    #[bit(4, rw)]
    pub incr_read: bool,
    #[bits(2..=3, rw)]
    pub data_size: u2,
    #[bit(1, rw)]
    pub high_priority: bool,
    #[bit(0, rw)]
    pub en: bool,
}

/// ADC `CS` on the RP2040.
#[bitfield(u32, default = 0)]
pub struct Rp2040AdcCs {
    #[bits(16..=20, rw)]
    pub rrobin: u5,
    #[bits(12..=14, rw)]
    pub ainsel: u3,
    #[bit(10, rw)]
    pub err_sticky: bool,
    #[bit(9, r)]
    pub err: bool,
    #[bit(8, r)]
    pub ready: bool,
    #[bit(3, rw)]
    pub start_many: bool,
    #[bit(2, rw)]
    pub start_once: bool,
    #[bit(1, rw)]
    pub ts_en: bool,
    #[bit(0, rw)]
    pub en: bool,
}

/// ADC `CS` on the RP2350.
#[bitfield(u32, default = 0)]
pub struct Rp2350AdcCs {
    #[bits(16..=24, rw)]
    pub rrobin: u9,
    #[bits(12..=15, rw)]
    pub ainsel: u4,
    #[bit(10, rw)]
    pub err_sticky: bool,
    #[bit(9, r)]
    pub err: bool,
    #[bit(8, r)]
    pub ready: bool,
    #[bit(3, rw)]
    pub start_many: bool,
    #[bit(2, rw)]
    pub start_once: bool,
    #[bit(1, rw)]
    pub ts_en: bool,
    #[bit(0, rw)]
    pub en: bool,
}

/// ADC `FCS`, identical on both chips.
#[bitfield(u32, default = 0)]
pub struct AdcFcs {
    #[bits(24..=27, rw)]
    pub thresh: u4,
    #[bits(16..=19, r)]
    pub level: u4,
    #[bit(11, rw)]
    pub over: bool,
    #[bit(10, rw)]
    pub under: bool,
    #[bit(9, r)]
    pub full: bool,
    #[bit(8, r)]
    pub empty: bool,
    #[bit(3, rw)]
    pub dreq_en: bool,
    #[bit(2, rw)]
    pub err: bool,
    #[bit(1, rw)]
    pub shift: bool,
    #[bit(0, rw)]
    pub en: bool,
}

/// ADC `DIV`, identical on both chips.
#[bitfield(u32, default = 0)]
pub struct AdcDiv {
    #[bits(8..=23, rw)]
    pub int: u16,
    #[bits(0..=7, rw)]
    pub frac: u8,
}

/// PADS_BANK0 `GPIOx`. `ISO` is reserved on the RP2040 and reads as zero.
#[bitfield(u32, default = 0)]
pub struct PadControl {
    #[bit(8, rw)]
    pub iso: bool,
    #[bit(7, rw)]
    pub od: bool,
    #[bit(6, rw)]
    pub ie: bool,
    #[bits(4..=5, rw)]
    pub drive: u2,
    #[bit(3, rw)]
    pub pue: bool,
    #[bit(2, rw)]
    pub pde: bool,
    #[bit(1, rw)]
    pub schmitt: bool,
    #[bit(0, rw)]
    pub slewfast: bool,
}

/// IO_BANK0 `GPIOx_CTRL`. Only the function select is used.
#[bitfield(u32, default = 0)]
pub struct GpioControl {
    #[bits(0..=4, rw)]
    pub funcsel: u5,
}

/// Chip-neutral view of the ADC `CS` register.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AdcControl {
    pub en: bool,
    pub ts_en: bool,
    pub start_many: bool,
    pub ready: bool,
    pub ainsel: u8,
    pub rrobin: u16,
}

impl AdcControl {
    /// Encode into the `CS` layout of `profile`. Fields wider than the
    /// target layout are truncated.
    pub fn encode(&self, profile: HardwareProfile) -> u32 {
        match profile {
            HardwareProfile::Rp2040 => Rp2040AdcCs::DEFAULT
                .with_en(self.en)
                .with_ts_en(self.ts_en)
                .with_start_many(self.start_many)
                .with_ainsel(u3::new(self.ainsel & 0x7))
                .with_rrobin(u5::new((self.rrobin & 0x1f) as u8))
                .raw_value(),
            HardwareProfile::Rp2350b => Rp2350AdcCs::DEFAULT
                .with_en(self.en)
                .with_ts_en(self.ts_en)
                .with_start_many(self.start_many)
                .with_ainsel(u4::new(self.ainsel & 0xf))
                .with_rrobin(u9::new(self.rrobin & 0x1ff))
                .raw_value(),
        }
    }

    pub fn decode(profile: HardwareProfile, raw: u32) -> Self {
        match profile {
            HardwareProfile::Rp2040 => {
                let cs = Rp2040AdcCs::new_with_raw_value(raw);
                Self {
                    en: cs.en(),
                    ts_en: cs.ts_en(),
                    start_many: cs.start_many(),
                    ready: cs.ready(),
                    ainsel: cs.ainsel().value(),
                    rrobin: cs.rrobin().value() as u16,
                }
            }
            HardwareProfile::Rp2350b => {
                let cs = Rp2350AdcCs::new_with_raw_value(raw);
                Self {
                    en: cs.en(),
                    ts_en: cs.ts_en(),
                    start_many: cs.start_many(),
                    ready: cs.ready(),
                    ainsel: cs.ainsel().value(),
                    rrobin: cs.rrobin().value(),
                }
            }
        }
    }
}
