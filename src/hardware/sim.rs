//! Register-level model of the ADC and DMA blocks
//!
//! The model implements [RegisterBus] and reproduces the behaviour the
//! sampler relies on: trigger aliases, transfer count reload, DREQ pacing by
//! the ADC FIFO, chaining and channel abort. Memory accesses of the DMA engine
//! are resolved against the sample buffer and pointer table under test.
extern crate std;

use core::sync::atomic::Ordering;
use std::{cell::RefCell, collections::BTreeMap, collections::VecDeque};
use std::{rc::Rc, vec::Vec};

use strum::IntoEnumIterator;

use super::{
    bus::RegisterBus,
    dma::{Channel, ChannelConfig, DataSize},
    profile::HardwareProfile,
    registers::{
        self, AdcControl, AdcDiv, AdcFcs, AdcRegister, ChannelRegister,
        TREQ_PERMANENT,
    },
    sample_buffer::{PointerTable, SampleBuffer},
};

const FIFO_DEPTH: usize = 4;
const DMA_CHANNELS: usize = 16;

#[derive(Copy, Clone, Debug, Default)]
struct DmaChannel {
    read: u32,
    write: u32,
    reload: u32,
    remaining: u32,
    ctrl: u32,
    busy: bool,
    triggers: usize,
    transfers: usize,
}

enum Field {
    Read,
    Write,
    Count,
    Ctrl,
}

struct Model<const N: usize> {
    profile: HardwareProfile,
    channel_registers: BTreeMap<u32, (usize, ChannelRegister)>,
    buffer: &'static SampleBuffer<N>,
    table: &'static PointerTable,
    registers: BTreeMap<u32, u32>,
    register_writes: Vec<u32>,
    channels: [DmaChannel; DMA_CHANNELS],
    cs: AdcControl,
    fcs: u32,
    div: u32,
    fifo: VecDeque<u16>,
    levels: [u16; 16],
    adc_ready: bool,
    abort_stuck: bool,
    pass_transfers: usize,
    passes: Vec<usize>,
}

/// Shared handle to the hardware model. Clones refer to the same model, so a
/// test keeps one handle while the sampler owns another.
#[derive(Clone)]
pub struct Silicon<const N: usize>(Rc<RefCell<Model<N>>>);

impl<const N: usize> Silicon<N> {
    pub fn new(
        buffer: &'static SampleBuffer<N>,
        table: &'static PointerTable,
    ) -> Self {
        let profile = HardwareProfile::ACTIVE;
        let mut channel_registers = BTreeMap::new();
        for index in 0..profile.dma_channels() {
            let Some(channel) = Channel::new(index) else {
                continue;
            };
            for register in ChannelRegister::iter() {
                channel_registers.insert(
                    registers::dma_channel(channel, register),
                    (index as usize, register),
                );
            }
        }
        Self(Rc::new(RefCell::new(Model {
            profile,
            channel_registers,
            buffer,
            table,
            registers: BTreeMap::new(),
            register_writes: Vec::new(),
            channels: [DmaChannel::default(); DMA_CHANNELS],
            cs: AdcControl::default(),
            fcs: 0,
            div: 0,
            fifo: VecDeque::new(),
            levels: [0; 16],
            adc_ready: true,
            abort_stuck: false,
            pass_transfers: 0,
            passes: Vec::new(),
        })))
    }

    /// Set the code the ADC converts on `input`.
    pub fn set_level(&self, input: usize, code: u16) {
        self.0.borrow_mut().levels[input] = code;
    }

    pub fn set_adc_ready(&self, ready: bool) {
        self.0.borrow_mut().adc_ready = ready;
    }

    pub fn set_abort_stuck(&self, stuck: bool) {
        self.0.borrow_mut().abort_stuck = stuck;
    }

    /// Push a result into the FIFO without a conversion, e.g. a leftover of
    /// earlier use of the ADC.
    pub fn push_stale_result(&self, code: u16) {
        self.0.borrow_mut().fifo.push_back(code);
    }

    /// Run `count` ADC clock conversion slots.
    pub fn convert(&self, count: usize) {
        let mut model = self.0.borrow_mut();
        for _ in 0..count {
            model.convert();
        }
    }

    /// Run enough conversions for `passes` full round-robin passes.
    pub fn run_passes(&self, passes: usize) {
        self.convert(passes * N);
    }

    /// Number of sampling channel transfers in every completed pass.
    pub fn passes(&self) -> Vec<usize> {
        self.0.borrow().passes.clone()
    }

    pub fn triggers(&self, channel: u8) -> usize {
        self.0.borrow().channels[channel as usize].triggers
    }

    pub fn transfers(&self, channel: u8) -> usize {
        self.0.borrow().channels[channel as usize].transfers
    }

    /// Current write address of a DMA channel.
    pub fn write_address(&self, channel: u8) -> u32 {
        self.0.borrow().channels[channel as usize].write
    }

    pub fn busy(&self, channel: u8) -> bool {
        self.0.borrow().channels[channel as usize].busy
    }

    pub fn fifo_len(&self) -> usize {
        self.0.borrow().fifo.len()
    }

    pub fn adc_control(&self) -> AdcControl {
        self.0.borrow().cs
    }

    pub fn fcs(&self) -> AdcFcs {
        AdcFcs::new_with_raw_value(self.0.borrow().fcs)
    }

    pub fn div(&self) -> AdcDiv {
        AdcDiv::new_with_raw_value(self.0.borrow().div)
    }

    pub fn channel_config(&self, channel: u8) -> Option<ChannelConfig> {
        let model = self.0.borrow();
        ChannelConfig::decode(
            model.profile,
            model.channels[channel as usize].ctrl,
        )
    }

    /// Addresses of the writes to registers outside the ADC and DMA blocks,
    /// in order.
    pub fn register_writes(&self) -> Vec<u32> {
        self.0.borrow().register_writes.clone()
    }

    /// Raw value of a register outside the ADC and DMA blocks.
    pub fn register(&self, address: u32) -> u32 {
        self.0
            .borrow()
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0)
    }
}

impl<const N: usize> RegisterBus for Silicon<N> {
    fn read(&mut self, address: u32) -> u32 {
        self.0.borrow_mut().read(address)
    }

    fn write(&mut self, address: u32, value: u32) {
        self.0.borrow_mut().write(address, value)
    }
}

impl<const N: usize> Model<N> {
    fn channel_register(
        &self,
        address: u32,
    ) -> Option<(usize, ChannelRegister)> {
        self.channel_registers.get(&address).copied()
    }

    fn field(register: ChannelRegister) -> Field {
        match register {
            ChannelRegister::ReadAddr => Field::Read,
            ChannelRegister::WriteAddr
            | ChannelRegister::Al2WriteAddrTrig => Field::Write,
            ChannelRegister::TransCount => Field::Count,
            ChannelRegister::CtrlTrig | ChannelRegister::Al1Ctrl => {
                Field::Ctrl
            }
        }
    }

    fn busy_bit(&self) -> u32 {
        match self.profile {
            HardwareProfile::Rp2040 => 1 << 24,
            HardwareProfile::Rp2350b => 1 << 26,
        }
    }

    fn read(&mut self, address: u32) -> u32 {
        if let Some((ch, register)) = self.channel_register(address) {
            let channel = &self.channels[ch];
            return match Self::field(register) {
                Field::Read => channel.read,
                Field::Write => channel.write,
                Field::Count => channel.remaining,
                Field::Ctrl => {
                    channel.ctrl
                        | if channel.busy { self.busy_bit() } else { 0 }
                }
            };
        }
        if address == registers::dma_chan_abort() {
            return if self.abort_stuck { 0b11 } else { 0 };
        }
        if address == registers::adc_register(AdcRegister::Cs) {
            let mut cs = self.cs;
            cs.ready = cs.en && self.adc_ready;
            // READY is read-only; set it on the raw value.
            return cs.encode(self.profile) | ((cs.ready as u32) << 8);
        }
        if address == registers::adc_register(AdcRegister::Fcs) {
            let level = self.fifo.len() as u32;
            return self.fcs
                | (level << 16)
                | (((level as usize >= FIFO_DEPTH) as u32) << 9)
                | (((level == 0) as u32) << 8);
        }
        if address == registers::adc_register(AdcRegister::Fifo) {
            return self.fifo.pop_front().unwrap_or(0) as u32;
        }
        if address == registers::adc_register(AdcRegister::Div) {
            return self.div;
        }
        self.registers.get(&address).copied().unwrap_or(0)
    }

    fn write(&mut self, address: u32, value: u32) {
        if let Some((ch, register)) = self.channel_register(address) {
            let channel = &mut self.channels[ch];
            match Self::field(register) {
                Field::Read => channel.read = value,
                Field::Write => channel.write = value,
                Field::Count => {
                    channel.reload = value;
                    channel.remaining = value;
                }
                Field::Ctrl => channel.ctrl = value,
            }
            if register.is_trigger() {
                self.trigger(ch);
            }
            return;
        }
        if address == registers::dma_chan_abort() {
            for ch in 0..DMA_CHANNELS {
                if value & (1 << ch) != 0 {
                    self.channels[ch].busy = false;
                    self.channels[ch].remaining = 0;
                }
            }
            return;
        }
        if address == registers::adc_register(AdcRegister::Cs) {
            self.cs = AdcControl::decode(self.profile, value);
            return;
        }
        if address == registers::adc_register(AdcRegister::Fcs) {
            // Status and write-one-to-clear bits are not stored.
            self.fcs = AdcFcs::new_with_raw_value(value)
                .with_over(false)
                .with_under(false)
                .raw_value()
                & !0x000f_0300;
            return;
        }
        if address == registers::adc_register(AdcRegister::Div) {
            self.div = value;
            return;
        }
        self.register_writes.push(address);
        self.registers.insert(address, value);
    }

    fn config(&self, ch: usize) -> ChannelConfig {
        ChannelConfig::decode(self.profile, self.channels[ch].ctrl)
            .expect("valid channel control word")
    }

    fn trigger(&mut self, ch: usize) {
        let config = self.config(ch);
        self.channels[ch].triggers += 1;
        if !config.enable {
            return;
        }
        let channel = &mut self.channels[ch];
        channel.remaining = channel.reload;
        channel.busy = channel.remaining > 0;
        if config.dreq == TREQ_PERMANENT {
            while self.channels[ch].busy {
                self.transfer(ch);
            }
        }
    }

    fn transfer(&mut self, ch: usize) {
        let config = self.config(ch);
        let size = config.data_size;
        let (read, write) = (self.channels[ch].read, self.channels[ch].write);
        let value = self.load(read, size);
        self.store(write, value, size);

        let channel = &mut self.channels[ch];
        if config.incr_read {
            channel.read += size.bytes();
        }
        if config.incr_write {
            channel.write += size.bytes();
        }
        channel.transfers += 1;
        channel.remaining -= 1;
        if config.dreq == self.profile.adc_dreq() {
            self.pass_transfers += 1;
        }

        if self.channels[ch].remaining == 0 {
            self.channels[ch].busy = false;
            if config.dreq == self.profile.adc_dreq() {
                self.passes.push(self.pass_transfers);
                self.pass_transfers = 0;
            }
            let next = config.chain_to.index() as usize;
            if next != ch {
                self.trigger(next);
            }
        }
    }

    fn load(&mut self, address: u32, size: DataSize) -> u32 {
        if address == registers::adc_register(AdcRegister::Fifo) {
            assert_eq!(size, DataSize::HalfWord, "FIFO read width");
            return self.fifo.pop_front().expect("FIFO underflow") as u32;
        }
        if address == self.table.dma_address() {
            assert_eq!(size, DataSize::Word, "pointer table read width");
            return self.table.target();
        }
        panic!("DMA read from unmapped address {:#010x}", address);
    }

    fn store(&mut self, address: u32, value: u32, size: DataSize) {
        let base = self.buffer.dma_address();
        let end = base.wrapping_add(2 * N as u32);
        if (base..end).contains(&address) {
            assert_eq!(size, DataSize::HalfWord, "sample write width");
            let slot = ((address - base) / 2) as usize;
            self.buffer
                .slot(slot)
                .unwrap()
                .store(value as u16, Ordering::Relaxed);
            return;
        }
        if self.channel_register(address).is_some() {
            assert_eq!(size, DataSize::Word, "register write width");
            self.write(address, value);
            return;
        }
        panic!("DMA write to unmapped address {:#010x}", address);
    }

    fn convert(&mut self) {
        if !(self.cs.en && self.cs.start_many) {
            return;
        }
        let fcs = AdcFcs::new_with_raw_value(self.fcs);
        let input = self.cs.ainsel as usize;
        let code = self.levels[input] & 0xfff;
        if fcs.en() {
            let code = if fcs.shift() { code >> 4 } else { code };
            if self.fifo.len() < FIFO_DEPTH {
                self.fifo.push_back(code);
            }
        }

        // Advance to the next input in the round-robin mask.
        let mask = self.cs.rrobin as u32;
        if mask != 0 {
            let inputs = self.profile.adc_inputs() as u32;
            let mut next = (input as u32 + 1) % inputs;
            while mask & (1 << next) == 0 {
                next = (next + 1) % inputs;
            }
            self.cs.ainsel = next as u8;
        }

        self.service_adc_dreq();
    }

    fn service_adc_dreq(&mut self) {
        let fcs = AdcFcs::new_with_raw_value(self.fcs);
        let thresh = (fcs.thresh().value() as usize).max(1);
        while fcs.dreq_en() && self.fifo.len() >= thresh {
            let dreq = self.profile.adc_dreq();
            let Some(ch) = (0..DMA_CHANNELS).find(|&ch| {
                self.channels[ch].busy && self.config(ch).dreq == dreq
            }) else {
                break;
            };
            self.transfer(ch);
        }
    }
}
