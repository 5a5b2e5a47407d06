//! Continuous ADC sampling into memory via chained DMA
//!
//! # Design
//! The ADC converts free-running and round-robin over `N` inputs. Two DMA
//! channels keep the [SampleBuffer] refreshed without any CPU involvement:
//!
//! * The sampling channel reads the ADC result FIFO (fixed address) and
//!   writes halfwords into the sample buffer (incrementing address). It is
//!   paced by the ADC DMA request and moves exactly `N` samples per pass, one
//!   per input. At the end of the pass it triggers the control channel.
//! * The control channel copies a single word, the sample buffer address held
//!   in the [PointerTable], into the sampling channel's `WRITE_ADDR` trigger
//!   alias. This rewinds the sampling channel to slot 0 and restarts it with
//!   its transfer count reloaded to `N`.
//!
//! Because each pass starts at input 0 and slot 0 and moves exactly one
//! sample per input, slot `i` always holds the latest conversion of input `i`.
//!
//!
//! ## Arming
//!
//! [AdcSampler::configure] consumes an unconfigured sampler and returns an
//! armed one, so a sampler can only be armed once. The DMA channels are
//! claimed from a [DmaChannels] record shared with the rest of the firmware.
//! If no two channels are free, arming fails with [Error::NoFreeChannel];
//! firmware typically treats that as fatal during setup.
//!
//!
//! ## Reading samples
//!
//! Consumers get a [SampleReader]. Reads never block. A single slot is always
//! read whole, but a read across slots may mix two passes.
//!
//!
//! ## Stopping
//!
//! [AdcSampler::pause] stops conversions and leaves the buffer contents in
//! place. [AdcSampler::halt] also tears down the DMA chain and returns the
//! channels. The chaining of a channel is removed before it is aborted, as an
//! aborted channel may otherwise still trigger its chain target.
use fugit::HertzU32;

use super::{
    adc::Adc,
    bus::RegisterBus,
    configuration::SamplerConfig,
    design_parameters::{DMA_ABORT_POLLS, NUM_ADC_INPUTS},
    dma::{Channel, ChannelConfig, ClaimedChannel, DataSize, DmaChannels},
    profile::HardwareProfile,
    registers::{self, ChannelRegister},
    sample_buffer::{PointerTable, SampleBuffer, SampleReader},
    Error,
};

/// Sampler state before arming. Buffer contents are not refreshed.
pub struct Unconfigured;

/// Sampler state after arming. The DMA engine refreshes the buffer.
pub struct Armed {
    sampling: ClaimedChannel,
    control: ClaimedChannel,
    config: SamplerConfig,
}

/// The ADC/DMA sampler. Owns the register bus and refers to the statically
/// allocated sample buffer and pointer table.
pub struct AdcSampler<B, S, const N: usize = NUM_ADC_INPUTS> {
    bus: B,
    profile: HardwareProfile,
    buffer: &'static SampleBuffer<N>,
    table: &'static PointerTable,
    state: S,
}

impl<B, S, const N: usize> AdcSampler<B, S, N> {
    /// A read-only handle to the sample buffer.
    pub fn reader(&self) -> SampleReader<'static, N> {
        self.buffer.reader()
    }

    pub fn profile(&self) -> HardwareProfile {
        self.profile
    }

    pub fn pointer_table(&self) -> &'static PointerTable {
        self.table
    }

    fn with_state<T>(self, state: T) -> AdcSampler<B, T, N> {
        AdcSampler {
            bus: self.bus,
            profile: self.profile,
            buffer: self.buffer,
            table: self.table,
            state,
        }
    }
}

impl<B: RegisterBus, const N: usize> AdcSampler<B, Unconfigured, N> {
    /// Construct the sampler for the active hardware profile.
    ///
    /// # Args
    /// * `bus` - Register access to the ADC, DMA, IO and pad registers.
    /// * `buffer` - The sample buffer refreshed by DMA.
    /// * `table` - The pointer table read by the DMA control channel.
    pub fn new(
        bus: B,
        buffer: &'static SampleBuffer<N>,
        table: &'static PointerTable,
    ) -> Self {
        const {
            assert!(N > 0, "At least one ADC input must be sampled");
            assert!(
                N <= HardwareProfile::ACTIVE.adc_inputs(),
                "More inputs than the ADC of the selected profile provides"
            );
        }
        Self {
            bus,
            profile: HardwareProfile::ACTIVE,
            buffer,
            table,
            state: Unconfigured,
        }
    }

    /// Release the register bus.
    pub fn free(self) -> B {
        self.bus
    }

    /// Arm continuous round-robin sampling into the sample buffer.
    ///
    /// # Args
    /// * `channels` - DMA channel record to claim the two channels from.
    /// * `config` - ADC clock divider and DMA settings.
    ///
    /// # Returns
    /// The armed sampler. On error, any claimed channel has been returned.
    pub fn configure(
        mut self,
        channels: &mut DmaChannels,
        config: &SamplerConfig,
    ) -> Result<AdcSampler<B, Armed, N>, Error> {
        config.validate()?;

        let sampling = channels.claim_unused()?;
        let control = match channels.claim_unused() {
            Ok(control) => control,
            Err(err) => {
                channels.unclaim(sampling);
                return Err(err);
            }
        };

        if let Err(err) =
            self.arm(sampling.channel(), control.channel(), config)
        {
            log::warn!("ADC DMA arming failed: {}", err);
            channels.unclaim(control);
            channels.unclaim(sampling);
            return Err(err);
        }

        log::info!(
            "ADC DMA armed on {}: {} inputs, sampling channel {}, control channel {}",
            self.profile.name(),
            N,
            sampling.index(),
            control.index()
        );

        Ok(self.with_state(Armed {
            sampling,
            control,
            config: *config,
        }))
    }

    fn arm(
        &mut self,
        sampling: Channel,
        control: Channel,
        config: &SamplerConfig,
    ) -> Result<(), Error> {
        let mut adc = Adc::new(&mut self.bus, self.profile);
        adc.select_analog_pins(N);
        adc.enable()?;
        adc.configure_fifo(config.shift_8bit);
        adc.set_divider(config);
        adc.set_round_robin(N);
        let fifo = adc.fifo_address();

        self.table.point_at(self.buffer);

        // The control channel rewrites the sampling channel's write address
        // through the trigger alias, restarting it for the next pass.
        let control_ctrl = ChannelConfig::new(control)
            .data_size(DataSize::Word)
            .incr_read(false)
            .incr_write(false)
            .high_priority(config.high_priority);
        let restart = registers::dma_channel(
            sampling,
            ChannelRegister::Al2WriteAddrTrig,
        );
        let register = |r| registers::dma_channel(control, r);
        self.bus.write(
            register(ChannelRegister::ReadAddr),
            self.table.dma_address(),
        );
        self.bus.write(register(ChannelRegister::WriteAddr), restart);
        self.bus.write(register(ChannelRegister::TransCount), 1);
        self.bus.write(
            register(ChannelRegister::Al1Ctrl),
            control_ctrl.encode(self.profile),
        );
        log::debug!(
            "DMA{}: {:#010x} -> {:#010x} x1",
            control.index(),
            self.table.dma_address(),
            restart
        );

        let sampling_ctrl = ChannelConfig::new(sampling)
            .data_size(DataSize::HalfWord)
            .incr_read(false)
            .incr_write(true)
            .dreq(self.profile.adc_dreq())
            .chain_to(control)
            .high_priority(config.high_priority);
        let register = |r| registers::dma_channel(sampling, r);
        self.bus.write(register(ChannelRegister::ReadAddr), fifo);
        self.bus.write(
            register(ChannelRegister::WriteAddr),
            self.buffer.dma_address(),
        );
        self.bus
            .write(register(ChannelRegister::TransCount), N as u32);
        // Starts the channel, which then waits for the ADC request.
        self.bus.write(
            register(ChannelRegister::CtrlTrig),
            sampling_ctrl.encode(self.profile),
        );
        log::debug!(
            "DMA{}: {:#010x} -> {:#010x} x{}",
            sampling.index(),
            fifo,
            self.buffer.dma_address(),
            N
        );

        Adc::new(&mut self.bus, self.profile).set_free_running(true);
        Ok(())
    }
}

impl<B: RegisterBus, const N: usize> AdcSampler<B, Armed, N> {
    /// The channel moving samples from the ADC into the buffer.
    pub fn sampling_channel(&self) -> Channel {
        self.state.sampling.channel()
    }

    /// The channel restarting the sampling channel after every pass.
    pub fn control_channel(&self) -> Channel {
        self.state.control.channel()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.state.config
    }

    /// Rate at which every slot of the buffer is refreshed.
    pub fn sample_rate(&self, adc_clock: HertzU32) -> HertzU32 {
        let rate = self.state.config.conversion_rate(adc_clock);
        HertzU32::from_raw(rate.raw() / N as u32)
    }

    /// Stop conversions. The DMA chain stays armed and the buffer keeps the
    /// last samples.
    pub fn pause(&mut self) {
        Adc::new(&mut self.bus, self.profile).set_free_running(false);
        log::info!("ADC sampling paused");
    }

    /// Restart conversions after [AdcSampler::pause].
    pub fn resume(&mut self) {
        Adc::new(&mut self.bus, self.profile).set_free_running(true);
        log::info!("ADC sampling resumed");
    }

    pub fn is_running(&mut self) -> bool {
        Adc::new(&mut self.bus, self.profile).is_free_running()
    }

    /// Stop sampling, tear down the DMA chain and return both channels to
    /// `channels`. The buffer keeps the last samples.
    ///
    /// # Returns
    /// The unconfigured sampler, ready to be armed again. If a channel abort
    /// does not complete, the sampler is handed back together with
    /// [Error::AbortTimeout]. Its channels stay claimed and `halt` may be
    /// retried.
    pub fn halt(
        mut self,
        channels: &mut DmaChannels,
    ) -> Result<AdcSampler<B, Unconfigured, N>, (Self, Error)> {
        let sampling = self.state.sampling.channel();
        let control = self.state.control.channel();

        Adc::new(&mut self.bus, self.profile).set_free_running(false);

        for channel in [sampling, control] {
            let raw = self.bus.read(registers::dma_channel(
                channel,
                ChannelRegister::CtrlTrig,
            ));
            let unchained = ChannelConfig::decode(self.profile, raw)
                .unwrap_or_else(|| ChannelConfig::new(channel))
                .chain_to(channel)
                .enable(false);
            self.bus.write(
                registers::dma_channel(channel, ChannelRegister::Al1Ctrl),
                unchained.encode(self.profile),
            );
        }

        let abort = registers::dma_chan_abort();
        let mask = (1u32 << sampling.index()) | (1u32 << control.index());
        self.bus.write(abort, mask);
        let aborted = (0..DMA_ABORT_POLLS)
            .any(|_| (self.bus.read(abort) & mask) == 0);
        if !aborted {
            log::warn!("DMA abort of channels {:#06x} timed out", mask);
            return Err((self, Error::AbortTimeout));
        }

        Adc::new(&mut self.bus, self.profile).disable_fifo();

        let AdcSampler {
            bus,
            profile,
            buffer,
            table,
            state:
                Armed {
                    sampling: claimed_sampling,
                    control: claimed_control,
                    ..
                },
        } = self;
        channels.unclaim(claimed_control);
        channels.unclaim(claimed_sampling);
        log::info!(
            "ADC DMA halted, released channels {} and {}",
            sampling.index(),
            control.index()
        );

        Ok(AdcSampler {
            bus,
            profile,
            buffer,
            table,
            state: Unconfigured,
        })
    }
}
