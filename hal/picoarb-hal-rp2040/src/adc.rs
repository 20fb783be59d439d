//! ADC channel arbiter
//!
//! The converter is brought up once through [`AdcToken::init`], which
//! consumes the token, so a second initialisation cannot be written.
//! Conversions are single-shot and blocking, with every wait bounded by
//! the configured [`PollBudget`].

use fixed::types::U24F8;
use picoarb_core::adc::{raw_to_celsius, raw_to_voltage};
use picoarb_core::poll::poll_until;
use picoarb_core::{AdcChannel, Error, HalConfig, PollBudget, Result, WrongChannelPolicy};

use crate::regs::adc::{cs, div, fcs, RESULT_MASK};
use crate::regs::{reset_bits, AdcRegs, RegisterBus, Resets};

/// Mask of the five round-robin inputs
const RROBIN_ALL: u8 = 0x1f;

/// Largest FIFO interrupt threshold
const MAX_THRESHOLD: u8 = 0xf;

/// Uninitialised ADC
pub struct AdcToken<B> {
    bus: B,
}

impl<B: RegisterBus> AdcToken<B> {
    pub(crate) const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Reset and enable the converter
    ///
    /// Pulses the ADC reset, waits for `RESET_DONE`, sets `CS.EN` and
    /// waits for the first `READY`.
    pub fn init(self, config: &HalConfig) -> Result<Adc<B>> {
        let resets = Resets::new(self.bus);
        let budget = config.poll_budget;

        resets.reset().set_bits(reset_bits::ADC);
        resets.reset().clear_bits(reset_bits::ADC);
        poll_until(budget, || resets.reset_done().has_bits(reset_bits::ADC)).map_err(|e| {
            error!("adc: reset never completed");
            e
        })?;

        let regs = AdcRegs::new(self.bus);
        regs.cs().set(cs::EN);
        poll_until(budget, || regs.cs().has_bits(cs::READY)).map_err(|e| {
            error!("adc: not ready after enable");
            e
        })?;

        info!("adc: ready");
        Ok(Adc {
            regs,
            budget,
            wrong_channel: config.wrong_channel,
            ts_enabled: false,
        })
    }
}

/// Initialised ADC
pub struct Adc<B> {
    regs: AdcRegs<B>,
    budget: PollBudget,
    wrong_channel: WrongChannelPolicy,
    ts_enabled: bool,
}

impl<B: RegisterBus> Adc<B> {
    fn wait_ready(&self) -> Result<()> {
        let cs_reg = self.regs.cs();
        poll_until(self.budget, || cs_reg.has_bits(cs::READY))?;
        Ok(())
    }

    /// Select the input the next conversion samples
    pub fn select_input(&mut self, channel: AdcChannel) {
        self.regs
            .cs()
            .set_field(channel.ainsel() as u32, cs::AINSEL_MASK, cs::AINSEL_SHIFT);
    }

    pub fn selected_input(&self) -> Result<AdcChannel> {
        let ainsel = self.regs.cs().field(cs::AINSEL_MASK, cs::AINSEL_SHIFT);
        AdcChannel::from_ainsel(ainsel as u8)
    }

    /// One blocking conversion of `channel`
    pub fn read(&mut self, channel: AdcChannel) -> Result<u16> {
        self.wait_ready()?;
        self.select_input(channel);
        self.regs.cs().set_bits(cs::START_ONCE);
        self.wait_ready().map_err(|e| {
            warn!("adc: conversion on {} timed out", channel.ainsel());
            e
        })?;
        Ok((self.regs.result().get() & RESULT_MASK) as u16)
    }

    pub fn voltage(&mut self, channel: AdcChannel, vref: f32) -> Result<f32> {
        Ok(raw_to_voltage(self.read(channel)?, vref))
    }

    /// Die temperature in °C
    ///
    /// Only meaningful on [`AdcChannel::Temperature`]. Any other channel
    /// fails or reads 0.0 depending on the configured policy, without
    /// touching the hardware.
    pub fn temperature(&mut self, channel: AdcChannel) -> Result<f32> {
        if channel != AdcChannel::Temperature {
            return match self.wrong_channel {
                WrongChannelPolicy::Error => Err(Error::WrongChannel),
                WrongChannelPolicy::ReturnZero => Ok(0.0),
            };
        }
        if !self.ts_enabled {
            self.set_temperature_sensor_enabled(true);
        }
        Ok(raw_to_celsius(self.read(channel)?))
    }

    pub fn set_temperature_sensor_enabled(&mut self, enabled: bool) {
        if enabled {
            self.regs.cs().set_bits(cs::TS_EN);
        } else {
            self.regs.cs().clear_bits(cs::TS_EN);
        }
        self.ts_enabled = enabled;
    }

    /// Inputs visited in turn after each conversion, bit n for AINSEL n
    ///
    /// Zero stops the rotation.
    pub fn set_round_robin(&mut self, mask: u8) -> Result<()> {
        if mask & !RROBIN_ALL != 0 {
            return Err(Error::BadParameter);
        }
        self.regs
            .cs()
            .set_field(mask as u32, cs::RROBIN_MASK, cs::RROBIN_SHIFT);
        Ok(())
    }

    pub fn round_robin(&self) -> u8 {
        self.regs.cs().field(cs::RROBIN_MASK, cs::RROBIN_SHIFT) as u8
    }

    /// Start or stop free-running conversions
    pub fn run(&mut self, enabled: bool) {
        if enabled {
            self.regs.cs().set_bits(cs::START_MANY);
        } else {
            self.regs.cs().clear_bits(cs::START_MANY);
        }
    }

    pub fn is_running(&self) -> bool {
        self.regs.cs().has_bits(cs::START_MANY)
    }

    /// Free-running sample clock divider (16.8)
    ///
    /// A conversion starts every `1 + divider` ADC clocks.
    pub fn set_clock_divider(&mut self, divider: U24F8) -> Result<()> {
        let bits = divider.to_bits();
        if bits & !(div::INT_MASK | div::FRAC_MASK) != 0 {
            return Err(Error::BadParameter);
        }
        self.regs.div().set(bits);
        Ok(())
    }

    pub fn clock_divider(&self) -> U24F8 {
        U24F8::from_bits(self.regs.div().get() & (div::INT_MASK | div::FRAC_MASK))
    }

    /// Configure the result FIFO
    ///
    /// `threshold` (0..=15) is the level at which DREQ and the FIFO
    /// interrupt assert. `shift` keeps only the top 8 bits of each sample.
    pub fn fifo_setup(
        &mut self,
        enabled: bool,
        dreq: bool,
        threshold: u8,
        error_bit: bool,
        shift: bool,
    ) -> Result<()> {
        if threshold > MAX_THRESHOLD {
            return Err(Error::BadParameter);
        }
        let mut bits = (threshold as u32) << fcs::THRESH_SHIFT;
        if enabled {
            bits |= fcs::EN;
        }
        if dreq {
            bits |= fcs::DREQ_EN;
        }
        if error_bit {
            bits |= fcs::ERR;
        }
        if shift {
            bits |= fcs::SHIFT;
        }
        self.regs.fcs().set(bits);
        Ok(())
    }

    pub fn fifo_level(&self) -> u8 {
        self.regs.fcs().field(fcs::LEVEL_MASK, fcs::LEVEL_SHIFT) as u8
    }

    pub fn fifo_is_empty(&self) -> bool {
        self.regs.fcs().has_bits(fcs::EMPTY)
    }

    /// True once the FIFO has overflowed or been read empty
    ///
    /// Reading the flags clears them.
    pub fn fifo_take_errors(&mut self) -> bool {
        let flags = self.regs.fcs().get() & (fcs::OVER | fcs::UNDER);
        if flags != 0 {
            self.regs.fcs().set_bits(flags);
        }
        flags != 0
    }

    /// Oldest FIFO entry, if any
    pub fn fifo_get(&mut self) -> Option<u16> {
        if self.fifo_is_empty() {
            None
        } else {
            Some(self.regs.fifo().get() as u16)
        }
    }

    /// Oldest FIFO entry, waiting for one to arrive
    pub fn fifo_get_blocking(&mut self) -> Result<u16> {
        let fcs_reg = self.regs.fcs();
        poll_until(self.budget, || !fcs_reg.has_bits(fcs::EMPTY))?;
        Ok(self.regs.fifo().get() as u16)
    }

    /// Discard everything in the FIFO
    ///
    /// Waits for the conversion in flight first. Fails if the FIFO keeps
    /// refilling, i.e. free-running mode is still on.
    pub fn fifo_drain(&mut self) -> Result<usize> {
        self.wait_ready()?;
        let mut drained = 0;
        let fcs_reg = self.regs.fcs();
        let fifo = self.regs.fifo();
        poll_until(self.budget, || {
            if fcs_reg.has_bits(fcs::EMPTY) {
                return true;
            }
            fifo.get();
            drained += 1;
            false
        })?;
        Ok(drained)
    }

    /// Handle on one channel
    pub fn input(&mut self, channel: AdcChannel) -> AdcInput<'_, B> {
        AdcInput { adc: self, channel }
    }
}

/// One ADC input
pub struct AdcInput<'a, B> {
    adc: &'a mut Adc<B>,
    channel: AdcChannel,
}

impl<B: RegisterBus> AdcInput<'_, B> {
    pub fn channel(&self) -> AdcChannel {
        self.channel
    }

    /// The arbiter, for converter-wide settings
    pub fn adc(&mut self) -> &mut Adc<B> {
        self.adc
    }
}

impl<B: RegisterBus> picoarb_hal::AnalogInput for AdcInput<'_, B> {
    type Error = Error;

    fn read(&mut self) -> Result<u16> {
        self.adc.read(self.channel)
    }

    fn voltage(&mut self, vref: f32) -> Result<f32> {
        self.adc.voltage(self.channel, vref)
    }

    fn temperature(&mut self) -> Result<f32> {
        self.adc.temperature(self.channel)
    }
}
