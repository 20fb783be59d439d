//! PWM timing engine
//!
//! Keeps a software copy of each slice's configuration, writes it to the
//! hardware on enable, solves divider/wrap for a requested period and
//! dispatches counter-wrap interrupts to per-slice handlers.
//!
//! # Wrap interrupts
//!
//! Handlers are plain function pointers in a fixed table, one per slice.
//! [`Pwm::on_wrap_interrupt`] is meant to be called from the
//! `PWM_IRQ_WRAP` vector: it reads the pending mask once, acknowledges
//! exactly those slices and calls their handlers in ascending slice order.

use picoarb_core::poll::poll_until;
use picoarb_core::pwm::{solve_period, NUM_PWM_SLICES};
use picoarb_core::{
    Channel, ClockDivider, DivMode, Error, HalConfig, PollBudget, Result, Slice, SliceConfig,
};

use crate::regs::pwm::{cc, csr, SLICE_MASK};
use crate::regs::{Irq, Nvic, PwmRegs, RegisterBus};

/// Wrap interrupt handler
///
/// Runs in interrupt context. Must not call back into blocking
/// configuration APIs.
pub type WrapHandler<B> = fn(&mut SliceHandle<'_, B>);

/// PWM engine for all 8 slices
pub struct Pwm<B> {
    regs: PwmRegs<B>,
    nvic: Nvic<B>,
    configs: [SliceConfig; NUM_PWM_SLICES],
    handlers: [Option<WrapHandler<B>>; NUM_PWM_SLICES],
    cycle_ns: u32,
    budget: PollBudget,
}

impl<B: RegisterBus> Pwm<B> {
    pub fn new(bus: B, config: &HalConfig) -> Self {
        Self {
            regs: PwmRegs::new(bus),
            nvic: Nvic::new(bus),
            configs: [SliceConfig::new(); NUM_PWM_SLICES],
            handlers: [None; NUM_PWM_SLICES],
            cycle_ns: config.cycle_period_ns(),
            budget: config.poll_budget,
        }
    }

    /// Software copy of a slice's configuration
    pub fn config(&self, slice: Slice) -> &SliceConfig {
        &self.configs[slice.index()]
    }

    fn csr_bits(config: &SliceConfig) -> u32 {
        let mut bits = (config.div_mode as u32) << csr::DIVMODE_SHIFT;
        if config.phase_correct {
            bits |= csr::PH_CORRECT;
        }
        if config.invert_a {
            bits |= csr::A_INV;
        }
        if config.invert_b {
            bits |= csr::B_INV;
        }
        bits
    }

    /// Start or stop a slice
    ///
    /// Starting writes the whole configuration with the slice stopped,
    /// zeroes the counter and only then sets `EN`. Compare levels are kept.
    /// Stopping clears `EN` alone.
    pub fn set_enabled(&mut self, slice: Slice, enabled: bool) {
        if !enabled {
            self.regs.csr(slice).clear_bits(csr::EN);
            return;
        }
        let config = self.configs[slice.index()];
        self.regs.csr(slice).set(Self::csr_bits(&config));
        self.regs.div(slice).set(config.divider.to_register());
        self.regs.top(slice).set(config.wrap as u32);
        self.regs.ctr(slice).set(0);
        self.regs.csr(slice).set_bits(csr::EN);
        debug!("pwm {}: enabled, wrap {}", slice.number(), config.wrap);
    }

    pub fn is_enabled(&self, slice: Slice) -> bool {
        self.regs.csr(slice).has_bits(csr::EN)
    }

    /// Start and stop several slices in the same cycle
    pub fn set_mask_enabled(&mut self, mask: u8) {
        self.regs.en().set(mask as u32);
    }

    pub fn counter(&self, slice: Slice) -> u16 {
        self.regs.ctr(slice).get() as u16
    }

    pub fn set_counter(&mut self, slice: Slice, value: u16) {
        self.regs.ctr(slice).set(value as u32);
    }

    /// Advance the counter phase by one count
    pub fn inc(&mut self, slice: Slice) -> Result<()> {
        self.phase_step(slice, csr::PH_ADV)
    }

    /// Retard the counter phase by one count
    pub fn dec(&mut self, slice: Slice) -> Result<()> {
        self.phase_step(slice, csr::PH_RET)
    }

    fn phase_step(&mut self, slice: Slice, bit: u32) -> Result<()> {
        let reg = self.regs.csr(slice);
        reg.set_bits(bit);
        poll_until(self.budget, || !reg.has_bits(bit)).map_err(|e| {
            warn!("pwm {}: phase step not acknowledged", slice.number());
            e
        })?;
        Ok(())
    }

    pub fn wrap(&self, slice: Slice) -> u16 {
        self.regs.top(slice).get() as u16
    }

    pub fn set_wrap(&mut self, slice: Slice, wrap: u16) {
        self.configs[slice.index()].wrap = wrap;
        self.regs.top(slice).set(wrap as u32);
    }

    pub fn divider(&self, slice: Slice) -> Result<ClockDivider> {
        ClockDivider::from_register(self.regs.div(slice).get())
    }

    pub fn set_divider(&mut self, slice: Slice, divider: ClockDivider) {
        self.configs[slice.index()].divider = divider;
        self.regs.div(slice).set(divider.to_register());
    }

    pub fn phase_correct(&self, slice: Slice) -> bool {
        self.regs.csr(slice).has_bits(csr::PH_CORRECT)
    }

    pub fn set_phase_correct(&mut self, slice: Slice, enabled: bool) {
        self.configs[slice.index()].phase_correct = enabled;
        let bits = if enabled { csr::PH_CORRECT } else { 0 };
        self.regs.csr(slice).replace_bits(bits, csr::PH_CORRECT);
    }

    /// Invert either channel's output
    pub fn set_output_polarity(&mut self, slice: Slice, invert_a: bool, invert_b: bool) {
        let config = &mut self.configs[slice.index()];
        config.invert_a = invert_a;
        config.invert_b = invert_b;
        let bits = Self::csr_bits(config);
        self.regs
            .csr(slice)
            .replace_bits(bits, csr::A_INV | csr::B_INV);
    }

    pub fn set_div_mode(&mut self, slice: Slice, mode: DivMode) {
        self.configs[slice.index()].div_mode = mode;
        self.regs
            .csr(slice)
            .set_field(mode as u32, csr::DIVMODE_MASK, csr::DIVMODE_SHIFT);
    }

    /// Compare level of one channel
    pub fn level(&self, slice: Slice, channel: Channel) -> u16 {
        let bits = self.regs.cc(slice).get();
        match channel {
            Channel::A => (bits & cc::A_MASK) as u16,
            Channel::B => ((bits & cc::B_MASK) >> cc::B_SHIFT) as u16,
        }
    }

    pub fn set_level(&mut self, slice: Slice, channel: Channel, level: u16) {
        let (value, mask) = match channel {
            Channel::A => (level as u32, cc::A_MASK),
            Channel::B => ((level as u32) << cc::B_SHIFT, cc::B_MASK),
        };
        self.regs.cc(slice).replace_bits(value, mask);
    }

    /// Set both compare levels in one write
    pub fn set_levels(&mut self, slice: Slice, a: u16, b: u16) {
        self.regs
            .cc(slice)
            .set(a as u32 | (b as u32) << cc::B_SHIFT);
    }

    /// Choose divider and wrap for a period in nanoseconds
    ///
    /// Phase-correct counting is switched on for periods above half the
    /// longest reachable period.
    pub fn set_period(&mut self, slice: Slice, period_ns: u32) -> Result<()> {
        let config = &mut self.configs[slice.index()];
        let solution = solve_period(period_ns, self.cycle_ns, config.phase_correct)?;

        config.divider = solution.divider;
        config.wrap = solution.wrap;
        config.phase_correct = solution.phase_correct;

        let phc = if solution.phase_correct { csr::PH_CORRECT } else { 0 };
        self.regs.csr(slice).replace_bits(phc, csr::PH_CORRECT);
        self.regs.top(slice).set(solution.wrap as u32);
        self.regs.div(slice).set(solution.divider.to_register());

        debug!(
            "pwm {}: period {} ns -> div {}/16 wrap {} phc {}",
            slice.number(),
            period_ns,
            solution.divider.sixteenths(),
            solution.wrap,
            solution.phase_correct
        );
        Ok(())
    }

    /// Install or remove a slice's wrap handler
    ///
    /// A stale wrap flag is cleared first. The `PWM_IRQ_WRAP` line is
    /// enabled while at least one handler is installed.
    pub fn set_interrupt(&mut self, slice: Slice, handler: Option<WrapHandler<B>>) {
        self.regs.intr().set(slice.mask());
        match handler {
            Some(_) => self.regs.inte().set_bits(slice.mask()),
            None => self.regs.inte().clear_bits(slice.mask()),
        }
        self.handlers[slice.index()] = handler;

        if self.handlers.iter().any(Option::is_some) {
            if !self.nvic.is_enabled(Irq::PwmWrap) {
                self.nvic.unpend(Irq::PwmWrap);
                self.nvic.enable(Irq::PwmWrap);
            }
        } else {
            self.nvic.disable(Irq::PwmWrap);
        }
    }

    /// Drop every wrap handler and release the `PWM_IRQ_WRAP` line
    pub fn clear_interrupts(&mut self) {
        let installed = self
            .handlers
            .iter()
            .zip(Slice::all())
            .filter(|(h, _)| h.is_some())
            .fold(0u32, |mask, (_, slice)| mask | slice.mask());
        self.regs.inte().clear_bits(installed);
        self.regs.intr().set(installed);
        self.handlers = [None; NUM_PWM_SLICES];
        self.nvic.disable(Irq::PwmWrap);
    }

    /// Dispatch pending wrap interrupts
    ///
    /// Returns the number of handlers called.
    pub fn on_wrap_interrupt(&mut self) -> usize {
        let pending = self.regs.ints().get() & SLICE_MASK;
        self.regs.intr().set(pending);

        let mut called = 0;
        for slice in Slice::all() {
            if pending & slice.mask() == 0 {
                continue;
            }
            if let Some(handler) = self.handlers[slice.index()] {
                handler(&mut SliceHandle { pwm: self, slice });
                called += 1;
            }
        }
        called
    }

    /// Force (or stop forcing) a slice's interrupt
    pub fn force_irq(&mut self, slice: Slice, force: bool) {
        if force {
            self.regs.intf().set_bits(slice.mask());
        } else {
            self.regs.intf().clear_bits(slice.mask());
        }
    }

    /// Enabled-and-pending slices
    pub fn irq_status(&self) -> u8 {
        (self.regs.ints().get() & SLICE_MASK) as u8
    }

    /// Handle on one channel
    pub fn channel(&mut self, slice: Slice, channel: Channel) -> PwmChannel<'_, B> {
        PwmChannel {
            pwm: self,
            slice,
            channel,
        }
    }
}

/// The slice whose wrap interrupt is being handled
pub struct SliceHandle<'a, B> {
    pwm: &'a mut Pwm<B>,
    slice: Slice,
}

impl<B: RegisterBus> SliceHandle<'_, B> {
    pub fn slice(&self) -> Slice {
        self.slice
    }

    pub fn level(&self, channel: Channel) -> u16 {
        self.pwm.level(self.slice, channel)
    }

    pub fn set_level(&mut self, channel: Channel, level: u16) {
        self.pwm.set_level(self.slice, channel, level)
    }

    pub fn wrap(&self) -> u16 {
        self.pwm.wrap(self.slice)
    }

    pub fn set_wrap(&mut self, wrap: u16) {
        self.pwm.set_wrap(self.slice, wrap)
    }

    pub fn counter(&self) -> u16 {
        self.pwm.counter(self.slice)
    }

    pub fn set_counter(&mut self, value: u16) {
        self.pwm.set_counter(self.slice, value)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.pwm.set_enabled(self.slice, enabled)
    }
}

/// One PWM output
pub struct PwmChannel<'a, B> {
    pwm: &'a mut Pwm<B>,
    slice: Slice,
    channel: Channel,
}

impl<B: RegisterBus> PwmChannel<'_, B> {
    pub fn slice(&self) -> Slice {
        self.slice
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The engine, for slice-wide settings
    pub fn engine(&mut self) -> &mut Pwm<B> {
        self.pwm
    }

    pub fn set_interrupt(&mut self, handler: Option<WrapHandler<B>>) {
        self.pwm.set_interrupt(self.slice, handler)
    }
}

impl<B: RegisterBus> picoarb_hal::PwmOutput for PwmChannel<'_, B> {
    type Error = Error;

    fn level(&self) -> Result<u16> {
        Ok(self.pwm.level(self.slice, self.channel))
    }

    fn set_level(&mut self, level: u16) -> Result<()> {
        self.pwm.set_level(self.slice, self.channel, level);
        Ok(())
    }

    fn counter(&self) -> Result<u16> {
        Ok(self.pwm.counter(self.slice))
    }

    fn set_counter(&mut self, value: u16) -> Result<()> {
        self.pwm.set_counter(self.slice, value);
        Ok(())
    }

    fn inc(&mut self) -> Result<()> {
        self.pwm.inc(self.slice)
    }

    fn dec(&mut self) -> Result<()> {
        self.pwm.dec(self.slice)
    }

    fn wrap(&self) -> Result<u16> {
        Ok(self.pwm.wrap(self.slice))
    }

    fn set_wrap(&mut self, wrap: u16) -> Result<()> {
        self.pwm.set_wrap(self.slice, wrap);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.pwm.set_enabled(self.slice, enabled);
        Ok(())
    }

    fn set_period(&mut self, period_ns: u32) -> Result<()> {
        self.pwm.set_period(self.slice, period_ns)
    }
}

impl<B: RegisterBus> embedded_hal::pwm::ErrorType for PwmChannel<'_, B> {
    type Error = Error;
}

impl<B: RegisterBus> embedded_hal::pwm::SetDutyCycle for PwmChannel<'_, B> {
    fn max_duty_cycle(&self) -> u16 {
        self.pwm.wrap(self.slice).saturating_add(1)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<()> {
        self.pwm.set_level(self.slice, self.channel, duty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, SimCore};
    use embedded_hal::pwm::SetDutyCycle;
    use picoarb_core::pwm::MAX_PERIOD_NS;
    use picoarb_core::Core;
    use portable_atomic::{AtomicU32, Ordering};

    fn slice(n: u8) -> Slice {
        Slice::new(n).unwrap()
    }

    fn pwm(sim: &SimBus) -> Pwm<SimCore<'_>> {
        Pwm::new(sim.core(Core::Core0), &HalConfig::default())
    }

    #[test]
    fn test_enable_writes_config_then_en() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(3);
        pwm.set_wrap(s, 999);
        pwm.set_divider(s, ClockDivider::new(4, 8).unwrap());
        pwm.set_level(s, Channel::A, 250);
        pwm.set_counter(s, 77);

        pwm.set_enabled(s, true);
        assert!(pwm.is_enabled(s));
        assert_eq!(pwm.counter(s), 0);
        assert_eq!(pwm.wrap(s), 999);
        assert_eq!(pwm.divider(s), ClockDivider::new(4, 8));
        assert_eq!(pwm.level(s, Channel::A), 250);

        pwm.set_enabled(s, false);
        assert!(!pwm.is_enabled(s));
        assert_eq!(pwm.wrap(s), 999);
    }

    #[test]
    fn test_levels_per_channel() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(0);
        pwm.set_level(s, Channel::B, 0x1234);
        pwm.set_level(s, Channel::A, 0x00ff);
        assert_eq!(pwm.level(s, Channel::A), 0x00ff);
        assert_eq!(pwm.level(s, Channel::B), 0x1234);
        pwm.set_levels(s, 1, 2);
        assert_eq!(pwm.level(s, Channel::A), 1);
        assert_eq!(pwm.level(s, Channel::B), 2);
    }

    #[test]
    fn test_inc_dec() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(1);
        pwm.set_wrap(s, 10);
        pwm.set_enabled(s, true);
        pwm.inc(s).unwrap();
        pwm.inc(s).unwrap();
        assert_eq!(pwm.counter(s), 2);
        pwm.dec(s).unwrap();
        assert_eq!(pwm.counter(s), 1);
    }

    #[test]
    fn test_inc_timeout() {
        let sim = SimBus::new();
        let config = HalConfig::default().with_poll_budget(PollBudget(8));
        let mut pwm = Pwm::new(sim.core(Core::Core0), &config);
        let s = slice(2);
        sim.stick(PwmRegs::new(sim.core(Core::Core0)).csr(s).addr(), csr::PH_ADV, csr::PH_ADV);
        assert_eq!(pwm.inc(s), Err(Error::Timeout));
    }

    #[test]
    fn test_set_period() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(5);

        pwm.set_period(s, 1_000_000).unwrap();
        assert_eq!(pwm.wrap(s), 62499);
        assert_eq!(pwm.divider(s), ClockDivider::new(2, 0));
        assert!(!pwm.phase_correct(s));

        pwm.set_period(s, MAX_PERIOD_NS).unwrap();
        assert!(pwm.phase_correct(s));
        assert_eq!(pwm.divider(s), Ok(ClockDivider::MAX));
        assert_eq!(pwm.wrap(s), 0xffff);

        assert_eq!(pwm.set_period(s, 7), Err(Error::BadParameter));
        assert_eq!(pwm.set_period(s, MAX_PERIOD_NS + 1), Err(Error::BadParameter));
        // Failed requests leave the slice alone
        assert_eq!(pwm.wrap(s), 0xffff);

        // Survives an enable cycle
        pwm.set_enabled(s, true);
        assert!(pwm.phase_correct(s));
        assert_eq!(pwm.divider(s), Ok(ClockDivider::MAX));
    }

    #[test]
    fn test_polarity_and_div_mode() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(6);
        pwm.set_output_polarity(s, true, false);
        pwm.set_div_mode(s, DivMode::BRising);
        let bits = PwmRegs::new(sim.core(Core::Core0)).csr(s).get();
        assert_eq!(bits & csr::A_INV, csr::A_INV);
        assert_eq!(bits & csr::B_INV, 0);
        assert_eq!((bits & csr::DIVMODE_MASK) >> csr::DIVMODE_SHIFT, 2);
        assert!(pwm.config(s).invert_a);
    }

    #[test]
    fn test_mask_enable() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        pwm.set_mask_enabled(0b1001);
        assert!(pwm.is_enabled(slice(0)));
        assert!(pwm.is_enabled(slice(3)));
        assert!(!pwm.is_enabled(slice(1)));
    }

    static WRAPS: AtomicU32 = AtomicU32::new(0);
    static ORDER: AtomicU32 = AtomicU32::new(0);

    fn count_wraps(handle: &mut SliceHandle<'_, SimCore<'_>>) {
        WRAPS.fetch_add(1, Ordering::Relaxed);
        // Record dispatch order as decimal digits
        let prev = ORDER.load(Ordering::Relaxed);
        ORDER.store(prev * 10 + handle.slice().number() as u32, Ordering::Relaxed);
    }

    #[test]
    fn test_wrap_dispatch() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let nvic = Nvic::new(sim.core(Core::Core0));

        // Stale flag from before registration is dropped
        sim.pwm_wrap(slice(2));
        pwm.set_interrupt(slice(2), Some(count_wraps));
        pwm.set_interrupt(slice(7), Some(count_wraps));
        assert!(nvic.is_enabled(Irq::PwmWrap));
        assert_eq!(pwm.on_wrap_interrupt(), 0);

        sim.pwm_wrap(slice(7));
        sim.pwm_wrap(slice(2));
        // No handler on slice 4, and not enabled either
        sim.pwm_wrap(slice(4));
        assert_eq!(pwm.irq_status(), 0b1000_0100);
        assert_eq!(pwm.on_wrap_interrupt(), 2);
        assert_eq!(WRAPS.load(Ordering::Relaxed), 2);
        assert_eq!(ORDER.load(Ordering::Relaxed), 27);
        assert_eq!(pwm.irq_status(), 0);
        assert_eq!(pwm.on_wrap_interrupt(), 0);

        pwm.set_interrupt(slice(2), None);
        assert!(nvic.is_enabled(Irq::PwmWrap));
        pwm.set_interrupt(slice(7), None);
        assert!(!nvic.is_enabled(Irq::PwmWrap));
    }

    #[test]
    fn test_forced_irq() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        pwm.set_interrupt(slice(1), Some(|_| {}));
        pwm.force_irq(slice(1), true);
        assert_eq!(pwm.irq_status(), 0b10);
        pwm.force_irq(slice(1), false);
        assert_eq!(pwm.irq_status(), 0);
    }

    #[test]
    fn test_duty_cycle() {
        let sim = SimBus::new();
        let mut pwm = pwm(&sim);
        let s = slice(4);
        pwm.set_wrap(s, 99);
        let mut ch = pwm.channel(s, Channel::B);
        assert_eq!(ch.max_duty_cycle(), 100);
        ch.set_duty_cycle_percent(25).unwrap();
        assert_eq!(pwm.level(s, Channel::B), 25);

        pwm.set_wrap(s, 0xffff);
        assert_eq!(pwm.channel(s, Channel::A).max_duty_cycle(), 0xffff);
    }
}
