//! PWM engine: period solving on real registers and wrap dispatch

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use picoarb_core::pwm::{MAX_PERIOD_NS, MIN_PERIOD_NS};
use picoarb_core::{Channel, Core, HalConfig, Slice};
use picoarb_hal_rp2040::regs::pwm::csr;
use picoarb_hal_rp2040::regs::{PwmRegs, ALIAS_SET};
use picoarb_hal_rp2040::sim::{SimBus, SimCore};
use picoarb_hal_rp2040::{Peripherals, PwmOutput, SliceHandle};
use proptest::prelude::*;

const CYCLE_NS: u64 = 8;

/// Period the slice registers describe, in nanoseconds
fn programmed_period(sim: &SimBus, slice: Slice) -> u64 {
    let regs = PwmRegs::new(sim.core(Core::Core0));
    let sixteenths = (regs.div(slice).get() & 0xfff) as u64;
    let wrap = (regs.top(slice).get() & 0xffff) as u64;
    let phc = regs.csr(slice).has_bits(csr::PH_CORRECT) as u64;
    CYCLE_NS * (1 + phc) * sixteenths * (wrap + 1) / 16
}

#[test]
fn periods_land_on_the_registers() {
    let sim = SimBus::new();
    let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
    let mut out = p.pin(6).unwrap().pwm().unwrap();
    let slice = out.slice();

    for period in [MIN_PERIOD_NS, 1_000_000, MAX_PERIOD_NS] {
        out.set_period(period).unwrap();
        assert_eq!(programmed_period(&sim, slice), period as u64);
    }
    assert!(out.set_period(MIN_PERIOD_NS - 1).is_err());
    assert!(out.set_period(MAX_PERIOD_NS + 1).is_err());
}

#[test]
fn enable_restarts_counter_and_keeps_levels() {
    let sim = SimBus::new();
    let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
    let mut out = p.pin(9).unwrap().pwm().unwrap();
    out.set_wrap(1000).unwrap();
    out.set_level(400).unwrap();
    out.set_counter(123).unwrap();
    out.set_enabled(true).unwrap();

    assert_eq!(out.counter(), Ok(0));
    assert_eq!(out.level(), Ok(400));
    out.inc().unwrap();
    assert_eq!(out.counter(), Ok(1));
    out.dec().unwrap();
    out.dec().unwrap();
    assert_eq!(out.counter(), Ok(1000));
}

#[test]
fn enable_bit_is_the_last_write() {
    let sim = SimBus::new();
    let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
    let mut out = p.pin(12).unwrap().pwm().unwrap();
    out.set_wrap(499).unwrap();
    out.set_counter(77).unwrap();
    let slice = out.slice();

    sim.clear_write_log();
    out.set_enabled(true).unwrap();
    let log = sim.write_log();

    let regs = PwmRegs::new(sim.core(Core::Core0));
    let position = |write: (u32, u32)| log.iter().position(|w| *w == write);
    let config = log
        .iter()
        .position(|w| w.0 == regs.csr(slice).addr())
        .expect("csr written");
    let top = position((regs.top(slice).addr(), 499)).expect("top written");
    let zeroed = position((regs.ctr(slice).addr(), 0)).expect("counter zeroed");
    let enable = position((regs.csr(slice).addr() | ALIAS_SET, csr::EN)).expect("enabled");

    // Configuration goes in with the slice stopped
    assert_eq!(log[config].1 & csr::EN, 0);
    assert!(config < enable && top < enable && zeroed < enable);
    assert_eq!(enable, log.len() - 1);
    assert_eq!(out.counter(), Ok(0));
}

static FADE: AtomicI32 = AtomicI32::new(0);
static GOING_UP: AtomicBool = AtomicBool::new(true);

fn breathe(slice: &mut SliceHandle<'_, SimCore<'_>>) {
    let mut fade = FADE.load(Ordering::Relaxed);
    if GOING_UP.load(Ordering::Relaxed) {
        fade += 1;
        if fade > 255 {
            fade = 255;
            GOING_UP.store(false, Ordering::Relaxed);
        }
    } else {
        fade -= 1;
        if fade < 0 {
            fade = 0;
            GOING_UP.store(true, Ordering::Relaxed);
        }
    }
    FADE.store(fade, Ordering::Relaxed);
    slice.set_level(Channel::B, (fade * fade) as u16);
}

/// Fade value after `n` wraps of a triangle wave peaking at 255
fn expected_fade(n: i32) -> i32 {
    if n <= 255 {
        n
    } else {
        (255 - (n - 256)).max(0)
    }
}

#[test]
fn breathing_led() {
    let sim = SimBus::new();
    let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());

    let mut led = p.pin(25).unwrap().pwm().unwrap();
    assert_eq!(led.slice(), Slice::new(4).unwrap());
    assert_eq!(led.channel(), Channel::B);
    led.set_interrupt(Some(breathe));
    led.set_wrap(255).unwrap();
    led.set_enabled(true).unwrap();

    let slice = led.slice();
    for n in 1..=300 {
        sim.pwm_wrap(slice);
        assert_eq!(p.pwm().on_wrap_interrupt(), 1);
        let fade = expected_fade(n);
        assert_eq!(FADE.load(Ordering::Relaxed), fade, "after {} wraps", n);
        assert_eq!(p.pwm().level(slice, Channel::B), (fade * fade) as u16);
    }
    // Sibling channel untouched
    assert_eq!(p.pwm().level(slice, Channel::A), 0);
}

proptest! {
    #[test]
    fn prop_pin_routes_to_its_slice(n in 0u8..30) {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        let out = p.pin(n).unwrap().pwm().unwrap();
        prop_assert_eq!(out.slice().number(), (n >> 1) & 7);
        prop_assert_eq!(out.channel() == Channel::B, n & 1 == 1);
    }

    #[test]
    fn prop_period_never_overshoots(period in MIN_PERIOD_NS..=MAX_PERIOD_NS) {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        let mut out = p.pin(0).unwrap().pwm().unwrap();
        out.set_period(period).unwrap();
        let actual = programmed_period(&sim, Slice::new(0).unwrap());
        prop_assert!(actual <= period as u64);
        prop_assert!(actual > 0);
    }
}
