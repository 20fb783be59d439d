//! PWM slice identities and period solving
//!
//! The RP2040 has 8 PWM slices, each with two channels (A and B) sharing a
//! 16-bit counter and an 8.4 fixed-point clock divider. GPIO `n` drives
//! slice `(n >> 1) & 7`, channel `n & 1`, so pins `p` and `p + 16` alias to
//! the same output.
//!
//! # Period solving
//!
//! A slice's period is
//!
//! ```text
//! period = cycle * (wrap + 1) * (1 + phase_correct) * divider
//! ```
//!
//! [`solve_period`] first picks a divider assuming the wrap will land near
//! 95% of its range (so duty resolution stays high), then computes the
//! exact wrap for that divider.

use fixed::types::U12F4;

use crate::error::{Error, Result};
use crate::pin::Pin;

/// Number of PWM slices
pub const NUM_PWM_SLICES: usize = 8;

/// Largest counter wrap value
pub const MAX_WRAP: u16 = 0xFFFF;

/// Wrap value assumed when choosing a divider (95% of [`MAX_WRAP`])
pub const WRAP_ESTIMATE: u32 = 95 * MAX_WRAP as u32 / 100;

/// Shortest period at the default 125 MHz system clock
pub const MIN_PERIOD_NS: u32 = 8;

/// Longest period at the default 125 MHz system clock
///
/// Maximum divider, maximum wrap, phase-correct.
pub const MAX_PERIOD_NS: u32 = 268_369_920;

/// Validated PWM slice identity (0..7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slice(u8);

impl Slice {
    pub const fn new(number: u8) -> Result<Self> {
        if (number as usize) < NUM_PWM_SLICES {
            Ok(Self(number))
        } else {
            Err(Error::BadParameter)
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit for this slice in the EN / INTR / INTE / INTF / INTS registers
    pub const fn mask(self) -> u32 {
        1 << self.0
    }

    /// Slice and channel driven by a GPIO
    pub const fn for_pin(pin: Pin) -> (Slice, Channel) {
        let n = pin.number();
        let channel = if n & 1 == 0 { Channel::A } else { Channel::B };
        (Slice((n >> 1) & 7), channel)
    }

    /// Iterate over every slice
    pub fn all() -> impl Iterator<Item = Slice> {
        (0..NUM_PWM_SLICES as u8).map(Slice)
    }
}

/// PWM output channel within a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

/// Divider gating mode (CSR.DIVMODE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DivMode {
    /// Counter advances every divided clock
    #[default]
    FreeRunning = 0,
    /// Gated by the B pin being high
    BHigh = 1,
    /// Advance on B pin rising edges
    BRising = 2,
    /// Advance on B pin falling edges
    BFalling = 3,
}

/// 8.4 fixed-point clock divider (1.0 ..= 255.9375)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockDivider(U12F4);

impl ClockDivider {
    pub const ONE: ClockDivider = ClockDivider(U12F4::from_bits(16));
    pub const MAX: ClockDivider = ClockDivider(U12F4::from_bits(255 << 4 | 15));

    /// Build from integer and sixteenths parts
    pub fn new(integer: u8, fractional: u8) -> Result<Self> {
        if integer == 0 || fractional > 15 {
            return Err(Error::BadParameter);
        }
        Ok(Self(U12F4::from_bits((integer as u16) << 4 | fractional as u16)))
    }

    /// Build from the divider expressed in sixteenths (16 = 1.0)
    pub fn from_sixteenths(sixteenths: u16) -> Result<Self> {
        if !(16..=0xFFF).contains(&sixteenths) {
            return Err(Error::BadParameter);
        }
        Ok(Self(U12F4::from_bits(sixteenths)))
    }

    pub fn integer(self) -> u8 {
        (self.0.to_bits() >> 4) as u8
    }

    pub fn fractional(self) -> u8 {
        (self.0.to_bits() & 0xF) as u8
    }

    pub fn sixteenths(self) -> u16 {
        self.0.to_bits()
    }

    /// DIV register value (INT in bits 4..11, FRAC in bits 0..3)
    pub fn to_register(self) -> u32 {
        self.0.to_bits() as u32
    }

    /// Decode a DIV register value
    ///
    /// An integer part of zero is how the hardware encodes 256; it is
    /// outside the range this type models and is rejected.
    pub fn from_register(bits: u32) -> Result<Self> {
        Self::from_sixteenths((bits & 0xFFF) as u16)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num::<f32>()
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self::ONE
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockDivider {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{}/16", self.integer(), self.fractional())
    }
}

/// Software copy of a slice's configuration
///
/// Written to the hardware when the slice is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliceConfig {
    pub divider: ClockDivider,
    pub wrap: u16,
    pub phase_correct: bool,
    pub invert_a: bool,
    pub invert_b: bool,
    pub div_mode: DivMode,
}

impl SliceConfig {
    /// Hardware reset configuration
    pub const fn new() -> Self {
        Self {
            divider: ClockDivider::ONE,
            wrap: MAX_WRAP,
            phase_correct: false,
            invert_a: false,
            invert_b: false,
            div_mode: DivMode::FreeRunning,
        }
    }

    pub fn inverted(&self, channel: Channel) -> bool {
        match channel {
            Channel::A => self.invert_a,
            Channel::B => self.invert_b,
        }
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Divider, wrap and counting mode producing a requested period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodSolution {
    pub divider: ClockDivider,
    pub wrap: u16,
    pub phase_correct: bool,
}

impl PeriodSolution {
    fn counting_factor(&self) -> u64 {
        if self.phase_correct {
            2
        } else {
            1
        }
    }

    /// Period this solution actually produces
    pub fn period_ns(&self, cycle_ns: u32) -> u64 {
        cycle_ns as u64
            * (self.wrap as u64 + 1)
            * self.counting_factor()
            * self.divider.sixteenths() as u64
            / 16
    }

    /// Coarsest adjustment available around this solution
    ///
    /// The larger of one wrap step and one divider sixteenth, rounded up.
    pub fn resolution_ns(&self, cycle_ns: u32) -> u64 {
        let steps = (self.wrap as u64 + 1).max(self.divider.sixteenths() as u64);
        (cycle_ns as u64 * self.counting_factor() * steps).div_ceil(16)
    }
}

/// Shortest period for a given system clock cycle
pub const fn min_period_ns(cycle_ns: u32) -> u64 {
    cycle_ns as u64
}

/// Longest period for a given system clock cycle
pub const fn max_period_ns(cycle_ns: u32) -> u64 {
    cycle_ns as u64 * 0xFFF * (MAX_WRAP as u64 + 1) * 2 / 16
}

/// Choose divider and wrap for a period
///
/// Periods above half the maximum need phase-correct counting, which is
/// switched on regardless of `phase_correct`. Fails with `BadParameter`
/// outside `[min_period_ns, max_period_ns]`.
pub fn solve_period(period_ns: u32, cycle_ns: u32, phase_correct: bool) -> Result<PeriodSolution> {
    let period = period_ns as u64;
    let cycle = cycle_ns as u64;
    let max = max_period_ns(cycle_ns);

    if cycle == 0 || period < min_period_ns(cycle_ns) || period > max {
        return Err(Error::BadParameter);
    }

    let phase_correct = phase_correct || period > max / 2;
    let factor: u64 = if phase_correct { 2 } else { 1 };

    let rhs = 16 * period / (factor * cycle * (1 + WRAP_ESTIMATE as u64));
    let sixteenths = match rhs >> 4 {
        0 => 16,
        1..=255 => rhs,
        _ => ClockDivider::MAX.sixteenths() as u64,
    };

    let top = (16 * period / (sixteenths * cycle * factor)).saturating_sub(1);
    let wrap = top.min(MAX_WRAP as u64) as u16;

    Ok(PeriodSolution {
        divider: ClockDivider::from_sixteenths(sixteenths as u16)?,
        wrap,
        phase_correct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CYCLE: u32 = 8;

    #[test]
    fn test_limits_match_default_clock() {
        assert_eq!(min_period_ns(CYCLE), MIN_PERIOD_NS as u64);
        assert_eq!(max_period_ns(CYCLE), MAX_PERIOD_NS as u64);
        assert_eq!(WRAP_ESTIMATE, 62258);
    }

    #[test]
    fn test_slice_for_pin() {
        let (slice, channel) = Slice::for_pin(Pin::new(25).unwrap());
        assert_eq!(slice.number(), 4);
        assert_eq!(channel, Channel::B);

        let (slice, channel) = Slice::for_pin(Pin::new(0).unwrap());
        assert_eq!(slice.number(), 0);
        assert_eq!(channel, Channel::A);
    }

    #[test]
    fn test_slice_range() {
        assert!(Slice::new(7).is_ok());
        assert_eq!(Slice::new(8), Err(Error::BadParameter));
    }

    #[test]
    fn test_divider_parts() {
        let div = ClockDivider::new(2, 8).unwrap();
        assert_eq!(div.integer(), 2);
        assert_eq!(div.fractional(), 8);
        assert_eq!(div.to_register(), 0x28);
        assert!((div.to_f32() - 2.5).abs() < f32::EPSILON);

        assert_eq!(ClockDivider::new(0, 0), Err(Error::BadParameter));
        assert_eq!(ClockDivider::new(1, 16), Err(Error::BadParameter));
        assert_eq!(ClockDivider::MAX.integer(), 255);
        assert_eq!(ClockDivider::MAX.fractional(), 15);
        assert_eq!(ClockDivider::from_register(0x10), Ok(ClockDivider::ONE));
    }

    #[test]
    fn test_solve_shortest_period() {
        let s = solve_period(8, CYCLE, false).unwrap();
        assert_eq!(s.divider, ClockDivider::ONE);
        assert_eq!(s.wrap, 0);
        assert!(!s.phase_correct);
        assert_eq!(s.period_ns(CYCLE), 8);
    }

    #[test]
    fn test_solve_one_millisecond() {
        let s = solve_period(1_000_000, CYCLE, false).unwrap();
        assert_eq!(s.divider, ClockDivider::new(2, 0).unwrap());
        assert_eq!(s.wrap, 62499);
        assert!(!s.phase_correct);
        assert_eq!(s.period_ns(CYCLE), 1_000_000);
    }

    #[test]
    fn test_solve_longest_period() {
        let s = solve_period(MAX_PERIOD_NS, CYCLE, false).unwrap();
        assert!(s.phase_correct);
        assert_eq!(s.divider, ClockDivider::MAX);
        assert_eq!(s.wrap, 0xFFFF);
        assert_eq!(s.period_ns(CYCLE), MAX_PERIOD_NS as u64);
    }

    #[test]
    fn test_solve_out_of_range() {
        assert_eq!(solve_period(7, CYCLE, false), Err(Error::BadParameter));
        assert_eq!(
            solve_period(MAX_PERIOD_NS + 1, CYCLE, false),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn test_solve_keeps_requested_phase_correct() {
        let s = solve_period(1_000_000, CYCLE, true).unwrap();
        assert!(s.phase_correct);
        assert_eq!(s.period_ns(CYCLE), 1_000_000);
    }

    proptest! {
        #[test]
        fn prop_pin_aliasing(p in 0u8..14) {
            let a = Slice::for_pin(Pin::new(p).unwrap());
            let b = Slice::for_pin(Pin::new(p + 16).unwrap());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_mapping_formula(p in 0u8..30) {
            let (slice, channel) = Slice::for_pin(Pin::new(p).unwrap());
            prop_assert_eq!(slice.number(), (p >> 1) & 7);
            prop_assert_eq!(channel == Channel::B, p & 1 == 1);
        }

        #[test]
        fn prop_period_within_resolution(period in MIN_PERIOD_NS..=MAX_PERIOD_NS) {
            let s = solve_period(period, CYCLE, false).unwrap();
            let actual = s.period_ns(CYCLE);
            let diff = (period as u64).abs_diff(actual);
            prop_assert!(diff <= s.resolution_ns(CYCLE), "{} vs {} ({:?})", period, actual, s);
            prop_assert!(actual <= period as u64);
        }
    }
}
