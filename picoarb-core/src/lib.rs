//! Board-agnostic core logic for the picoarb resource arbiter
//!
//! This crate contains everything that does not touch a register:
//!
//! - Pin, slice and channel identities (validated newtypes)
//! - Pin modes, pad settings and interrupt event masks
//! - The error taxonomy shared by every layer
//! - PWM period solving (divider + wrap search)
//! - ADC voltage and temperature conversions
//! - Bounded polling budgets
//! - HAL configuration and pin assignments

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod adc;
pub mod config;
pub mod error;
pub mod pin;
pub mod poll;
pub mod pwm;

pub use adc::AdcChannel;
pub use config::{HalConfig, PinConfig, WrongChannelPolicy};
pub use error::{Error, Result};
pub use pin::{
    Core, DriveStrength, Events, Function, Mode, Override, Pin, PinState, Pull, SlewRate,
    NUM_BANK0_GPIOS,
};
pub use poll::PollBudget;
pub use pwm::{Channel, ClockDivider, DivMode, PeriodSolution, Slice, SliceConfig};
