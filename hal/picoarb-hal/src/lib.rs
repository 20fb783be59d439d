//! picoarb Hardware Abstraction Layer
//!
//! Capability traits the RP2040 arbiter exposes to the drivers built on
//! top of it (transports, sensor and radio protocol layers). Drivers
//! depend on these traits, never on the register layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (BME280, RFM69, ...)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  picoarb-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  picoarb-hal-rp2040                     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::DigitalIo`] - Digital I/O
//! - [`pwm::PwmOutput`] - PWM channel control
//! - [`adc::AnalogInput`] - ADC sampling
//! - [`irq::PinInterrupts`] - GPIO edge callbacks
//! - [`i2c::I2cBus`] - Register read/write contract for I2C transports

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod i2c;
pub mod irq;
pub mod pwm;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use gpio::DigitalIo;
pub use i2c::I2cBus;
pub use irq::{PinHandler, PinInterrupts};
pub use pwm::PwmOutput;
