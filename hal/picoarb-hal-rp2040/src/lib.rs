//! RP2040 peripheral resource arbiter
//!
//! Implements the `picoarb-hal` capability traits (and the `embedded-hal`
//! 1.0 ones) on top of the RP2040's IO_BANK0, PADS_BANK0, SIO, PWM and ADC
//! blocks:
//!
//! - GPIO function arbitration with one function per pin
//! - PWM slices with period solving and wrap-interrupt dispatch
//! - ADC channel binding, single-shot and free-running sampling
//! - Per-core GPIO interrupt routing
//! - A pin façade tying the arbiters together
//!
//! All register traffic goes through [`regs::RegisterBus`]. On target that
//! is volatile MMIO; on the host it is the register model in [`sim`], so
//! everything above the bus is tested without hardware.
//!
//! ```ignore
//! let mut p = Peripherals::take(HalConfig::default()).unwrap();
//! let mut led = p.pin(25)?.pwm()?;
//! led.set_period(1_000_000)?;
//! led.set_level(500)?;
//! led.set_enabled(true)?;
//! ```

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod gpio;
pub mod irq;
pub mod peripherals;
pub mod pin;
pub mod pwm;
pub mod regs;
pub mod sim;
pub mod sync;
pub mod transport;

pub use adc::{Adc, AdcInput, AdcToken};
pub use gpio::{Gpio, OverrideTarget};
pub use irq::Interrupts;
pub use peripherals::Peripherals;
pub use pin::PinRef;
pub use pwm::{Pwm, PwmChannel, SliceHandle, WrapHandler};
pub use regs::{Mmio, RegisterBus};
pub use sync::{with_shared, Shared};
pub use transport::{I2cPins, SpiPins, UartPins};

// Re-export the capability traits for convenience
pub use picoarb_hal::{AnalogInput, DigitalIo, PinHandler, PinInterrupts, PwmOutput};
