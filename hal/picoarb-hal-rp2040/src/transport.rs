//! Pin claims for the serial transports
//!
//! The SPI, I2C and UART drivers live outside the arbiter; they ask it for
//! their pins. A claim checks every pin against the RP2040 function table,
//! rejects one pin named for two roles, then programs the functions and
//! returns the peripheral instance (0 or 1) the pins route to.

use picoarb_core::{Error, Mode, Pin, Result};

use crate::gpio::Gpio;
use crate::regs::RegisterBus;

/// SPI signal carried by a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRole {
    Rx,
    Csn,
    Sck,
    Tx,
}

impl SpiRole {
    pub const fn of(pin: Pin) -> Self {
        match pin.number() % 4 {
            0 => SpiRole::Rx,
            1 => SpiRole::Csn,
            2 => SpiRole::Sck,
            _ => SpiRole::Tx,
        }
    }
}

/// SPI instance a pin routes to
pub const fn spi_instance(pin: Pin) -> u8 {
    (pin.number() / 8) % 2
}

/// I2C instance a pin routes to
pub const fn i2c_instance(pin: Pin) -> u8 {
    (pin.number() / 2) % 2
}

/// UART instance a pin routes to
pub const fn uart_instance(pin: Pin) -> u8 {
    ((pin.number() + 4) / 8) % 2
}

/// SPI pin set; chip select is a plain GPIO output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiPins {
    pub rx: Pin,
    pub tx: Pin,
    pub sck: Pin,
    pub cs: Pin,
}

impl SpiPins {
    /// The four consecutive pins starting at `rx`
    ///
    /// `rx` must be a multiple of 4 with three pins after it, e.g. 0
    /// gives RX 0, CSn 1, SCK 2, TX 3.
    pub fn block(rx: Pin) -> Result<Self> {
        if rx.number() % 4 != 0 {
            return Err(Error::BadParameter);
        }
        let n = rx.number();
        Ok(Self {
            rx,
            cs: Pin::new(n + 1)?,
            sck: Pin::new(n + 2)?,
            tx: Pin::new(n + 3)?,
        })
    }
}

/// I2C pin pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cPins {
    pub sda: Pin,
    pub scl: Pin,
}

/// UART pin pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPins {
    pub tx: Pin,
    pub rx: Pin,
}

fn check_distinct(pins: &[Pin]) -> Result<()> {
    for (i, a) in pins.iter().enumerate() {
        if pins[i + 1..].contains(a) {
            return Err(Error::DuplicateValue);
        }
    }
    Ok(())
}

fn check(ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::BadParameter)
    }
}

impl<B: RegisterBus> Gpio<B> {
    /// Claim pins for an SPI controller
    ///
    /// Data and clock pins go to the SPI function; chip select becomes an
    /// output driven high (deselected).
    pub fn claim_spi(&mut self, pins: SpiPins) -> Result<u8> {
        check_distinct(&[pins.rx, pins.tx, pins.sck, pins.cs])?;
        check(SpiRole::of(pins.rx) == SpiRole::Rx)?;
        check(SpiRole::of(pins.tx) == SpiRole::Tx)?;
        check(SpiRole::of(pins.sck) == SpiRole::Sck)?;

        let instance = spi_instance(pins.rx);
        check(spi_instance(pins.tx) == instance && spi_instance(pins.sck) == instance)?;

        self.set_mode(pins.rx, Mode::Spi)?;
        self.set_mode(pins.tx, Mode::Spi)?;
        self.set_mode(pins.sck, Mode::Spi)?;
        self.set_mode(pins.cs, Mode::Output)?;
        self.set(pins.cs, true)?;

        info!(
            "spi{}: rx {} tx {} sck {} cs {}",
            instance,
            pins.rx.number(),
            pins.tx.number(),
            pins.sck.number(),
            pins.cs.number()
        );
        Ok(instance)
    }

    /// Claim pins for an I2C controller
    pub fn claim_i2c(&mut self, pins: I2cPins) -> Result<u8> {
        check_distinct(&[pins.sda, pins.scl])?;
        check(pins.sda.number() % 2 == 0 && pins.scl.number() % 2 == 1)?;

        let instance = i2c_instance(pins.sda);
        check(i2c_instance(pins.scl) == instance)?;

        self.set_mode(pins.sda, Mode::I2c)?;
        self.set_mode(pins.scl, Mode::I2c)?;

        info!("i2c{}: sda {} scl {}", instance, pins.sda.number(), pins.scl.number());
        Ok(instance)
    }

    /// Claim pins for a UART
    pub fn claim_uart(&mut self, pins: UartPins) -> Result<u8> {
        check_distinct(&[pins.tx, pins.rx])?;
        check(pins.tx.number() % 4 == 0 && pins.rx.number() % 4 == 1)?;

        let instance = uart_instance(pins.tx);
        check(uart_instance(pins.rx) == instance)?;

        self.set_mode(pins.tx, Mode::Uart)?;
        self.set_mode(pins.rx, Mode::Uart)?;

        info!("uart{}: tx {} rx {}", instance, pins.tx.number(), pins.rx.number());
        Ok(instance)
    }
}
