//! Pin assignments from configuration tables
//!
//! Configuration stores plain numbers; they become a [`Pin`] and [`Mode`]
//! only after validation.

use crate::error::{Error, Result};
use crate::pin::{Mode, Pin};

/// Pin assignment with a raw mode value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Raw [`Mode`] discriminant
    pub mode: u8,
}

impl PinConfig {
    pub const fn new(pin: u8, mode: Mode) -> Self {
        Self {
            pin,
            mode: mode as u8,
        }
    }

    /// Assignment for a named pin, e.g. `"GPIO25"`
    pub fn from_name(name: &str, mode: Mode) -> Result<Self> {
        let pin = parse_pin_name(name).ok_or(Error::BadParameter)?;
        Ok(Self::new(pin.number(), mode))
    }

    /// Validate both fields
    pub fn resolve(&self) -> Result<(Pin, Mode)> {
        Ok((Pin::new(self.pin)?, Mode::from_raw(self.mode)?))
    }
}

/// Parse a pin name: `"GPIO25"`, `"gpio25"`, `"GP25"` or a bare `"25"`
///
/// Prefixes match in any case.
pub fn parse_pin_name(s: &str) -> Option<Pin> {
    let s = s.trim();
    let digits = strip_prefix_ignore_case(s, "gpio")
        .or_else(|| strip_prefix_ignore_case(s, "gp"))
        .unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u8 = digits.parse().ok()?;
    Pin::new(number).ok()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}
