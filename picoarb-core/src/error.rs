//! Error taxonomy
//!
//! Every recoverable misuse of the arbiter surfaces as one of these
//! variants. Only impossible internal states panic.

use core::fmt;

/// Result type for arbiter operations
pub type Result<T> = core::result::Result<T, Error>;

/// Arbiter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Pin, mode, slice or value out of range
    BadParameter,
    /// Hardware readback did not match what was written
    ///
    /// Usually a wiring fault or a race with the other core.
    UnexpectedValue,
    /// Operation attempted before the required initialisation
    NotInitialised,
    /// A polled hardware condition did not occur within its budget
    Timeout,
    /// One physical pin requested for two roles
    DuplicateValue,
    /// Temperature requested from an ADC channel that is not the sensor
    WrongChannel,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::BadParameter => "bad parameter",
            Error::UnexpectedValue => "unexpected value read back from hardware",
            Error::NotInitialised => "not initialised",
            Error::Timeout => "timed out waiting for hardware",
            Error::DuplicateValue => "pin requested for more than one role",
            Error::WrongChannel => "not the temperature sensor channel",
        };
        f.write_str(msg)
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::pwm::Error for Error {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}
