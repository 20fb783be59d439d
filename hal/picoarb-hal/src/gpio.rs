//! Digital I/O capability
//!
//! Implemented by pin handles of chip-specific HALs.

/// Digital input/output pin
///
/// Implementations configure the pin on first use if it has not been
/// set up yet, so a driver can call `set` on a fresh pin.
pub trait DigitalIo {
    /// Error type for pin operations
    type Error;

    /// Read the pin level
    fn get(&mut self) -> Result<bool, Self::Error>;

    /// Drive the pin level
    fn set(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the pin high
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }

    /// Drive the pin low
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    /// Check if the pin reads high
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.get()
    }

    /// Check if the pin reads low
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.get().map(|high| !high)
    }
}
