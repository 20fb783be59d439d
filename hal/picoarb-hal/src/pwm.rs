//! PWM capability
//!
//! One channel of a PWM slice. Counter, wrap and enable state belong to
//! the slice and are shared with the sibling channel.

/// PWM output channel
pub trait PwmOutput {
    /// Error type for PWM operations
    type Error;

    /// Compare level of this channel
    fn level(&self) -> Result<u16, Self::Error>;

    /// Set the compare level of this channel
    fn set_level(&mut self, level: u16) -> Result<(), Self::Error>;

    /// Live counter of the slice
    fn counter(&self) -> Result<u16, Self::Error>;

    /// Overwrite the live counter of the slice
    fn set_counter(&mut self, value: u16) -> Result<(), Self::Error>;

    /// Advance the counter phase by one count
    fn inc(&mut self) -> Result<(), Self::Error>;

    /// Retard the counter phase by one count
    fn dec(&mut self) -> Result<(), Self::Error>;

    /// Counter wrap (TOP) value of the slice
    fn wrap(&self) -> Result<u16, Self::Error>;

    /// Set the counter wrap (TOP) value of the slice
    fn set_wrap(&mut self, wrap: u16) -> Result<(), Self::Error>;

    /// Start or stop the slice
    fn set_enabled(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Choose divider and wrap for a period in nanoseconds
    fn set_period(&mut self, period_ns: u32) -> Result<(), Self::Error>;
}
