//! Interrupt registration capability

use picoarb_core::{Events, Pin};

/// GPIO interrupt callback
///
/// Runs in interrupt context on the core that registered it. Must not call
/// back into blocking configuration APIs.
pub type PinHandler = fn(Pin, Events);

/// GPIO interrupt registration
pub trait PinInterrupts {
    /// Error type for registration
    type Error;

    /// Watch both edges of `pin`, or stop watching it with `None`
    fn set_interrupt(&mut self, pin: Pin, handler: Option<PinHandler>) -> Result<(), Self::Error>;
}
