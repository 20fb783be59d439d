//! Bounded busy-polling
//!
//! Register handshakes (reset done, ADC ready, PWM phase steps) are polled
//! with an iteration budget instead of spinning forever.

use crate::error::{Error, Result};

/// Maximum number of polls before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget(pub u32);

impl PollBudget {
    pub const DEFAULT: PollBudget = PollBudget(100_000);

    pub const fn iterations(self) -> u32 {
        self.0
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Poll `done` until it returns true
///
/// Returns the number of polls it took, or `Timeout` once the budget is
/// spent. A zero budget still checks once.
pub fn poll_until(budget: PollBudget, mut done: impl FnMut() -> bool) -> Result<u32> {
    let mut polls = 0;
    loop {
        polls += 1;
        if done() {
            return Ok(polls);
        }
        if polls >= budget.0 {
            return Err(Error::Timeout);
        }
        core::hint::spin_loop();
    }
}
