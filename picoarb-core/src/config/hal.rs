//! HAL-wide settings

use crate::poll::PollBudget;

/// Default RP2040 system clock
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// What a temperature read does on a channel that is not the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WrongChannelPolicy {
    /// Fail with `Error::WrongChannel`
    #[default]
    Error,
    /// Return 0.0 °C without touching the hardware
    ReturnZero,
}

/// Arbiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HalConfig {
    /// System clock feeding the PWM slices
    pub sys_clk_hz: u32,
    /// Budget for every bounded register poll
    pub poll_budget: PollBudget,
    /// Temperature read on a non-sensor channel
    pub wrong_channel: WrongChannelPolicy,
}

impl HalConfig {
    /// Power-on RP2040 defaults (125 MHz)
    pub const RP2040: HalConfig = HalConfig {
        sys_clk_hz: SYS_CLK_HZ,
        poll_budget: PollBudget::DEFAULT,
        wrong_channel: WrongChannelPolicy::Error,
    };

    /// Length of one system clock cycle in whole nanoseconds
    pub const fn cycle_period_ns(&self) -> u32 {
        if self.sys_clk_hz == 0 {
            return 0;
        }
        1_000_000_000 / self.sys_clk_hz
    }

    pub const fn with_sys_clk_hz(mut self, hz: u32) -> Self {
        self.sys_clk_hz = hz;
        self
    }

    pub const fn with_poll_budget(mut self, budget: PollBudget) -> Self {
        self.poll_budget = budget;
        self
    }

    pub const fn with_wrong_channel(mut self, policy: WrongChannelPolicy) -> Self {
        self.wrong_channel = policy;
        self
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self::RP2040
    }
}
