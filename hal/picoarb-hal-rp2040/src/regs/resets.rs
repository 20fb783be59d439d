//! RESETS: subsystem reset control

use super::{Reg, RegisterBus};

pub const RESETS_BASE: u32 = 0x4000_c000;

const RESET: u32 = 0x00;
const RESET_DONE: u32 = 0x08;

/// Subsystem bits in RESET / RESET_DONE
pub mod reset_bits {
    pub const ADC: u32 = 1 << 0;
    pub const IO_BANK0: u32 = 1 << 5;
    pub const PADS_BANK0: u32 = 1 << 8;
    pub const PWM: u32 = 1 << 14;
    /// Every subsystem
    pub const ALL: u32 = 0x01ff_ffff;
}

#[derive(Clone, Copy)]
pub struct Resets<B> {
    bus: B,
}

impl<B: RegisterBus> Resets<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn reset(&self) -> Reg<B> {
        Reg::new(self.bus, RESETS_BASE + RESET)
    }

    pub fn reset_done(&self) -> Reg<B> {
        Reg::new(self.bus, RESETS_BASE + RESET_DONE)
    }
}
