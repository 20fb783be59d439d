//! PADS_BANK0: electrical pad controls

use picoarb_core::Pin;

use super::{Reg, RegisterBus};

pub const PADS_BANK0_BASE: u32 = 0x4001_c000;

/// GPIOn pad control fields
pub mod pad {
    pub const SLEWFAST: u32 = 1 << 0;
    pub const SCHMITT: u32 = 1 << 1;
    pub const PDE: u32 = 1 << 2;
    pub const PUE: u32 = 1 << 3;
    pub const DRIVE_SHIFT: u32 = 4;
    pub const DRIVE_MASK: u32 = 0b11 << DRIVE_SHIFT;
    pub const IE: u32 = 1 << 6;
    pub const OD: u32 = 1 << 7;

    /// Power-on value: Schmitt, pull-down, 4 mA, input enabled
    pub const RESET: u32 = 0x56;
}

#[derive(Clone, Copy)]
pub struct PadsBank0<B> {
    bus: B,
}

impl<B: RegisterBus> PadsBank0<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn voltage_select(&self) -> Reg<B> {
        Reg::new(self.bus, PADS_BANK0_BASE)
    }

    pub fn gpio(&self, pin: Pin) -> Reg<B> {
        Reg::new(self.bus, PADS_BANK0_BASE + 4 + 4 * pin.number() as u32)
    }
}
