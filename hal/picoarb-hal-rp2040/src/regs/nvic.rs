//! NVIC line control
//!
//! Each core has its own NVIC at the same addresses; a bus therefore always
//! reaches the NVIC of the core it runs on.

use super::{Reg, RegisterBus};

pub const NVIC_ISER: u32 = 0xe000_e100;
pub const NVIC_ICER: u32 = 0xe000_e180;
pub const NVIC_ISPR: u32 = 0xe000_e200;
pub const NVIC_ICPR: u32 = 0xe000_e280;

/// Interrupt lines the arbiter manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Irq {
    PwmWrap = 4,
    IoBank0 = 13,
    AdcFifo = 22,
}

impl Irq {
    pub const fn mask(self) -> u32 {
        1 << self as u8
    }
}

#[derive(Clone, Copy)]
pub struct Nvic<B> {
    bus: B,
}

impl<B: RegisterBus> Nvic<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn enable(&self, irq: Irq) {
        Reg::new(self.bus, NVIC_ISER).set(irq.mask());
    }

    pub fn disable(&self, irq: Irq) {
        Reg::new(self.bus, NVIC_ICER).set(irq.mask());
    }

    pub fn is_enabled(&self, irq: Irq) -> bool {
        Reg::new(self.bus, NVIC_ISER).get() & irq.mask() != 0
    }

    pub fn pend(&self, irq: Irq) {
        Reg::new(self.bus, NVIC_ISPR).set(irq.mask());
    }

    pub fn unpend(&self, irq: Irq) {
        Reg::new(self.bus, NVIC_ICPR).set(irq.mask());
    }

    pub fn is_pending(&self, irq: Irq) -> bool {
        Reg::new(self.bus, NVIC_ISPR).get() & irq.mask() != 0
    }
}
