//! PWM: per-slice registers and the shared enable/interrupt bank

use picoarb_core::Slice;

use super::{Reg, RegisterBus};

pub const PWM_BASE: u32 = 0x4005_0000;

const SLICE_STRIDE: u32 = 0x14;
const CSR: u32 = 0x00;
const DIV: u32 = 0x04;
const CTR: u32 = 0x08;
const CC: u32 = 0x0c;
const TOP: u32 = 0x10;
const EN: u32 = 0xa0;
const INTR: u32 = 0xa4;
const INTE: u32 = 0xa8;
const INTF: u32 = 0xac;
const INTS: u32 = 0xb0;

pub mod csr {
    pub const EN: u32 = 1 << 0;
    pub const PH_CORRECT: u32 = 1 << 1;
    pub const A_INV: u32 = 1 << 2;
    pub const B_INV: u32 = 1 << 3;
    pub const DIVMODE_SHIFT: u32 = 4;
    pub const DIVMODE_MASK: u32 = 0b11 << DIVMODE_SHIFT;
    /// Retard the phase by one count (self-clearing)
    pub const PH_RET: u32 = 1 << 6;
    /// Advance the phase by one count (self-clearing)
    pub const PH_ADV: u32 = 1 << 7;
}

pub mod div {
    pub const FRAC_MASK: u32 = 0xf;
    pub const INT_SHIFT: u32 = 4;
    pub const INT_MASK: u32 = 0xff << INT_SHIFT;
    /// Power-on value: divide by 1
    pub const RESET: u32 = 0x10;
}

pub mod cc {
    pub const A_MASK: u32 = 0xffff;
    pub const B_SHIFT: u32 = 16;
    pub const B_MASK: u32 = 0xffff << B_SHIFT;
}

/// Power-on TOP value
pub const TOP_RESET: u32 = 0xffff;

/// All slice bits in EN / INTR / INTE / INTF / INTS
pub const SLICE_MASK: u32 = 0xff;

#[derive(Clone, Copy)]
pub struct PwmRegs<B> {
    bus: B,
}

impl<B: RegisterBus> PwmRegs<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    fn slice_reg(&self, slice: Slice, offset: u32) -> Reg<B> {
        Reg::new(self.bus, PWM_BASE + SLICE_STRIDE * slice.number() as u32 + offset)
    }

    fn reg(&self, offset: u32) -> Reg<B> {
        Reg::new(self.bus, PWM_BASE + offset)
    }

    pub fn csr(&self, slice: Slice) -> Reg<B> {
        self.slice_reg(slice, CSR)
    }

    pub fn div(&self, slice: Slice) -> Reg<B> {
        self.slice_reg(slice, DIV)
    }

    pub fn ctr(&self, slice: Slice) -> Reg<B> {
        self.slice_reg(slice, CTR)
    }

    pub fn cc(&self, slice: Slice) -> Reg<B> {
        self.slice_reg(slice, CC)
    }

    pub fn top(&self, slice: Slice) -> Reg<B> {
        self.slice_reg(slice, TOP)
    }

    pub fn en(&self) -> Reg<B> {
        self.reg(EN)
    }

    /// Raw wrap flags, write 1 to clear
    pub fn intr(&self) -> Reg<B> {
        self.reg(INTR)
    }

    pub fn inte(&self) -> Reg<B> {
        self.reg(INTE)
    }

    pub fn intf(&self) -> Reg<B> {
        self.reg(INTF)
    }

    pub fn ints(&self) -> Reg<B> {
        self.reg(INTS)
    }
}
