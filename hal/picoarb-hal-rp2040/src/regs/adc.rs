//! ADC control block

use super::{Reg, RegisterBus};

pub const ADC_BASE: u32 = 0x4004_c000;

const CS: u32 = 0x00;
const RESULT: u32 = 0x04;
const FCS: u32 = 0x08;
const FIFO: u32 = 0x0c;
const DIV: u32 = 0x10;
const INTR: u32 = 0x14;
const INTE: u32 = 0x18;
const INTF: u32 = 0x1c;
const INTS: u32 = 0x20;

pub mod cs {
    pub const EN: u32 = 1 << 0;
    pub const TS_EN: u32 = 1 << 1;
    pub const START_ONCE: u32 = 1 << 2;
    pub const START_MANY: u32 = 1 << 3;
    pub const READY: u32 = 1 << 8;
    pub const ERR: u32 = 1 << 9;
    pub const ERR_STICKY: u32 = 1 << 10;
    pub const AINSEL_SHIFT: u32 = 12;
    pub const AINSEL_MASK: u32 = 0b111 << AINSEL_SHIFT;
    pub const RROBIN_SHIFT: u32 = 16;
    pub const RROBIN_MASK: u32 = 0x1f << RROBIN_SHIFT;
}

pub mod fcs {
    pub const EN: u32 = 1 << 0;
    pub const SHIFT: u32 = 1 << 1;
    pub const ERR: u32 = 1 << 2;
    pub const DREQ_EN: u32 = 1 << 3;
    pub const EMPTY: u32 = 1 << 8;
    pub const FULL: u32 = 1 << 9;
    pub const UNDER: u32 = 1 << 10;
    pub const OVER: u32 = 1 << 11;
    pub const LEVEL_SHIFT: u32 = 16;
    pub const LEVEL_MASK: u32 = 0xf << LEVEL_SHIFT;
    pub const THRESH_SHIFT: u32 = 24;
    pub const THRESH_MASK: u32 = 0xf << THRESH_SHIFT;
}

pub mod div {
    pub const FRAC_MASK: u32 = 0xff;
    pub const INT_SHIFT: u32 = 8;
    pub const INT_MASK: u32 = 0xffff << INT_SHIFT;
}

/// FIFO entry error flag
pub const FIFO_ERR: u32 = 1 << 15;

/// Conversion result bits
pub const RESULT_MASK: u32 = 0xfff;

/// FIFO depth
pub const FIFO_DEPTH: usize = 4;

#[derive(Clone, Copy)]
pub struct AdcRegs<B> {
    bus: B,
}

impl<B: RegisterBus> AdcRegs<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    fn reg(&self, offset: u32) -> Reg<B> {
        Reg::new(self.bus, ADC_BASE + offset)
    }

    pub fn cs(&self) -> Reg<B> {
        self.reg(CS)
    }

    pub fn result(&self) -> Reg<B> {
        self.reg(RESULT)
    }

    pub fn fcs(&self) -> Reg<B> {
        self.reg(FCS)
    }

    pub fn fifo(&self) -> Reg<B> {
        self.reg(FIFO)
    }

    pub fn div(&self) -> Reg<B> {
        self.reg(DIV)
    }

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
