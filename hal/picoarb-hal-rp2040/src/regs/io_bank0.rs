//! IO_BANK0: function select, overrides and GPIO interrupts

use picoarb_core::{Core, Pin};

use super::{Reg, RegisterBus};

pub const IO_BANK0_BASE: u32 = 0x4001_4000;

const INTR0: u32 = 0x0f0;
const PROC0_INTE0: u32 = 0x100;
const PROC1_INTE0: u32 = 0x130;
const INTE_OFFSET: u32 = 0x00;
const INTF_OFFSET: u32 = 0x10;
const INTS_OFFSET: u32 = 0x20;

/// Number of interrupt register banks (8 pins each)
pub const IRQ_BANKS: usize = 4;

/// GPIOn_CTRL fields
pub mod ctrl {
    pub const FUNCSEL_MASK: u32 = 0x1f;
    pub const OUTOVER_SHIFT: u32 = 8;
    pub const OUTOVER_MASK: u32 = 0b11 << OUTOVER_SHIFT;
    pub const OEOVER_SHIFT: u32 = 12;
    pub const OEOVER_MASK: u32 = 0b11 << OEOVER_SHIFT;
    pub const INOVER_SHIFT: u32 = 16;
    pub const INOVER_MASK: u32 = 0b11 << INOVER_SHIFT;
    pub const IRQOVER_SHIFT: u32 = 28;
    pub const IRQOVER_MASK: u32 = 0b11 << IRQOVER_SHIFT;
}

/// Edge bits of every pin nibble in an INTR register
pub const EDGE_BITS: u32 = 0xcccc_cccc;

#[derive(Clone, Copy)]
pub struct IoBank0<B> {
    bus: B,
}

impl<B: RegisterBus> IoBank0<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    fn reg(&self, offset: u32) -> Reg<B> {
        Reg::new(self.bus, IO_BANK0_BASE + offset)
    }

    pub fn gpio_status(&self, pin: Pin) -> Reg<B> {
        self.reg(8 * pin.number() as u32)
    }

    pub fn gpio_ctrl(&self, pin: Pin) -> Reg<B> {
        self.reg(8 * pin.number() as u32 + 4)
    }

    /// Raw interrupt status, shared by both cores
    pub fn intr(&self, bank: usize) -> Reg<B> {
        self.reg(INTR0 + 4 * bank as u32)
    }

    fn proc_base(core: Core) -> u32 {
        match core {
            Core::Core0 => PROC0_INTE0,
            Core::Core1 => PROC1_INTE0,
        }
    }

    pub fn inte(&self, core: Core, bank: usize) -> Reg<B> {
        self.reg(Self::proc_base(core) + INTE_OFFSET + 4 * bank as u32)
    }

    pub fn intf(&self, core: Core, bank: usize) -> Reg<B> {
        self.reg(Self::proc_base(core) + INTF_OFFSET + 4 * bank as u32)
    }

    pub fn ints(&self, core: Core, bank: usize) -> Reg<B> {
        self.reg(Self::proc_base(core) + INTS_OFFSET + 4 * bank as u32)
    }
}
