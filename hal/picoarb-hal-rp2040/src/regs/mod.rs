//! Register access primitives
//!
//! Typed views over the RP2040 register blocks the arbiter drives. The
//! views only know addresses and bit layouts; all policy lives in the
//! arbiter modules above.
//!
//! Every access goes through a [`RegisterBus`]: [`Mmio`] on target, or the
//! software register model in [`crate::sim`] on the host.

pub mod adc;
pub mod io_bank0;
mod mmio;
pub mod nvic;
pub mod pads;
pub mod pwm;
pub mod resets;
pub mod sio;

pub use adc::{AdcRegs, ADC_BASE};
pub use io_bank0::{IoBank0, IO_BANK0_BASE};
pub use mmio::Mmio;
pub use nvic::{Irq, Nvic, NVIC_ICER, NVIC_ICPR, NVIC_ISER, NVIC_ISPR};
pub use pads::{PadsBank0, PADS_BANK0_BASE};
pub use pwm::{PwmRegs, PWM_BASE};
pub use resets::{reset_bits, Resets, RESETS_BASE};
pub use sio::{Sio, SIO_BASE};

/// Offset of the atomic XOR alias of a peripheral register
pub const ALIAS_XOR: u32 = 0x1000;
/// Offset of the atomic bitmask-set alias
pub const ALIAS_SET: u32 = 0x2000;
/// Offset of the atomic bitmask-clear alias
pub const ALIAS_CLR: u32 = 0x3000;

/// True for addresses in the APB/AHB peripheral space, which decodes the
/// atomic aliases. SIO and the Cortex-M private bus do not.
pub const fn has_atomic_aliases(addr: u32) -> bool {
    addr >= 0x4000_0000 && addr < 0xd000_0000
}

/// 32-bit register read/write
///
/// `write` takes `&self`: registers are shared hardware, and exclusive
/// configuration access is enforced one level up by ownership of the
/// arbiter objects.
pub trait RegisterBus: Copy {
    fn read(&self, addr: u32) -> u32;
    fn write(&self, addr: u32, value: u32);
}

/// One register on a bus
#[derive(Clone, Copy)]
pub struct Reg<B> {
    bus: B,
    addr: u32,
}

impl<B: RegisterBus> Reg<B> {
    pub const fn new(bus: B, addr: u32) -> Self {
        Self { bus, addr }
    }

    pub const fn addr(&self) -> u32 {
        self.addr
    }

    pub fn get(&self) -> u32 {
        self.bus.read(self.addr)
    }

    pub fn set(&self, value: u32) {
        self.bus.write(self.addr, value)
    }

    /// Set `mask` bits, leaving the rest untouched
    pub fn set_bits(&self, mask: u32) {
        if has_atomic_aliases(self.addr) {
            self.bus.write(self.addr | ALIAS_SET, mask);
        } else {
            self.set(self.get() | mask);
        }
    }

    /// Clear `mask` bits, leaving the rest untouched
    pub fn clear_bits(&self, mask: u32) {
        if has_atomic_aliases(self.addr) {
            self.bus.write(self.addr | ALIAS_CLR, mask);
        } else {
            self.set(self.get() & !mask);
        }
    }

    /// Replace the bits under `mask` with the same bits of `value`
    pub fn replace_bits(&self, value: u32, mask: u32) {
        let old = self.get();
        if has_atomic_aliases(self.addr) {
            self.bus.write(self.addr | ALIAS_XOR, (old ^ value) & mask);
        } else {
            self.set((old & !mask) | (value & mask));
        }
    }

    /// True if every bit of `mask` is set
    pub fn has_bits(&self, mask: u32) -> bool {
        self.get() & mask == mask
    }

    /// Read a field
    pub fn field(&self, mask: u32, shift: u32) -> u32 {
        (self.get() & mask) >> shift
    }

    /// Write a field
    pub fn set_field(&self, value: u32, mask: u32, shift: u32) {
        self.replace_bits(value << shift, mask);
    }
}
