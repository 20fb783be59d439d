//! Volatile memory-mapped bus
#![allow(unsafe_code)]

use super::RegisterBus;

/// Direct access to the RP2040 address space
///
/// Zero-sized; the only way to get one is [`Mmio::steal`], normally called
/// once by `Peripherals::take`.
#[derive(Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Must run on an RP2040, and the caller is responsible for not
    /// creating arbiter objects that fight over the same registers.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&self, addr: u32) -> u32 {
        // SAFETY: `addr` comes from the register map in this module tree
        // and is a valid, aligned device register on RP2040.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    #[inline(always)]
    fn write(&self, addr: u32, value: u32) {
        // SAFETY: as for `read`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }
}
