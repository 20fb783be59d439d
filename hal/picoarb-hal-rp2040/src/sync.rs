//! Sharing peripheral objects with interrupt handlers
//!
//! Interrupt vectors cannot take arguments, so an object they dispatch
//! through has to live in a `static`. [`Shared`] is that static: a
//! critical-section mutex around an optional value, installed once from
//! main-line code.
//!
//! ```ignore
//! static PERIPHERALS: Shared<Peripherals<Mmio>> = Shared::new();
//!
//! #[interrupt]
//! fn IO_IRQ_BANK0() {
//!     match with_shared(&PERIPHERALS, |p| p.interrupts().on_interrupt()) {
//!         Ok(0) => defmt::trace!("gpio irq: nothing to dispatch"),
//!         Ok(_) => {}
//!         // Not installed yet, or main-line code holds it: mask the line
//!         Err(e) => {
//!             defmt::warn!("gpio irq: {}", e);
//!             Nvic::new(unsafe { Mmio::steal() }).disable(Irq::IoBank0);
//!         }
//!     }
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use picoarb_core::{Error, Result};

/// Value reachable from both main-line code and interrupt handlers
pub struct Shared<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Store `value`, returning whatever was installed before
    pub fn install(&self, value: T) -> Option<T> {
        self.inner.lock(|cell| cell.borrow_mut().replace(value))
    }

    /// Remove the value
    pub fn take(&self) -> Option<T> {
        self.inner.lock(|cell| cell.borrow_mut().take())
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Run `f` on the value inside a critical section
    ///
    /// Fails with `NotInitialised` before [`Shared::install`], and with
    /// `UnexpectedValue` when called from inside another `with` on the same
    /// cell.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.inner.lock(|cell| {
            let mut guard = cell.try_borrow_mut().map_err(|_| Error::UnexpectedValue)?;
            guard.as_mut().map(f).ok_or(Error::NotInitialised)
        })
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` on a shared value
pub fn with_shared<T, R>(shared: &Shared<T>, f: impl FnOnce(&mut T) -> R) -> Result<R> {
    shared.with(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    static COUNTER: Shared<u32> = Shared::new();

    #[test]
    fn test_install_and_use() {
        let cell: Shared<u32> = Shared::new();
        assert_eq!(cell.with(|v| *v), Err(Error::NotInitialised));
        assert!(!cell.is_installed());

        assert_eq!(cell.install(1), None);
        assert_eq!(with_shared(&cell, |v| {
            *v += 1;
            *v
        }), Ok(2));
        assert_eq!(cell.install(7), Some(2));
        assert_eq!(cell.take(), Some(7));
        assert!(!cell.is_installed());
    }

    #[test]
    fn test_nested_access() {
        let cell = Shared::new();
        cell.install(0u8);
        let inner = cell.with(|_| cell.with(|v| *v));
        assert_eq!(inner, Ok(Err(Error::UnexpectedValue)));
    }

    #[test]
    fn test_static() {
        COUNTER.install(10);
        assert_eq!(with_shared(&COUNTER, |v| *v * 2), Ok(20));
    }
}
