//! SIO: single-cycle GPIO access and core identity
//!
//! SIO has no atomic aliases of its own; the SET/CLR/XOR registers below
//! serve the same purpose for the GPIO output and output-enable words.

use super::{Reg, RegisterBus};

pub const SIO_BASE: u32 = 0xd000_0000;

const CPUID: u32 = 0x00;
const GPIO_IN: u32 = 0x04;
const GPIO_OUT: u32 = 0x10;
const GPIO_OUT_SET: u32 = 0x14;
const GPIO_OUT_CLR: u32 = 0x18;
const GPIO_OUT_XOR: u32 = 0x1c;
const GPIO_OE: u32 = 0x20;
const GPIO_OE_SET: u32 = 0x24;
const GPIO_OE_CLR: u32 = 0x28;
const GPIO_OE_XOR: u32 = 0x2c;

#[derive(Clone, Copy)]
pub struct Sio<B> {
    bus: B,
}

impl<B: RegisterBus> Sio<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    fn reg(&self, offset: u32) -> Reg<B> {
        Reg::new(self.bus, SIO_BASE + offset)
    }

    pub fn cpuid(&self) -> Reg<B> {
        self.reg(CPUID)
    }

    pub fn gpio_in(&self) -> Reg<B> {
        self.reg(GPIO_IN)
    }

    pub fn gpio_out(&self) -> Reg<B> {
        self.reg(GPIO_OUT)
    }

    pub fn gpio_out_set(&self) -> Reg<B> {
        self.reg(GPIO_OUT_SET)
    }

    pub fn gpio_out_clr(&self) -> Reg<B> {
        self.reg(GPIO_OUT_CLR)
    }

    pub fn gpio_out_xor(&self) -> Reg<B> {
        self.reg(GPIO_OUT_XOR)
    }

    pub fn gpio_oe(&self) -> Reg<B> {
        self.reg(GPIO_OE)
    }

    pub fn gpio_oe_set(&self) -> Reg<B> {
        self.reg(GPIO_OE_SET)
    }

    pub fn gpio_oe_clr(&self) -> Reg<B> {
        self.reg(GPIO_OE_CLR)
    }

    pub fn gpio_oe_xor(&self) -> Reg<B> {
        self.reg(GPIO_OE_XOR)
    }
}
