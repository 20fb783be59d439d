//! GPIO interrupt routing
//!
//! Each core has its own enable/force/status bank in IO_BANK0 and its own
//! NVIC; the raw event register is shared. An [`Interrupts`] object is
//! bound to one core and must only be used from that core, since the NVIC
//! reached through the bus is always the executing core's. Registration
//! and dispatch check the SIO CPUID and refuse to run on the other core.

use picoarb_core::{Core, Error, Events, Pin, Result, NUM_BANK0_GPIOS};
use picoarb_hal::PinHandler;

use crate::regs::io_bank0::IRQ_BANKS;
use crate::regs::{IoBank0, Irq, Nvic, RegisterBus, Sio};

/// GPIO interrupt registrations of one core
pub struct Interrupts<B> {
    io: IoBank0<B>,
    nvic: Nvic<B>,
    sio: Sio<B>,
    core: Core,
    handlers: [Option<PinHandler>; NUM_BANK0_GPIOS],
    watched: u32,
}

impl<B: RegisterBus> Interrupts<B> {
    pub fn new(bus: B, core: Core) -> Self {
        Self {
            io: IoBank0::new(bus),
            nvic: Nvic::new(bus),
            sio: Sio::new(bus),
            core,
            handlers: [None; NUM_BANK0_GPIOS],
            watched: 0,
        }
    }

    /// Routing for the core executing this call
    pub fn current(bus: B) -> Self {
        let core = Core::from_cpuid(Sio::new(bus).cpuid().get());
        Self::new(bus, core)
    }

    pub fn core(&self) -> Core {
        self.core
    }

    fn on_bound_core(&self) -> bool {
        Core::from_cpuid(self.sio.cpuid().get()) == self.core
    }

    /// Bitmask of pins with a handler on this core
    pub fn watched(&self) -> u32 {
        self.watched
    }

    pub fn is_watched(&self, pin: Pin) -> bool {
        self.watched & pin.mask() != 0
    }

    fn acknowledge(&self, pin: Pin, events: Events) {
        self.io
            .intr(pin.bank())
            .set(events.bits() << pin.irq_shift());
    }

    /// Watch `events` on `pin`, or stop watching it with `None`
    ///
    /// Events latched before the call are discarded. The `IO_IRQ_BANK0`
    /// line stays enabled while any pin is watched on this core. Called
    /// from the other core it fails with `UnexpectedValue` and changes
    /// nothing.
    pub fn set_interrupt_events(
        &mut self,
        pin: Pin,
        events: Events,
        handler: Option<PinHandler>,
    ) -> Result<()> {
        if handler.is_some() && events.is_empty() {
            return Err(Error::BadParameter);
        }
        if !self.on_bound_core() {
            warn!("irq core{}: registration from the other core", self.core.index());
            return Err(Error::UnexpectedValue);
        }

        let inte = self.io.inte(self.core, pin.bank());
        self.acknowledge(pin, Events::ALL);
        inte.clear_bits(Events::ALL.bits() << pin.irq_shift());

        match handler {
            Some(_) => {
                inte.set_bits(events.bits() << pin.irq_shift());
                self.watched |= pin.mask();
            }
            None => self.watched &= !pin.mask(),
        }
        self.handlers[pin.index()] = handler;

        if self.watched != 0 {
            if !self.nvic.is_enabled(Irq::IoBank0) {
                self.nvic.unpend(Irq::IoBank0);
                self.nvic.enable(Irq::IoBank0);
            }
        } else {
            self.nvic.disable(Irq::IoBank0);
        }

        debug!(
            "irq core{}: pin {} events {:#x} {}",
            self.core.index(),
            pin.number(),
            events.bits(),
            if handler.is_some() { "watched" } else { "released" }
        );
        Ok(())
    }

    /// Force events on `pin` for this core, or stop forcing with
    /// [`Events::NONE`]
    pub fn set_forced(&mut self, pin: Pin, events: Events) {
        let intf = self.io.intf(self.core, pin.bank());
        intf.replace_bits(
            events.bits() << pin.irq_shift(),
            Events::ALL.bits() << pin.irq_shift(),
        );
    }

    /// Pending events of `pin` on this core
    pub fn status(&self, pin: Pin) -> Events {
        let ints = self.io.ints(self.core, pin.bank()).get();
        Events::from_bits(ints >> pin.irq_shift())
    }

    /// Dispatch pending GPIO events
    ///
    /// Call from the `IO_IRQ_BANK0` vector of the bound core. Each pin is
    /// acknowledged before its handler runs; pins without a handler are
    /// acknowledged in full. Returns the number of handlers called, and
    /// does nothing on the other core.
    pub fn on_interrupt(&mut self) -> usize {
        if !self.on_bound_core() {
            warn!("irq core{}: dispatch from the other core", self.core.index());
            return 0;
        }
        let mut called = 0;
        for bank in 0..IRQ_BANKS {
            let status = self.io.ints(self.core, bank).get();
            if status == 0 {
                continue;
            }
            for slot in 0..8u8 {
                let Ok(pin) = Pin::new(bank as u8 * 8 + slot) else {
                    break;
                };
                let events = Events::from_bits(status >> pin.irq_shift());
                if events.is_empty() {
                    continue;
                }
                match self.handlers[pin.index()] {
                    Some(handler) => {
                        self.acknowledge(pin, events);
                        handler(pin, events);
                        called += 1;
                    }
                    None => {
                        trace!("irq: unhandled events on pin {}", pin.number());
                        self.acknowledge(pin, Events::ALL);
                    }
                }
            }
        }
        called
    }
}

impl<B: RegisterBus> picoarb_hal::PinInterrupts for Interrupts<B> {
    type Error = Error;

    fn set_interrupt(&mut self, pin: Pin, handler: Option<PinHandler>) -> Result<()> {
        self.set_interrupt_events(pin, Events::EDGES, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Gpio;
    use crate::sim::SimBus;
    use picoarb_core::Mode;
    use picoarb_hal::PinInterrupts;
    use portable_atomic::{AtomicU32, Ordering};

    fn pin(n: u8) -> Pin {
        Pin::new(n).unwrap()
    }

    // Each test records into its own slot: last (pin << 8 | events) and a count
    static LAST: [AtomicU32; 4] = [
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
    ];
    static COUNT: [AtomicU32; 4] = [
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
    ];

    fn record(slot: usize, pin: Pin, events: Events) {
        LAST[slot].store((pin.number() as u32) << 8 | events.bits(), Ordering::Relaxed);
        COUNT[slot].fetch_add(1, Ordering::Relaxed);
    }

    fn on_edge(pin: Pin, events: Events) {
        record(0, pin, events);
    }

    fn on_level(pin: Pin, events: Events) {
        record(1, pin, events);
    }

    fn on_core1(pin: Pin, events: Events) {
        record(2, pin, events);
    }

    fn ignore(_: Pin, _: Events) {}

    #[test]
    fn test_rise_edge_dispatch() {
        let sim = SimBus::new();
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        let nvic = Nvic::new(sim.core(Core::Core0));

        // Stale edge is dropped on registration
        sim.raise_gpio_events(pin(5), Events::EDGE_FALL);
        irq.set_interrupt(pin(5), Some(on_edge)).unwrap();
        assert!(nvic.is_enabled(Irq::IoBank0));
        assert!(irq.status(pin(5)).is_empty());

        sim.raise_gpio_events(pin(5), Events::EDGE_RISE);
        assert_eq!(irq.status(pin(5)), Events::EDGE_RISE);
        assert_eq!(irq.on_interrupt(), 1);
        assert_eq!(COUNT[0].load(Ordering::Relaxed), 1);
        assert_eq!(LAST[0].load(Ordering::Relaxed), 5 << 8 | Events::EDGE_RISE.bits());
        assert!(irq.status(pin(5)).is_empty());

        assert_eq!(irq.on_interrupt(), 0);
        assert_eq!(COUNT[0].load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_pad_edge_reaches_handler() {
        let sim = SimBus::new();
        let mut gpio = Gpio::new(sim.core(Core::Core0));
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        gpio.set_mode(pin(12), Mode::Input).unwrap();
        sim.drive_input(pin(12), Some(false));
        irq.set_interrupt_events(pin(12), Events::LEVEL_HIGH, Some(on_level))
            .unwrap();

        assert_eq!(irq.on_interrupt(), 0);
        sim.drive_input(pin(12), Some(true));
        // Level events persist until the pad changes
        assert_eq!(irq.on_interrupt(), 1);
        assert_eq!(irq.on_interrupt(), 1);
        assert_eq!(LAST[1].load(Ordering::Relaxed), 12 << 8 | Events::LEVEL_HIGH.bits());
        sim.drive_input(pin(12), Some(false));
        assert_eq!(irq.on_interrupt(), 0);
    }

    #[test]
    fn test_line_stays_enabled_while_any_pin_is_watched() {
        let sim = SimBus::new();
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        let nvic = Nvic::new(sim.core(Core::Core0));

        irq.set_interrupt(pin(2), Some(ignore)).unwrap();
        irq.set_interrupt(pin(9), Some(ignore)).unwrap();
        assert_eq!(irq.watched(), 1 << 2 | 1 << 9);

        irq.set_interrupt(pin(2), None).unwrap();
        assert!(nvic.is_enabled(Irq::IoBank0));
        irq.set_interrupt(pin(9), None).unwrap();
        assert!(!nvic.is_enabled(Irq::IoBank0));
        assert!(!irq.is_watched(pin(9)));
    }

    #[test]
    fn test_cores_are_independent() {
        let sim = SimBus::new();
        let mut irq0 = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        let mut irq1 = Interrupts::new(sim.core(Core::Core1), Core::Core1);

        irq1.set_interrupt(pin(3), Some(on_core1)).unwrap();
        assert!(Nvic::new(sim.core(Core::Core1)).is_enabled(Irq::IoBank0));
        assert!(!Nvic::new(sim.core(Core::Core0)).is_enabled(Irq::IoBank0));

        sim.raise_gpio_events(pin(3), Events::EDGE_FALL);
        assert_eq!(irq0.on_interrupt(), 0);
        assert_eq!(irq1.on_interrupt(), 1);
        assert_eq!(LAST[2].load(Ordering::Relaxed), 3 << 8 | Events::EDGE_FALL.bits());
    }

    #[test]
    fn test_unhandled_events_are_acknowledged() {
        let sim = SimBus::new();
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        let io = IoBank0::new(sim.core(Core::Core0));
        io.inte(Core::Core0, 2).set(Events::EDGES.bits() << 4);
        sim.raise_gpio_events(pin(17), Events::EDGE_RISE);
        assert_eq!(irq.status(pin(17)), Events::EDGE_RISE);

        assert_eq!(irq.on_interrupt(), 0);
        assert!(irq.status(pin(17)).is_empty());
    }

    #[test]
    fn test_forced_events() {
        let sim = SimBus::new();
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        irq.set_interrupt(pin(29), Some(ignore)).unwrap();
        irq.set_forced(pin(29), Events::EDGE_RISE);
        assert_eq!(irq.on_interrupt(), 1);
        // Forcing holds until released
        assert_eq!(irq.on_interrupt(), 1);
        irq.set_forced(pin(29), Events::NONE);
        assert_eq!(irq.on_interrupt(), 0);
    }

    #[test]
    fn test_refuses_the_other_core() {
        let sim = SimBus::new();
        let mut irq1 = Interrupts::new(sim.core(Core::Core1), Core::Core1);
        irq1.set_interrupt(pin(8), Some(ignore)).unwrap();
        sim.raise_gpio_events(pin(8), Events::EDGE_RISE);

        // The same object reached from core 0
        let mut stray = Interrupts::new(sim.core(Core::Core0), Core::Core1);
        assert_eq!(
            stray.set_interrupt(pin(9), Some(ignore)),
            Err(Error::UnexpectedValue)
        );
        assert_eq!(stray.on_interrupt(), 0);
        assert_eq!(irq1.status(pin(8)), Events::EDGE_RISE);
        assert!(!Nvic::new(sim.core(Core::Core0)).is_enabled(Irq::IoBank0));

        assert_eq!(irq1.on_interrupt(), 1);
    }

    #[test]
    fn test_current_core() {
        let sim = SimBus::new();
        assert_eq!(Interrupts::current(sim.core(Core::Core0)).core(), Core::Core0);
        assert_eq!(Interrupts::current(sim.core(Core::Core1)).core(), Core::Core1);
    }

    #[test]
    fn test_empty_event_mask() {
        let sim = SimBus::new();
        let mut irq = Interrupts::new(sim.core(Core::Core0), Core::Core0);
        assert_eq!(
            irq.set_interrupt_events(pin(0), Events::NONE, Some(ignore)),
            Err(Error::BadParameter)
        );
        irq.set_interrupt_events(pin(0), Events::NONE, None).unwrap();
    }
}
