//! Pin façade
//!
//! [`PinRef`] routes per-pin operations to whichever arbiter owns them, so
//! application code can work in terms of pin numbers.

use picoarb_core::{AdcChannel, Error, Events, Mode, Pin, Result};
use picoarb_hal::PinHandler;

use crate::adc::AdcInput;
use crate::peripherals::Peripherals;
use crate::pwm::PwmChannel;
use crate::regs::RegisterBus;

/// One pin of a [`Peripherals`]
pub struct PinRef<'a, B> {
    p: &'a mut Peripherals<B>,
    pin: Pin,
}

impl<'a, B: RegisterBus> PinRef<'a, B> {
    pub(crate) fn new(p: &'a mut Peripherals<B>, pin: Pin) -> Self {
        Self { p, pin }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn number(&self) -> u8 {
        self.pin.number()
    }

    pub fn mode(&mut self) -> Result<Mode> {
        self.p.gpio().mode(self.pin)
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.p.gpio().set_mode(self.pin, mode)
    }

    /// Return the pin to NULL, dropping its core 0 interrupt if any
    pub fn deinit(&mut self) -> Result<()> {
        if self.p.interrupts().is_watched(self.pin) {
            self.p
                .interrupts()
                .set_interrupt_events(self.pin, Events::NONE, None)?;
        }
        self.p.gpio().deinit(self.pin);
        Ok(())
    }

    pub fn get(&mut self) -> Result<bool> {
        self.p.gpio().get(self.pin)
    }

    pub fn set(&mut self, high: bool) -> Result<()> {
        self.p.gpio().set(self.pin, high)
    }

    pub fn toggle(&mut self) -> Result<()> {
        self.p.gpio().toggle(self.pin)
    }

    /// Switch to PWM and return the channel the pin drives
    pub fn pwm(self) -> Result<PwmChannel<'a, B>> {
        let (slice, channel) = self.p.gpio().pwm_pin(self.pin)?;
        Ok(self.p.pwm().channel(slice, channel))
    }

    /// Switch to analog input (pins 26..=29)
    ///
    /// The ADC is brought up before the pad is parked; if bring-up fails
    /// the pin keeps its mode.
    pub fn adc(self) -> Result<AdcInput<'a, B>> {
        AdcChannel::from_gpio(self.pin)?;
        self.p.adc()?;
        let channel = self.p.gpio().adc_pin(self.pin)?;
        Ok(self.p.adc()?.input(channel))
    }

    /// Call `handler` on either edge, or stop with `None`
    pub fn set_interrupt(&mut self, handler: Option<PinHandler>) -> Result<()> {
        self.set_interrupt_events(Events::EDGES, handler)
    }

    pub fn set_interrupt_events(
        &mut self,
        events: Events,
        handler: Option<PinHandler>,
    ) -> Result<()> {
        self.p
            .interrupts()
            .set_interrupt_events(self.pin, events, handler)
    }
}

impl<B: RegisterBus> picoarb_hal::DigitalIo for PinRef<'_, B> {
    type Error = Error;

    fn get(&mut self) -> Result<bool> {
        PinRef::get(self)
    }

    fn set(&mut self, high: bool) -> Result<()> {
        PinRef::set(self, high)
    }
}

impl<B: RegisterBus> embedded_hal::digital::ErrorType for PinRef<'_, B> {
    type Error = Error;
}

impl<B: RegisterBus> embedded_hal::digital::InputPin for PinRef<'_, B> {
    fn is_high(&mut self) -> Result<bool> {
        PinRef::get(self)
    }

    fn is_low(&mut self) -> Result<bool> {
        PinRef::get(self).map(|high| !high)
    }
}

impl<B: RegisterBus> embedded_hal::digital::OutputPin for PinRef<'_, B> {
    fn set_low(&mut self) -> Result<()> {
        PinRef::set(self, false)
    }

    fn set_high(&mut self) -> Result<()> {
        PinRef::set(self, true)
    }
}

impl<B: RegisterBus> embedded_hal::digital::StatefulOutputPin for PinRef<'_, B> {
    fn is_set_high(&mut self) -> Result<bool> {
        Ok(self.p.gpio().out_level(self.pin))
    }

    fn is_set_low(&mut self) -> Result<bool> {
        Ok(!self.p.gpio().out_level(self.pin))
    }

    fn toggle(&mut self) -> Result<()> {
        PinRef::toggle(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBus;
    use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
    use crate::regs::{reset_bits, RESETS_BASE};
    use picoarb_core::{Channel, Core, HalConfig, PollBudget, Pull, Slice};

    #[test]
    fn test_embedded_hal_output() {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        let mut led = p.pin(25).unwrap();
        OutputPin::set_high(&mut led).unwrap();
        assert_eq!(led.mode(), Ok(Mode::Output));
        assert_eq!(led.is_set_high(), Ok(true));
        StatefulOutputPin::toggle(&mut led).unwrap();
        assert_eq!(led.is_set_low(), Ok(true));
        assert_eq!(InputPin::is_low(&mut led), Ok(true));
    }

    #[test]
    fn test_input_follows_pad() {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        sim.drive_input(Pin::new(3).unwrap(), Some(true));
        let mut button = p.pin(3).unwrap();
        assert_eq!(InputPin::is_high(&mut button), Ok(true));
        assert_eq!(button.mode(), Ok(Mode::Input));
    }

    #[test]
    fn test_pwm_routing() {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        let ch = p.pin(25).unwrap().pwm().unwrap();
        assert_eq!(ch.slice(), Slice::new(4).unwrap());
        assert_eq!(ch.channel(), Channel::B);
        assert_eq!(p.pin(25).unwrap().mode(), Ok(Mode::Pwm));
    }

    #[test]
    fn test_adc_routing() {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        assert!(matches!(p.pin(5).unwrap().adc(), Err(Error::BadParameter)));
        let input = p.pin(27).unwrap().adc().unwrap();
        assert_eq!(input.channel(), AdcChannel::Adc1);
        assert_eq!(p.pin(27).unwrap().mode(), Ok(Mode::Off));
    }

    #[test]
    fn test_failed_adc_bring_up_leaves_pin_alone() {
        let sim = SimBus::new();
        let config = HalConfig::default().with_poll_budget(PollBudget(8));
        let mut p = Peripherals::new(sim.core(Core::Core0), config);
        p.pin(28).unwrap().set_mode(Mode::InputPullup).unwrap();

        sim.stick(RESETS_BASE + 0x08, reset_bits::ADC, 0);
        assert!(matches!(p.pin(28).unwrap().adc(), Err(Error::Timeout)));
        assert_eq!(p.pin(28).unwrap().mode(), Ok(Mode::InputPullup));
        assert_eq!(p.gpio().pull(Pin::new(28).unwrap()), Pull::Up);

        sim.unstick(RESETS_BASE + 0x08);
        assert!(p.pin(28).unwrap().adc().is_ok());
        assert_eq!(p.pin(28).unwrap().mode(), Ok(Mode::Off));
    }

    #[test]
    fn test_deinit_drops_interrupt() {
        let sim = SimBus::new();
        let mut p = Peripherals::new(sim.core(Core::Core0), HalConfig::default());
        let mut pin = p.pin(8).unwrap();
        pin.set_mode(Mode::Input).unwrap();
        pin.set_interrupt(Some(|_, _| {})).unwrap();
        pin.deinit().unwrap();
        assert_eq!(pin.mode(), Ok(Mode::Off));
        assert!(!p.interrupts().is_watched(Pin::new(8).unwrap()));
    }
}
