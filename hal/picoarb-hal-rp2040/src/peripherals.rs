//! The peripherals context
//!
//! Owns every arbiter: GPIO functions, the PWM engine, the ADC and the
//! core 0 interrupt routing. `&mut` access to one [`Peripherals`] is what
//! serialises configuration.

use portable_atomic::{AtomicBool, Ordering};

use picoarb_core::config::parse_pin_name;
use picoarb_core::{AdcChannel, Core, Error, Events, HalConfig, Pin, PinConfig, Result};

use crate::adc::{Adc, AdcInput, AdcToken};
use crate::gpio::Gpio;
use crate::irq::Interrupts;
use crate::pin::PinRef;
use crate::pwm::Pwm;
use crate::regs::{Mmio, RegisterBus};

static TAKEN: AtomicBool = AtomicBool::new(false);

/// All arbiters over one register bus
pub struct Peripherals<B> {
    bus: B,
    config: HalConfig,
    gpio: Gpio<B>,
    pwm: Pwm<B>,
    adc: Option<Adc<B>>,
    adc_token: Option<AdcToken<B>>,
    interrupts: Interrupts<B>,
    core1_taken: bool,
}

impl Peripherals<Mmio> {
    /// The chip's peripherals, once per program
    ///
    /// Returns `None` on every later call.
    pub fn take(config: HalConfig) -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        #[allow(unsafe_code)]
        // SAFETY: the flag above lets exactly one caller through
        let bus = unsafe { Mmio::steal() };
        Some(Self::new(bus, config))
    }
}

impl<B: RegisterBus> Peripherals<B> {
    /// Arbiters over an arbitrary bus, e.g. the software register model
    pub fn new(bus: B, config: HalConfig) -> Self {
        info!("peripherals: sys clk {} Hz", config.sys_clk_hz);
        Self {
            bus,
            config,
            gpio: Gpio::new(bus),
            pwm: Pwm::new(bus, &config),
            adc: None,
            adc_token: Some(AdcToken::new(bus)),
            interrupts: Interrupts::new(bus, Core::Core0),
            core1_taken: false,
        }
    }

    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    pub fn gpio(&mut self) -> &mut Gpio<B> {
        &mut self.gpio
    }

    pub fn pwm(&mut self) -> &mut Pwm<B> {
        &mut self.pwm
    }

    /// Core 0 GPIO interrupts
    pub fn interrupts(&mut self) -> &mut Interrupts<B> {
        &mut self.interrupts
    }

    /// Core 1 GPIO interrupts, once
    ///
    /// The returned object must be moved to core 1; on core 0 it refuses
    /// to register or dispatch.
    pub fn take_core1_interrupts(&mut self) -> Option<Interrupts<B>> {
        if self.core1_taken {
            return None;
        }
        self.core1_taken = true;
        Some(Interrupts::new(self.bus, Core::Core1))
    }

    /// The ADC, brought up on first use
    ///
    /// A failed bring-up can be retried.
    pub fn adc(&mut self) -> Result<&mut Adc<B>> {
        if self.adc.is_none() {
            let token = self.adc_token.take().ok_or(Error::NotInitialised)?;
            match token.init(&self.config) {
                Ok(adc) => self.adc = Some(adc),
                Err(e) => {
                    self.adc_token = Some(AdcToken::new(self.bus));
                    return Err(e);
                }
            }
        }
        self.adc.as_mut().ok_or(Error::NotInitialised)
    }

    /// The on-chip temperature sensor
    pub fn temperature_sensor(&mut self) -> Result<AdcInput<'_, B>> {
        Ok(self.adc()?.input(AdcChannel::Temperature))
    }

    /// Handle on pin `number` (0..=29)
    pub fn pin(&mut self, number: u8) -> Result<PinRef<'_, B>> {
        let pin = Pin::new(number)?;
        Ok(PinRef::new(self, pin))
    }

    /// Handle on a named pin, e.g. `"GPIO25"`, `"GP25"` or `"25"`
    pub fn pin_by_name(&mut self, name: &str) -> Result<PinRef<'_, B>> {
        let pin = parse_pin_name(name).ok_or(Error::BadParameter)?;
        Ok(PinRef::new(self, pin))
    }

    /// Program a table of pin assignments
    ///
    /// Every entry is validated before any pin is touched.
    pub fn apply(&mut self, table: &[PinConfig]) -> Result<()> {
        for entry in table {
            entry.resolve()?;
        }
        for entry in table {
            let (pin, mode) = entry.resolve()?;
            self.gpio.set_mode(pin, mode)?;
        }
        Ok(())
    }

    /// Release every core 0 GPIO interrupt and PWM wrap handler, and
    /// return all pins to NULL
    pub fn close(&mut self) -> Result<()> {
        let watched = self.interrupts.watched();
        for pin in Pin::all().filter(|p| watched & p.mask() != 0) {
            self.interrupts.set_interrupt_events(pin, Events::NONE, None)?;
        }
        self.pwm.clear_interrupts();
        self.gpio.close();
        info!("peripherals: closed");
        Ok(())
    }
}
