//! GPIO function arbiter
//!
//! Owns the function of every user-bank pin. A pin carries exactly one
//! function at a time; switching goes through [`Gpio::set_mode`], which
//! reprograms the single function-select field, or through
//! [`Gpio::deinit`] back to the NULL function.
//!
//! The per-pin table records which pins have had their one-time SIO setup
//! and which mode was last programmed. Hardware remains the source of
//! truth for [`Gpio::mode`].

use picoarb_core::{
    AdcChannel, Channel, DriveStrength, Error, Function, Mode, Override, Pin, PinState, Pull,
    Result, Slice, SlewRate, NUM_BANK0_GPIOS,
};

use crate::regs::io_bank0::ctrl;
use crate::regs::pads::pad;
use crate::regs::{IoBank0, PadsBank0, RegisterBus, Sio};

/// All user-bank pins as an SIO mask
pub const ALL_PINS_MASK: u32 = (1 << NUM_BANK0_GPIOS) - 1;

/// Signal a GPIOn_CTRL override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverrideTarget {
    /// Output level (OUTOVER)
    Output,
    /// Output enable (OEOVER)
    OutputEnable,
    /// Input to peripherals (INOVER)
    Input,
    /// Interrupt to processors (IRQOVER)
    Irq,
}

impl OverrideTarget {
    const fn field(self) -> (u32, u32) {
        match self {
            OverrideTarget::Output => (ctrl::OUTOVER_MASK, ctrl::OUTOVER_SHIFT),
            OverrideTarget::OutputEnable => (ctrl::OEOVER_MASK, ctrl::OEOVER_SHIFT),
            OverrideTarget::Input => (ctrl::INOVER_MASK, ctrl::INOVER_SHIFT),
            OverrideTarget::Irq => (ctrl::IRQOVER_MASK, ctrl::IRQOVER_SHIFT),
        }
    }
}

/// GPIO function arbiter
pub struct Gpio<B> {
    io: IoBank0<B>,
    pads: PadsBank0<B>,
    sio: Sio<B>,
    pins: [PinState; NUM_BANK0_GPIOS],
}

impl<B: RegisterBus> Gpio<B> {
    /// Create an arbiter with every pin untouched
    pub fn new(bus: B) -> Self {
        Self {
            io: IoBank0::new(bus),
            pads: PadsBank0::new(bus),
            sio: Sio::new(bus),
            pins: [PinState::new(); NUM_BANK0_GPIOS],
        }
    }

    /// Arbiter bookkeeping for a pin
    pub fn state(&self, pin: Pin) -> PinState {
        self.pins[pin.index()]
    }

    pub fn is_initialized(&self, pin: Pin) -> bool {
        self.pins[pin.index()].initialized
    }

    /// One-time SIO setup: input direction, output low, function SIO
    ///
    /// Does nothing on a pin that is already initialized.
    pub fn init(&mut self, pin: Pin) {
        let state = &mut self.pins[pin.index()];
        if state.initialized {
            return;
        }
        self.sio.gpio_oe_clr().set(pin.mask());
        self.sio.gpio_out_clr().set(pin.mask());
        set_function(&self.io, &self.pads, pin, Function::Sio);
        state.initialized = true;
        state.mode = Mode::Input;
        trace!("gpio {}: init", pin.number());
    }

    /// Program a pin's mode
    ///
    /// Output mode is verified by reading the function select and output
    /// enable back; a mismatch fails with `UnexpectedValue`.
    pub fn set_mode(&mut self, pin: Pin, mode: Mode) -> Result<()> {
        self.init(pin);

        match mode {
            Mode::Output => {
                set_function(&self.io, &self.pads, pin, Function::Sio);
                self.sio.gpio_oe_set().set(pin.mask());
                if self.function(pin) != Some(Function::Sio) || !self.output_enabled(pin) {
                    warn!("gpio {}: output readback mismatch", pin.number());
                    return Err(Error::UnexpectedValue);
                }
            }
            Mode::Input | Mode::InputPulldown | Mode::InputPullup => {
                set_function(&self.io, &self.pads, pin, Function::Sio);
                self.sio.gpio_oe_clr().set(pin.mask());
                self.set_pull(pin, mode.pull());
            }
            Mode::I2c => {
                set_function(&self.io, &self.pads, pin, Function::I2c);
                self.set_pull(pin, Pull::Up);
                self.set_schmitt(pin, true);
                self.set_slew_rate(pin, SlewRate::Fast);
            }
            Mode::Spi | Mode::Pwm | Mode::Uart => {
                set_function(&self.io, &self.pads, pin, mode.function());
            }
            Mode::Off => {
                set_function(&self.io, &self.pads, pin, Function::Null);
                self.set_pull(pin, Pull::None);
            }
        }

        self.pins[pin.index()].mode = mode;
        debug!("gpio {}: mode {}", pin.number(), mode);
        Ok(())
    }

    /// Return a pin to the NULL function and forget its setup
    pub fn deinit(&mut self, pin: Pin) {
        if !self.pins[pin.index()].initialized {
            return;
        }
        set_function(&self.io, &self.pads, pin, Function::Null);
        self.pins[pin.index()] = PinState::new();
        trace!("gpio {}: deinit", pin.number());
    }

    /// Deinitialise every pin that was set up
    pub fn close(&mut self) {
        for pin in Pin::all() {
            self.deinit(pin);
        }
    }

    /// Decode a pin's mode from the hardware
    pub fn mode(&self, pin: Pin) -> Result<Mode> {
        match self.function(pin) {
            Some(Function::Spi) => Ok(Mode::Spi),
            Some(Function::I2c) => Ok(Mode::I2c),
            Some(Function::Pwm) => Ok(Mode::Pwm),
            Some(Function::Uart) => Ok(Mode::Uart),
            Some(Function::Null) => Ok(Mode::Off),
            Some(Function::Sio) => Ok(if self.output_enabled(pin) {
                Mode::Output
            } else {
                match self.pull(pin) {
                    Pull::Up => Mode::InputPullup,
                    Pull::Down => Mode::InputPulldown,
                    Pull::None => Mode::Input,
                }
            }),
            _ => Err(Error::UnexpectedValue),
        }
    }

    /// Current function select, `None` for an undefined encoding
    pub fn function(&self, pin: Pin) -> Option<Function> {
        Function::from_bits(self.io.gpio_ctrl(pin).get() & ctrl::FUNCSEL_MASK)
    }

    fn output_enabled(&self, pin: Pin) -> bool {
        self.sio.gpio_oe().get() & pin.mask() != 0
    }

    /// Read a pin, configuring it as an input first if needed
    pub fn get(&mut self, pin: Pin) -> Result<bool> {
        if !self.is_initialized(pin) {
            self.set_mode(pin, Mode::Input)?;
        }
        Ok(self.level(pin))
    }

    /// Drive a pin, configuring it as an output first if needed
    pub fn set(&mut self, pin: Pin, high: bool) -> Result<()> {
        if !self.is_initialized(pin) {
            self.set_mode(pin, Mode::Output)?;
        }
        self.put(pin, high);
        Ok(())
    }

    /// Read a pin that must already be set up
    pub fn try_get(&self, pin: Pin) -> Result<bool> {
        if !self.is_initialized(pin) {
            return Err(Error::NotInitialised);
        }
        Ok(self.level(pin))
    }

    /// Drive a pin that must already be set up
    pub fn try_set(&mut self, pin: Pin, high: bool) -> Result<()> {
        if !self.is_initialized(pin) {
            return Err(Error::NotInitialised);
        }
        self.put(pin, high);
        Ok(())
    }

    /// Invert a pin's output level
    pub fn toggle(&mut self, pin: Pin) -> Result<()> {
        if !self.is_initialized(pin) {
            self.set_mode(pin, Mode::Output)?;
        }
        self.sio.gpio_out_xor().set(pin.mask());
        Ok(())
    }

    /// Level the pin is being driven to (not the pad level)
    pub fn out_level(&self, pin: Pin) -> bool {
        self.sio.gpio_out().get() & pin.mask() != 0
    }

    fn level(&self, pin: Pin) -> bool {
        self.sio.gpio_in().get() & pin.mask() != 0
    }

    fn put(&self, pin: Pin, high: bool) {
        if high {
            self.sio.gpio_out_set().set(pin.mask());
        } else {
            self.sio.gpio_out_clr().set(pin.mask());
        }
    }

    /// Pad levels of every pin
    pub fn read_all(&self) -> u32 {
        self.sio.gpio_in().get() & ALL_PINS_MASK
    }

    /// Drive the pins in `mask` high
    pub fn set_mask(&self, mask: u32) -> Result<()> {
        check_mask(mask)?;
        self.sio.gpio_out_set().set(mask);
        Ok(())
    }

    /// Drive the pins in `mask` low
    pub fn clear_mask(&self, mask: u32) -> Result<()> {
        check_mask(mask)?;
        self.sio.gpio_out_clr().set(mask);
        Ok(())
    }

    /// Drive the pins in `mask` to the matching bits of `value`
    pub fn put_masked(&self, mask: u32, value: u32) -> Result<()> {
        check_mask(mask)?;
        let out = self.sio.gpio_out().get();
        self.sio.gpio_out_xor().set((out ^ value) & mask);
        Ok(())
    }

    /// Program the pull resistors in one write
    pub fn set_pull(&mut self, pin: Pin, pull: Pull) {
        let bits = match pull {
            Pull::None => 0,
            Pull::Up => pad::PUE,
            Pull::Down => pad::PDE,
        };
        self.pads.gpio(pin).replace_bits(bits, pad::PUE | pad::PDE);
        self.pins[pin.index()].pull = pull;
    }

    /// Decode the pull resistors from the pad
    pub fn pull(&self, pin: Pin) -> Pull {
        let bits = self.pads.gpio(pin).get();
        if bits & pad::PUE != 0 {
            Pull::Up
        } else if bits & pad::PDE != 0 {
            Pull::Down
        } else {
            Pull::None
        }
    }

    pub fn set_drive_strength(&self, pin: Pin, strength: DriveStrength) {
        self.pads
            .gpio(pin)
            .set_field(strength as u32, pad::DRIVE_MASK, pad::DRIVE_SHIFT);
    }

    pub fn drive_strength(&self, pin: Pin) -> DriveStrength {
        DriveStrength::from_bits(self.pads.gpio(pin).field(pad::DRIVE_MASK, pad::DRIVE_SHIFT))
    }

    pub fn set_slew_rate(&self, pin: Pin, rate: SlewRate) {
        match rate {
            SlewRate::Fast => self.pads.gpio(pin).set_bits(pad::SLEWFAST),
            SlewRate::Slow => self.pads.gpio(pin).clear_bits(pad::SLEWFAST),
        }
    }

    pub fn slew_rate(&self, pin: Pin) -> SlewRate {
        if self.pads.gpio(pin).has_bits(pad::SLEWFAST) {
            SlewRate::Fast
        } else {
            SlewRate::Slow
        }
    }

    /// Schmitt trigger (input hysteresis)
    pub fn set_schmitt(&self, pin: Pin, enabled: bool) {
        if enabled {
            self.pads.gpio(pin).set_bits(pad::SCHMITT);
        } else {
            self.pads.gpio(pin).clear_bits(pad::SCHMITT);
        }
    }

    pub fn is_schmitt(&self, pin: Pin) -> bool {
        self.pads.gpio(pin).has_bits(pad::SCHMITT)
    }

    /// Input buffer
    pub fn set_input_enabled(&self, pin: Pin, enabled: bool) {
        if enabled {
            self.pads.gpio(pin).set_bits(pad::IE);
        } else {
            self.pads.gpio(pin).clear_bits(pad::IE);
        }
    }

    pub fn is_input_enabled(&self, pin: Pin) -> bool {
        self.pads.gpio(pin).has_bits(pad::IE)
    }

    pub fn set_override(&self, pin: Pin, target: OverrideTarget, value: Override) {
        let (mask, shift) = target.field();
        self.io.gpio_ctrl(pin).set_field(value as u32, mask, shift);
    }

    pub fn get_override(&self, pin: Pin, target: OverrideTarget) -> Override {
        let (mask, shift) = target.field();
        Override::from_bits(self.io.gpio_ctrl(pin).field(mask, shift))
    }

    /// Switch a pin to PWM if needed and return the output it drives
    pub fn pwm_pin(&mut self, pin: Pin) -> Result<(Slice, Channel)> {
        if self.mode(pin)? != Mode::Pwm {
            self.set_mode(pin, Mode::Pwm)?;
        }
        Ok(Slice::for_pin(pin))
    }

    /// Prepare an ADC-capable pin for analog use
    ///
    /// The pin goes to the NULL function with pulls and input buffer
    /// disabled, so the pad does not load the analog signal.
    pub fn adc_pin(&mut self, pin: Pin) -> Result<AdcChannel> {
        let channel = AdcChannel::from_gpio(pin)?;
        if self.mode(pin)? != Mode::Off {
            self.set_mode(pin, Mode::Off)?;
        }
        set_function(&self.io, &self.pads, pin, Function::Null);
        self.set_pull(pin, Pull::None);
        self.set_input_enabled(pin, false);
        Ok(channel)
    }
}

/// Select a pin function the way the SDK does: input buffer on, output
/// disable off, overrides cleared.
fn set_function<B: RegisterBus>(io: &IoBank0<B>, pads: &PadsBank0<B>, pin: Pin, function: Function) {
    pads.gpio(pin).replace_bits(pad::IE, pad::IE | pad::OD);
    io.gpio_ctrl(pin).set(function.bits());
}

fn check_mask(mask: u32) -> Result<()> {
    if mask & !ALL_PINS_MASK != 0 {
        return Err(Error::BadParameter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, SimCore};
    use picoarb_core::Core;

    fn pin(n: u8) -> Pin {
        Pin::new(n).unwrap()
    }

    fn gpio(sim: &SimBus) -> Gpio<SimCore<'_>> {
        Gpio::new(sim.core(Core::Core0))
    }

    #[test]
    fn test_init_once() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(4);
        assert!(!gpio.is_initialized(p));
        gpio.init(p);
        assert!(gpio.is_initialized(p));
        let writes = sim.write_count();
        gpio.init(p);
        assert_eq!(sim.write_count(), writes);
        assert_eq!(gpio.function(p), Some(Function::Sio));
    }

    #[test]
    fn test_output_round_trip() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(25);
        gpio.set_mode(p, Mode::Output).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::Output));
        gpio.set(p, true).unwrap();
        assert_eq!(gpio.get(p), Ok(true));
        gpio.set(p, false).unwrap();
        assert_eq!(gpio.get(p), Ok(false));
        gpio.toggle(p).unwrap();
        assert!(gpio.out_level(p));
    }

    #[test]
    fn test_output_readback_mismatch() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(3);
        sim.stick(
            IoBank0::new(sim.core(Core::Core0)).gpio_ctrl(p).addr(),
            ctrl::FUNCSEL_MASK,
            Function::Null.bits(),
        );
        assert_eq!(gpio.set_mode(p, Mode::Output), Err(Error::UnexpectedValue));
    }

    #[test]
    fn test_input_pulls() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(9);
        gpio.set_mode(p, Mode::InputPullup).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::InputPullup));
        assert_eq!(gpio.get(p), Ok(true));

        gpio.set_mode(p, Mode::InputPulldown).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::InputPulldown));
        assert_eq!(gpio.get(p), Ok(false));

        gpio.set_mode(p, Mode::Input).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::Input));
        assert_eq!(gpio.state(p).pull, Pull::None);
    }

    #[test]
    fn test_i2c_pad_setup() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(4);
        gpio.set_mode(p, Mode::I2c).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::I2c));
        assert_eq!(gpio.pull(p), Pull::Up);
        assert!(gpio.is_schmitt(p));
        assert_eq!(gpio.slew_rate(p), SlewRate::Fast);
    }

    #[test]
    fn test_off_and_deinit() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(12);
        gpio.set_mode(p, Mode::InputPullup).unwrap();
        gpio.set_mode(p, Mode::Off).unwrap();
        assert_eq!(gpio.mode(p), Ok(Mode::Off));
        assert_eq!(gpio.pull(p), Pull::None);

        gpio.deinit(p);
        assert_eq!(gpio.state(p), PinState::new());
        assert_eq!(gpio.mode(p), Ok(Mode::Off));
    }

    #[test]
    fn test_unknown_function() {
        let sim = SimBus::new();
        let gpio = gpio(&sim);
        let p = pin(6);
        IoBank0::new(sim.core(Core::Core0))
            .gpio_ctrl(p)
            .set(Function::Pio0.bits());
        assert_eq!(gpio.mode(p), Err(Error::UnexpectedValue));
    }

    #[test]
    fn test_strict_access() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(2);
        assert_eq!(gpio.try_get(p), Err(Error::NotInitialised));
        assert_eq!(gpio.try_set(p, true), Err(Error::NotInitialised));
        gpio.set_mode(p, Mode::Output).unwrap();
        gpio.try_set(p, true).unwrap();
        assert_eq!(gpio.try_get(p), Ok(true));
    }

    #[test]
    fn test_auto_init() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        gpio.set(pin(20), true).unwrap();
        assert_eq!(gpio.mode(pin(20)), Ok(Mode::Output));
        gpio.get(pin(21)).unwrap();
        assert!(gpio.mode(pin(21)).unwrap().is_input());
    }

    #[test]
    fn test_masked_outputs() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        for n in 0..4 {
            gpio.set_mode(pin(n), Mode::Output).unwrap();
        }
        gpio.set_mask(0b0101).unwrap();
        assert_eq!(gpio.read_all() & 0xf, 0b0101);
        gpio.put_masked(0b0011, 0b0010).unwrap();
        assert_eq!(gpio.read_all() & 0xf, 0b0110);
        gpio.clear_mask(0b0100).unwrap();
        assert_eq!(gpio.read_all() & 0xf, 0b0010);
        assert_eq!(gpio.set_mask(1 << 30), Err(Error::BadParameter));
    }

    #[test]
    fn test_pad_controls() {
        let sim = SimBus::new();
        let gpio = gpio(&sim);
        let p = pin(15);
        assert_eq!(gpio.drive_strength(p), DriveStrength::Ma4);
        gpio.set_drive_strength(p, DriveStrength::Ma12);
        assert_eq!(gpio.drive_strength(p), DriveStrength::Ma12);
        gpio.set_input_enabled(p, false);
        assert!(!gpio.is_input_enabled(p));
        gpio.set_schmitt(p, false);
        assert!(!gpio.is_schmitt(p));
    }

    #[test]
    fn test_overrides() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(5);
        gpio.set_mode(p, Mode::Output).unwrap();
        gpio.set(p, false).unwrap();
        gpio.set_override(p, OverrideTarget::Output, Override::High);
        assert_eq!(gpio.get_override(p, OverrideTarget::Output), Override::High);
        assert_eq!(gpio.get(p), Ok(true));
        gpio.set_override(p, OverrideTarget::Output, Override::Normal);
        assert_eq!(gpio.get(p), Ok(false));
    }

    #[test]
    fn test_close() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        gpio.set_mode(pin(1), Mode::Output).unwrap();
        gpio.set_mode(pin(2), Mode::Spi).unwrap();
        gpio.close();
        for n in [1, 2] {
            assert!(!gpio.is_initialized(pin(n)));
            assert_eq!(gpio.mode(pin(n)), Ok(Mode::Off));
        }
    }

    #[test]
    fn test_adc_pin() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let p = pin(26);
        gpio.set_mode(p, Mode::InputPullup).unwrap();
        assert_eq!(gpio.adc_pin(p), Ok(AdcChannel::Adc0));
        assert_eq!(gpio.mode(p), Ok(Mode::Off));
        assert_eq!(gpio.pull(p), Pull::None);
        assert!(!gpio.is_input_enabled(p));

        assert_eq!(gpio.adc_pin(pin(25)), Err(Error::BadParameter));
    }

    #[test]
    fn test_pwm_pin() {
        let sim = SimBus::new();
        let mut gpio = gpio(&sim);
        let (slice, channel) = gpio.pwm_pin(pin(25)).unwrap();
        assert_eq!(slice.number(), 4);
        assert_eq!(channel, Channel::B);
        assert_eq!(gpio.mode(pin(25)), Ok(Mode::Pwm));
    }
}
