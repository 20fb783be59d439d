//! Pin identities, modes and pad settings
//!
//! The RP2040 user bank has 30 GPIOs. Every API past the first
//! construction takes a [`Pin`], so out-of-range indices cannot reach a
//! register.

use core::ops::{BitOr, BitOrAssign};

use crate::error::{Error, Result};

/// Number of GPIOs in the user IO bank
pub const NUM_BANK0_GPIOS: usize = 30;

/// Validated GPIO identity (0..29)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    /// Validate a raw pin number
    pub const fn new(number: u8) -> Result<Self> {
        if (number as usize) < NUM_BANK0_GPIOS {
            Ok(Self(number))
        } else {
            Err(Error::BadParameter)
        }
    }

    /// Raw pin number
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for SIO registers
    pub const fn mask(self) -> u32 {
        1 << self.0
    }

    /// Interrupt register bank (8 pins per register)
    pub const fn bank(self) -> usize {
        (self.0 / 8) as usize
    }

    /// Bit offset of this pin's 4-bit event nibble within its bank
    pub const fn irq_shift(self) -> u32 {
        ((self.0 % 8) * 4) as u32
    }

    /// Iterate over every pin in the bank
    pub fn all() -> impl Iterator<Item = Pin> {
        (0..NUM_BANK0_GPIOS as u8).map(Pin)
    }
}

impl TryFrom<u8> for Pin {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Pin::new(value)
    }
}

impl From<Pin> for u8 {
    fn from(pin: Pin) -> u8 {
        pin.0
    }
}

/// Pin operating mode as seen by users of the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// SIO output
    Output = 0,
    /// SIO input, no pull
    Input = 1,
    /// SIO input with pull-down
    InputPulldown = 2,
    /// SIO input with pull-up
    InputPullup = 3,
    /// UART function
    Uart = 4,
    /// PWM function
    Pwm = 5,
    /// I2C function (pull-up, Schmitt trigger, fast slew)
    I2c = 6,
    /// SPI function
    Spi = 7,
    /// Function NULL, pulls disabled
    Off = 8,
}

impl Mode {
    /// Every mode, in discriminant order
    pub const ALL: [Mode; 9] = [
        Mode::Output,
        Mode::Input,
        Mode::InputPulldown,
        Mode::InputPullup,
        Mode::Uart,
        Mode::Pwm,
        Mode::I2c,
        Mode::Spi,
        Mode::Off,
    ];

    /// Decode a raw mode value, e.g. from a configuration table
    pub fn from_raw(raw: u8) -> Result<Self> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::BadParameter)
    }

    /// Pad pull configuration this mode programs
    pub const fn pull(self) -> Pull {
        match self {
            Mode::InputPullup | Mode::I2c => Pull::Up,
            Mode::InputPulldown => Pull::Down,
            _ => Pull::None,
        }
    }

    /// Function-select value this mode programs
    pub const fn function(self) -> Function {
        match self {
            Mode::Output | Mode::Input | Mode::InputPulldown | Mode::InputPullup => Function::Sio,
            Mode::Uart => Function::Uart,
            Mode::Pwm => Function::Pwm,
            Mode::I2c => Function::I2c,
            Mode::Spi => Function::Spi,
            Mode::Off => Function::Null,
        }
    }

    /// True for the SIO input modes
    pub const fn is_input(self) -> bool {
        matches!(self, Mode::Input | Mode::InputPulldown | Mode::InputPullup)
    }
}

/// GPIO function-select values (IO_BANK0 GPIOn_CTRL.FUNCSEL)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Function {
    Xip = 0,
    Spi = 1,
    Uart = 2,
    I2c = 3,
    Pwm = 4,
    Sio = 5,
    Pio0 = 6,
    Pio1 = 7,
    Gpck = 8,
    Usb = 9,
    Null = 0x1f,
}

impl Function {
    /// Decode a FUNCSEL field
    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            0 => Function::Xip,
            1 => Function::Spi,
            2 => Function::Uart,
            3 => Function::I2c,
            4 => Function::Pwm,
            5 => Function::Sio,
            6 => Function::Pio0,
            7 => Function::Pio1,
            8 => Function::Gpck,
            9 => Function::Usb,
            0x1f => Function::Null,
            _ => return None,
        })
    }

    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Pad pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
}

/// Arbiter bookkeeping for one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinState {
    /// Last mode programmed through the arbiter
    pub mode: Mode,
    /// One-time low-level setup done
    pub initialized: bool,
    /// Pull programmed with the mode
    pub pull: Pull,
}

impl PinState {
    /// State of a pin nobody has touched yet
    pub const fn new() -> Self {
        Self {
            mode: Mode::Off,
            initialized: false,
            pull: Pull::None,
        }
    }
}

impl Default for PinState {
    fn default() -> Self {
        Self::new()
    }
}

/// Processor core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Core {
    Core0,
    Core1,
}

impl Core {
    pub const fn index(self) -> usize {
        match self {
            Core::Core0 => 0,
            Core::Core1 => 1,
        }
    }

    /// Decode the SIO CPUID register
    pub const fn from_cpuid(cpuid: u32) -> Self {
        if cpuid == 0 {
            Core::Core0
        } else {
            Core::Core1
        }
    }
}

/// GPIO interrupt event mask (one 4-bit nibble per pin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events(u8);

impl Events {
    pub const NONE: Events = Events(0);
    pub const LEVEL_LOW: Events = Events(1 << 0);
    pub const LEVEL_HIGH: Events = Events(1 << 1);
    pub const EDGE_FALL: Events = Events(1 << 2);
    pub const EDGE_RISE: Events = Events(1 << 3);
    /// Both edges, the default watch mask
    pub const EDGES: Events = Events(0b1100);
    pub const ALL: Events = Events(0b1111);

    /// Build from a register nibble; upper bits are discarded
    pub const fn from_bits(bits: u32) -> Self {
        Events((bits & 0xf) as u8)
    }

    pub const fn bits(self) -> u32 {
        self.0 as u32
    }

    pub const fn contains(self, other: Events) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Events {
    type Output = Events;

    fn bitor(self, rhs: Events) -> Events {
        Events(self.0 | rhs.0)
    }
}

impl BitOrAssign for Events {
    fn bitor_assign(&mut self, rhs: Events) {
        self.0 |= rhs.0;
    }
}

/// Pad output drive strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DriveStrength {
    Ma2 = 0,
    Ma4 = 1,
    Ma8 = 2,
    Ma12 = 3,
}

impl DriveStrength {
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => DriveStrength::Ma2,
            1 => DriveStrength::Ma4,
            2 => DriveStrength::Ma8,
            _ => DriveStrength::Ma12,
        }
    }
}

/// Pad output slew rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlewRate {
    Slow,
    Fast,
}

/// Peripheral signal override (OUTOVER, OEOVER, INOVER, IRQOVER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Override {
    /// Pass the peripheral signal through
    Normal = 0,
    /// Invert the peripheral signal
    Invert = 1,
    /// Force low / disable
    Low = 2,
    /// Force high / enable
    High = 3,
}

impl Override {
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Override::Normal,
            1 => Override::Invert,
            2 => Override::Low,
            _ => Override::High,
        }
    }
}
