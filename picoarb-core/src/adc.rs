//! ADC channel identities and conversions
//!
//! RP2040 has a single 12-bit ADC with 5 inputs:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor

use crate::error::{Error, Result};
use crate::pin::Pin;

/// Full-scale conversion count (12 bits)
pub const ADC_RANGE: u32 = 4096;

/// Largest raw sample
pub const ADC_MAX: u16 = 0x0FFF;

/// Reference voltage of the on-chip supply
pub const DEFAULT_VREF: f32 = 3.3;

/// Sensor voltage at 27 °C
const TEMP_SENSOR_V27: f32 = 0.706;

/// Sensor slope in volts per °C (negative coefficient)
const TEMP_SENSOR_SLOPE: f32 = 0.001721;

/// ADC channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
    /// Internal temperature sensor
    Temperature,
}

impl AdcChannel {
    pub const ALL: [AdcChannel; 5] = [
        AdcChannel::Adc0,
        AdcChannel::Adc1,
        AdcChannel::Adc2,
        AdcChannel::Adc3,
        AdcChannel::Temperature,
    ];

    /// Get the GPIO pin for this ADC channel
    pub fn gpio(&self) -> Option<Pin> {
        let number = match self {
            AdcChannel::Adc0 => 26,
            AdcChannel::Adc1 => 27,
            AdcChannel::Adc2 => 28,
            AdcChannel::Adc3 => 29,
            AdcChannel::Temperature => return None,
        };
        Pin::new(number).ok()
    }

    /// Get ADC channel from GPIO pin
    pub fn from_gpio(pin: Pin) -> Result<Self> {
        match pin.number() {
            26 => Ok(AdcChannel::Adc0),
            27 => Ok(AdcChannel::Adc1),
            28 => Ok(AdcChannel::Adc2),
            29 => Ok(AdcChannel::Adc3),
            _ => Err(Error::BadParameter),
        }
    }

    /// Input selector value (CS.AINSEL)
    pub const fn ainsel(&self) -> u8 {
        match self {
            AdcChannel::Adc0 => 0,
            AdcChannel::Adc1 => 1,
            AdcChannel::Adc2 => 2,
            AdcChannel::Adc3 => 3,
            AdcChannel::Temperature => 4,
        }
    }

    pub fn from_ainsel(ainsel: u8) -> Result<Self> {
        Self::ALL
            .get(ainsel as usize)
            .copied()
            .ok_or(Error::BadParameter)
    }

    /// Bit for this channel in the round-robin mask
    pub const fn mask(&self) -> u8 {
        1 << self.ainsel()
    }

    pub const fn index(&self) -> usize {
        self.ainsel() as usize
    }
}

/// Convert a raw sample to volts
pub fn raw_to_voltage(raw: u16, vref: f32) -> f32 {
    (raw & ADC_MAX) as f32 * vref / ADC_RANGE as f32
}

/// Convert a temperature sensor voltage to °C
pub fn voltage_to_celsius(volts: f32) -> f32 {
    27.0 - (volts - TEMP_SENSOR_V27) / TEMP_SENSOR_SLOPE
}

/// Convert a raw temperature sensor sample to °C (3.3 V reference)
pub fn raw_to_celsius(raw: u16) -> f32 {
    voltage_to_celsius(raw_to_voltage(raw, DEFAULT_VREF))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_pins() {
        for channel in AdcChannel::ALL {
            match channel.gpio() {
                Some(pin) => assert_eq!(AdcChannel::from_gpio(pin), Ok(channel)),
                None => assert_eq!(channel, AdcChannel::Temperature),
            }
        }
        assert_eq!(
            AdcChannel::from_gpio(Pin::new(25).unwrap()),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn test_ainsel() {
        assert_eq!(AdcChannel::Temperature.ainsel(), 4);
        assert_eq!(AdcChannel::from_ainsel(2), Ok(AdcChannel::Adc2));
        assert_eq!(AdcChannel::from_ainsel(5), Err(Error::BadParameter));
        assert_eq!(AdcChannel::Adc3.mask(), 0b01000);
    }

    #[test]
    fn test_full_scale_voltage() {
        let v = raw_to_voltage(4095, 3.3);
        assert!((v - 3.2992).abs() < 1e-3);
        assert_eq!(raw_to_voltage(0, 3.3), 0.0);
    }

    #[test]
    fn test_temperature_at_reference_voltage() {
        assert!((voltage_to_celsius(0.706) - 27.0).abs() < 1e-3);
        // 876 counts is ~0.7058 V
        assert!((raw_to_celsius(876) - 27.0).abs() < 1.0);
    }
}
