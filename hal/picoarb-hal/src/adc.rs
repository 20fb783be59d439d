//! ADC capability

/// Analog input channel
pub trait AnalogInput {
    /// Error type for ADC operations
    type Error;

    /// Take one raw 12-bit sample
    fn read(&mut self) -> Result<u16, Self::Error>;

    /// Take one sample and scale it to volts
    fn voltage(&mut self, vref: f32) -> Result<f32, Self::Error>;

    /// Take one sample of the on-chip temperature sensor in °C
    fn temperature(&mut self) -> Result<f32, Self::Error>;
}
