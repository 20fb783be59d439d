//! I2C transfer contract
//!
//! The arbiter only claims the pins; the transport implements this trait
//! and sensor drivers consume it.

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Read consecutive registers starting at `register`
    fn read_register(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.write_read(address, &[register], buf)
    }

    /// Read one 8-bit register
    fn read_register_u8(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8];
        self.read_register(address, register, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one 8-bit register
    fn write_register_u8(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write(address, &[register, value])
    }
}
