//! MCP3008 SPI ADC adapter.
//!
//! The three thermistor dividers hang off an MCP3008 (10-bit, 8-channel)
//! read over SPI. Single-ended conversion is a three-byte exchange:
//! start bit, then `1000 | channel` in the high nibble, then a throwaway
//! byte while the converter clocks the result out — ten bits split across
//! the last two response bytes.
//!
//! Generic over `embedded-hal`'s [`SpiDevice`], so the rig uses the
//! ESP-IDF SPI driver and tests use a canned fake.

use embedded_hal::spi::SpiDevice;

use crate::app::ports::AdcPort;
use crate::error::SensorError;

/// MCP3008 over any `SpiDevice`.
pub struct Mcp3008<SPI: SpiDevice> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp3008<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }
}

impl<SPI: SpiDevice> AdcPort for Mcp3008<SPI> {
    fn read_raw(&mut self, channel: u8) -> Result<u16, SensorError> {
        if channel > 7 {
            return Err(SensorError::OutOfRange);
        }

        let write = [0x01, 0x80 | (channel << 4), 0x00];
        let mut read = [0u8; 3];
        self.spi
            .transfer(&mut read, &write)
            .map_err(|_| SensorError::AdcReadFailed)?;

        Ok(((read[1] as u16 & 0x03) << 8) | read[2] as u16)
    }
}
