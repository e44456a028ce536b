//! VL53L0X register map and raw register I/O.

#[cfg(not(feature = "async"))]
use embedded_hal::i2c::{I2c, Operation};
#[cfg(feature = "async")]
use embedded_hal_async::i2c::{I2c, Operation};

use crate::Error;

/// Register addresses for the VL53L0X sensor.
///
/// Only the registers the driver touches by name are listed. Page-1 and page-7
/// registers that share an index with a page-0 register are written by index.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Ranging start/stop and mode (0x00)
    SysrangeStart = 0x00,
    /// Sequence step enables (0x01)
    SystemSequenceConfig = 0x01,
    /// GPIO interrupt source configuration (0x0A)
    SystemInterruptConfigGpio = 0x0A,
    /// Interrupt clear (0x0B)
    SystemInterruptClear = 0x0B,
    /// Interrupt status (0x13)
    ResultInterruptStatus = 0x13,
    /// Start of the 12-byte result block (0x14)
    ResultRangeStatus = 0x14,
    /// Crosstalk compensation peak rate, Q3.13 Mcps (0x20)
    CrosstalkCompensationPeakRate = 0x20,
    /// Part-to-part range offset, 12-bit 0.25 mm units (0x28)
    AlgoPartToPartRangeOffset = 0x28,
    /// Phase calibration timeout (0x30, page 0)
    AlgoPhasecalConfigTimeout = 0x30,
    /// Global VCSEL width (0x32)
    GlobalConfigVcselWidth = 0x32,
    /// Final range minimum count rate return limit, Q9.7 Mcps (0x44)
    FinalRangeMinCountRateRtnLimit = 0x44,
    /// MSRC timeout in macro periods (0x46)
    MsrcConfigTimeoutMacrop = 0x46,
    /// Final range valid phase low (0x47)
    FinalRangeValidPhaseLow = 0x47,
    /// Final range valid phase high (0x48)
    FinalRangeValidPhaseHigh = 0x48,
    /// Requested reference SPAD count (0x4E, page 1)
    DynamicSpadNumRequestedRefSpad = 0x4E,
    /// Reference SPAD start offset (0x4F, page 1)
    DynamicSpadRefEnStartOffset = 0x4F,
    /// Pre-range VCSEL period (0x50)
    PreRangeVcselPeriod = 0x50,
    /// Pre-range timeout, encoded (0x51)
    PreRangeTimeoutMacrop = 0x51,
    /// Pre-range valid phase low (0x56)
    PreRangeValidPhaseLow = 0x56,
    /// Pre-range valid phase high (0x57)
    PreRangeValidPhaseHigh = 0x57,
    /// MSRC and pre-range limit check control (0x60)
    MsrcConfigControl = 0x60,
    /// Final range VCSEL period (0x70)
    FinalRangeVcselPeriod = 0x70,
    /// Final range timeout, encoded (0x71)
    FinalRangeTimeoutMacrop = 0x71,
    /// GPIO interrupt polarity (0x84)
    GpioHvMuxActiveHigh = 0x84,
    /// Pad supply selection (0x89)
    VhvConfigPadSclSdaExtsupHv = 0x89,
    /// 7-bit I2C device address (0x8A)
    I2cSlaveDeviceAddress = 0x8A,
    /// First of six reference SPAD enable bytes (0xB0)
    GlobalConfigSpadEnablesRef0 = 0xB0,
    /// Reference SPAD start select (0xB6)
    GlobalConfigRefEnStartSelect = 0xB6,
    /// Software reset, active low (0xBF)
    SoftResetGo2SoftResetN = 0xBF,
    /// Model ID, reads 0xEE (0xC0)
    IdentificationModelId = 0xC0,
    /// Register page select (0xFF)
    PageSelect = 0xFF,
}

impl From<Register> for u8 {
    fn from(r: Register) -> Self {
        r as u8
    }
}

/// Expected content of [`Register::IdentificationModelId`].
pub const MODEL_ID: u8 = 0xEE;

/// ST's default tuning settings as `(register, value)` pairs, page switches included.
#[rustfmt::skip]
pub(crate) const DEFAULT_TUNING: [(u8, u8); 80] = [
    (0xFF, 0x01), (0x00, 0x00),
    (0xFF, 0x00), (0x09, 0x00), (0x10, 0x00), (0x11, 0x00),
    (0x24, 0x01), (0x25, 0xFF), (0x75, 0x00),
    (0xFF, 0x01), (0x4E, 0x2C), (0x48, 0x00), (0x30, 0x20),
    (0xFF, 0x00), (0x30, 0x09), (0x54, 0x00), (0x31, 0x04), (0x32, 0x03), (0x40, 0x83),
    (0x46, 0x25), (0x60, 0x00), (0x27, 0x00), (0x50, 0x06), (0x51, 0x00), (0x52, 0x96),
    (0x56, 0x08), (0x57, 0x30), (0x61, 0x00), (0x62, 0x00), (0x64, 0x00), (0x65, 0x00),
    (0x66, 0xA0),
    (0xFF, 0x01), (0x22, 0x32), (0x47, 0x14), (0x49, 0xFF), (0x4A, 0x00),
    (0xFF, 0x00), (0x7A, 0x0A), (0x7B, 0x00), (0x78, 0x21),
    (0xFF, 0x01), (0x23, 0x34), (0x42, 0x00), (0x44, 0xFF), (0x45, 0x26), (0x46, 0x05),
    (0x40, 0x40), (0x0E, 0x06), (0x20, 0x1A), (0x43, 0x40),
    (0xFF, 0x00), (0x34, 0x03), (0x35, 0x44),
    (0xFF, 0x01), (0x31, 0x04), (0x4B, 0x09), (0x4C, 0x05), (0x4D, 0x04),
    (0xFF, 0x00), (0x44, 0x00), (0x45, 0x20), (0x47, 0x08), (0x48, 0x28), (0x67, 0x00),
    (0x70, 0x04), (0x71, 0x01), (0x72, 0xFE), (0x76, 0x00), (0x77, 0x00),
    (0xFF, 0x01), (0x0D, 0x01),
    (0xFF, 0x00), (0x80, 0x01), (0x01, 0xF8),
    (0xFF, 0x01), (0x8E, 0x01), (0x00, 0x01), (0xFF, 0x00), (0x80, 0x00),
];

/// Register-level access to one VL53L0X on the bus.
///
/// The VL53L0X uses 8-bit register indices and big-endian multi-byte values;
/// multi-byte transfers rely on the device's index auto-increment.
pub struct RegisterBus<I2C> {
    /// I2C interface for communication with the sensor
    i2c: I2C,
    /// Address the sensor currently answers on
    address: u8,
}

impl<I2C> RegisterBus<I2C> {
    /// Wraps `i2c`, talking to the device at `address`.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Address the bus currently targets.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Retargets the bus after the device's address changed.
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Hands back the I2C interface.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E> RegisterBus<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Writes a single byte to a sensor register.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn write_byte<R>(&mut self, register: R, value: u8) -> Result<(), Error<E>>
    where
        R: Into<u8>,
    {
        self.i2c.write(self.address, &[register.into(), value]).await?;
        Ok(())
    }

    /// Reads a single byte from a sensor register.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn read_byte<R>(&mut self, register: R) -> Result<u8, Error<E>>
    where
        R: Into<u8>,
    {
        let mut read_buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register.into()], &mut read_buffer)
            .await?;
        Ok(read_buffer[0])
    }

    /// Writes a 16-bit big-endian word starting at `register`.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn write_word<R>(&mut self, register: R, value: u16) -> Result<(), Error<E>>
    where
        R: Into<u8>,
    {
        let mut buffer = [0u8; 3];
        buffer[0] = register.into();
        buffer[1..3].copy_from_slice(&value.to_be_bytes());
        self.i2c.write(self.address, &buffer).await?;
        Ok(())
    }

    /// Reads a 16-bit big-endian word starting at `register`.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn read_word<R>(&mut self, register: R) -> Result<u16, Error<E>>
    where
        R: Into<u8>,
    {
        let mut read_buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register.into()], &mut read_buffer)
            .await?;
        Ok(u16::from_be_bytes(read_buffer))
    }

    /// Writes `data` to consecutive registers starting at `register`.
    ///
    /// Index and payload go out as one transaction without a repeated start.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn write_multi<R>(&mut self, register: R, data: &[u8]) -> Result<(), Error<E>>
    where
        R: Into<u8>,
    {
        let index = [register.into()];
        self.i2c
            .transaction(
                self.address,
                &mut [Operation::Write(&index), Operation::Write(data)],
            )
            .await?;
        Ok(())
    }

    /// Fills `buffer` from consecutive registers starting at `register`.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn read_multi<R>(&mut self, register: R, buffer: &mut [u8]) -> Result<(), Error<E>>
    where
        R: Into<u8>,
    {
        self.i2c
            .write_read(self.address, &[register.into()], buffer)
            .await?;
        Ok(())
    }

    /// Writes a `(register, value)` table in order.
    ///
    /// # Errors
    ///
    /// * `Err(Error::Bus(E))` - If there was an I2C communication error
    pub async fn write_table(&mut self, table: &[(u8, u8)]) -> Result<(), Error<E>> {
        for &(register, value) in table {
            self.write_byte(register, value).await?;
        }
        Ok(())
    }
}
