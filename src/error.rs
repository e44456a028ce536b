use embedded_hal::digital::ErrorKind as PinErrorKind;

/// Error type for VL53L0X driver operations.
///
/// `E` is the error type of the underlying I2C implementation.
///
/// # Examples
///
/// ```rust,no_run
/// use vl53l0x_ranging::{Error, Vl53l0x};
///
/// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
/// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
/// let boot = std::time::Instant::now();
/// let clock = move || boot.elapsed().as_millis() as u64;
/// let mut sensor = Vl53l0x::new(i2c, delay, clock);
///
/// match sensor.activate() {
///     Ok(()) => println!("Sensor configured"),
///     Err(Error::Config(e)) => println!("Setup rejected: {:?}", e),
///     Err(Error::Timeout(kind)) => println!("Timed out: {:?}", kind),
///     Err(e) => println!("Activation failed: {}", e),
/// }
/// ```
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: core::fmt::Debug> {
    /// Invalid setup sequence. Fatal, never retried.
    Config(ConfigError),
    /// I2C communication error from the underlying hardware
    Bus(E),
    /// A value the device cannot represent, or a malformed device response
    Protocol(ProtocolError),
    /// A bounded wait expired
    Timeout(TimeoutKind),
    /// Driving the enable (XSHUT) pin failed
    EnablePin(PinErrorKind),
    /// The retry budget is exhausted; only [`reset`](crate::Vl53l0x::reset) leaves this state
    Faulted,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl<E: core::fmt::Debug> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Bus(error)
    }
}

/// Setup sequence violations and out-of-bounds configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A non-default bus address needs an enable pin to hold the other devices in reset
    AddressRequiresEnablePin,
    /// Several VL53 devices on one bus must each have an enable pin
    SharedBusRequiresEnablePin,
    /// Not a 7-bit I2C address
    InvalidAddress(u8),
    /// Signal rate limit outside (0.0, 512.0) Mcps
    SignalRateLimitOutOfRange,
    /// Timing budget below 20000 µs
    TimingBudgetTooShort,
    /// Offset calibration outside -512000..=511000 µm
    OffsetOutOfRange,
    /// Crosstalk compensation outside 0.0..=10.0 Mcps
    CrosstalkOutOfRange,
    /// Reading timeout outside 1000..=60000 ms
    ReadingTimeoutOutOfRange,
    /// Bus communication timeout above 60 s
    BusTimeoutTooLong,
    /// Poll interval of zero
    PollIntervalZero,
    /// Setters are only accepted before activation
    AlreadyActivated,
    /// The device has not been activated yet
    NotActivated,
}

/// Device-representability and response-sanity failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Signal rate limit does not fit the Q9.7 limit register
    SignalRateLimitUnrepresentable,
    /// Offset does not fit the 12-bit part-to-part offset register
    OffsetUnrepresentable,
    /// Crosstalk rate does not fit the Q3.13 compensation register
    CrosstalkUnrepresentable,
    /// The sequence step overheads leave no room for the final range step
    TimingBudgetTooShort,
    /// Timing budget arithmetic overflows the timeout registers
    TimingBudgetOverflow,
    /// VCSEL period not supported for the given sequence step
    InvalidVcselPeriod(u8),
    /// Model ID register did not read back as a VL53L0X
    UnexpectedModelId(u8),
    /// Interrupt status reported a range error
    RangeError(u8),
    /// Range status register holds a code outside the device's table
    UnknownRangeStatus(u8),
}

/// Which bounded wait expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutKind {
    /// Device did not answer after reset
    Boot,
    /// SPAD info or reference calibration did not complete
    Calibration,
    /// A re-sync or other short bus exchange took longer than the bus timeout
    BusComm,
    /// A ranging request did not finish within the reading timeout
    Reading,
}
