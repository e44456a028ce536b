//! Sensor configuration snapshot and its validation.

use crate::error::ConfigError;

/// Factory default 7-bit I2C address of the VL53L0X.
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// Lower bound of an explicit timing budget, in microseconds.
pub const MIN_TIMING_BUDGET_US: u32 = 20_000;

/// Named ranging profile applied after calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SenseMode {
    /// Balanced profile, 33 ms budget
    #[default]
    Default,
    /// Longer VCSEL periods and a lower signal limit for distant or dark targets
    LongRange,
    /// 20 ms budget, looser sigma limit
    HighSpeed,
    /// 200 ms budget for the lowest noise
    HighAccuracy,
}

impl SenseMode {
    /// Parses the configuration-schema name of a mode (`default`, `long_range`,
    /// `high_speed`, `high_accuracy`), ignoring ASCII case.
    ///
    /// ```rust
    /// use vl53l0x_ranging::SenseMode;
    ///
    /// assert_eq!(SenseMode::from_name("High_Speed"), Some(SenseMode::HighSpeed));
    /// assert_eq!(SenseMode::from_name("turbo"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            ("default", SenseMode::Default),
            ("long_range", SenseMode::LongRange),
            ("high_speed", SenseMode::HighSpeed),
            ("high_accuracy", SenseMode::HighAccuracy),
        ]
        .into_iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, mode)| mode)
    }

    /// The mode actually programmed once the legacy `long_range` flag is taken
    /// into account. The flag upgrades `Default` to `LongRange` and leaves the
    /// explicit modes alone.
    #[must_use]
    pub fn resolve(self, long_range: bool) -> Self {
        match self {
            SenseMode::Default if long_range => SenseMode::LongRange,
            mode => mode,
        }
    }
}

/// Resolved sensor settings.
///
/// Built once by the caller, optionally checked with [`validate`], and read-only
/// after activation except through the driver's explicit recalibration calls.
///
/// ```rust
/// use vl53l0x_ranging::{SenseMode, SensorConfig};
///
/// let config = SensorConfig::default()
///     .with_sense_mode(SenseMode::HighAccuracy)
///     .with_reading_timeout_ms(2_000);
/// assert!(config.validate(false).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// 7-bit bus address the device should answer on after activation
    pub address: u8,
    /// More than one VL53 device shares this bus
    pub shared_bus: bool,
    /// Return signal rate limit in Mcps; `None` uses the sense-mode profile
    pub signal_rate_limit: Option<f32>,
    /// Legacy long-range switch, see [`SenseMode::resolve`]
    pub long_range: bool,
    /// Ranging profile
    pub sense_mode: SenseMode,
    /// Reject readings whose estimated sigma exceeds the profile's limit
    pub sigma_check: bool,
    /// Reject readings whose signal rate is below the signal rate limit
    pub signal_check: bool,
    /// Timing budget override in microseconds
    pub timing_budget_us: Option<u32>,
    /// Part-to-part offset override in micrometres
    pub offset_calibration_um: Option<i32>,
    /// Crosstalk compensation override in Mcps
    pub crosstalk_compensation_mcps: Option<f32>,
    /// Periodically re-run the temperature-sensitive reference calibration
    pub temperature_recalibration: bool,
    /// Poll cycles between temperature recalibrations
    pub recalibration_interval: u32,
    /// Upper bound on one ranging request, in milliseconds
    pub reading_timeout_ms: u32,
    /// Upper bound on short bus exchanges (boot, calibration, re-sync), in microseconds
    pub bus_timeout_us: u32,
    /// Scheduler interval between polls, in milliseconds
    pub poll_interval_ms: u32,
    /// Consecutive failed polls tolerated in `Recovering` before `Faulted`
    pub max_retries: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            shared_bus: false,
            signal_rate_limit: None,
            long_range: false,
            sense_mode: SenseMode::Default,
            sigma_check: true,
            signal_check: true,
            timing_budget_us: None,
            offset_calibration_um: None,
            crosstalk_compensation_mcps: None,
            temperature_recalibration: false,
            recalibration_interval: 100,
            reading_timeout_ms: 5_000,
            bus_timeout_us: 10_000,
            poll_interval_ms: 60_000,
            max_retries: 3,
        }
    }
}

impl SensorConfig {
    /// Sets the bus address.
    #[must_use]
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Marks the bus as shared with other VL53 devices.
    #[must_use]
    pub fn with_shared_bus(mut self, shared: bool) -> Self {
        self.shared_bus = shared;
        self
    }

    /// Overrides the profile's signal rate limit (Mcps).
    #[must_use]
    pub fn with_signal_rate_limit(mut self, limit_mcps: f32) -> Self {
        self.signal_rate_limit = Some(limit_mcps);
        self
    }

    /// Sets the legacy long-range switch.
    #[must_use]
    pub fn with_long_range(mut self, long_range: bool) -> Self {
        self.long_range = long_range;
        self
    }

    /// Selects the ranging profile.
    #[must_use]
    pub fn with_sense_mode(mut self, mode: SenseMode) -> Self {
        self.sense_mode = mode;
        self
    }

    /// Enables or disables the sigma validity check.
    #[must_use]
    pub fn with_sigma_check(mut self, enable: bool) -> Self {
        self.sigma_check = enable;
        self
    }

    /// Enables or disables the signal validity check.
    #[must_use]
    pub fn with_signal_check(mut self, enable: bool) -> Self {
        self.signal_check = enable;
        self
    }

    /// Overrides the profile's timing budget (µs).
    #[must_use]
    pub fn with_timing_budget_us(mut self, budget_us: u32) -> Self {
        self.timing_budget_us = Some(budget_us);
        self
    }

    /// Supplies a part-to-part offset (µm), skipping measurement-based calibration.
    #[must_use]
    pub fn with_offset_calibration_um(mut self, offset_um: i32) -> Self {
        self.offset_calibration_um = Some(offset_um);
        self
    }

    /// Supplies a crosstalk compensation rate (Mcps), skipping measurement-based calibration.
    #[must_use]
    pub fn with_crosstalk_compensation_mcps(mut self, rate_mcps: f32) -> Self {
        self.crosstalk_compensation_mcps = Some(rate_mcps);
        self
    }

    /// Enables periodic temperature recalibration.
    #[must_use]
    pub fn with_temperature_recalibration(mut self, enable: bool) -> Self {
        self.temperature_recalibration = enable;
        self
    }

    /// Sets the number of poll cycles between temperature recalibrations.
    #[must_use]
    pub fn with_recalibration_interval(mut self, polls: u32) -> Self {
        self.recalibration_interval = polls;
        self
    }

    /// Sets the per-reading timeout (ms).
    #[must_use]
    pub fn with_reading_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.reading_timeout_ms = timeout_ms;
        self
    }

    /// Sets the bus communication timeout (µs).
    #[must_use]
    pub fn with_bus_timeout_us(mut self, timeout_us: u32) -> Self {
        self.bus_timeout_us = timeout_us;
        self
    }

    /// Sets the scheduler interval (ms).
    #[must_use]
    pub fn with_poll_interval_ms(mut self, interval_ms: u32) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Sets the recovery retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Whether offset or crosstalk values were supplied, which replaces the
    /// measurement-based reference calibration during activation.
    #[must_use]
    pub fn has_calibration_overrides(&self) -> bool {
        self.offset_calibration_um.is_some() || self.crosstalk_compensation_mcps.is_some()
    }

    /// Bus timeout rounded up to whole milliseconds.
    #[must_use]
    pub fn bus_timeout_ms(&self) -> u64 {
        u64::from(self.bus_timeout_us).div_ceil(1000)
    }

    /// Checks only the enable-pin rules. This is what activation enforces
    /// before touching the bus.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AddressRequiresEnablePin` - re-addressing without an enable pin
    /// * `ConfigError::SharedBusRequiresEnablePin` - shared bus without an enable pin
    pub fn check_enable_pin(&self, has_enable_pin: bool) -> Result<(), ConfigError> {
        if has_enable_pin {
            return Ok(());
        }
        if self.address != DEFAULT_ADDRESS {
            return Err(ConfigError::AddressRequiresEnablePin);
        }
        if self.shared_bus {
            return Err(ConfigError::SharedBusRequiresEnablePin);
        }
        Ok(())
    }

    /// Full schema validation: value bounds plus the enable-pin rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self, has_enable_pin: bool) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        self.check_enable_pin(has_enable_pin)?;
        if let Some(limit) = self.signal_rate_limit {
            if !(limit > 0.0 && limit < 512.0) {
                return Err(ConfigError::SignalRateLimitOutOfRange);
            }
        }
        if matches!(self.timing_budget_us, Some(b) if b < MIN_TIMING_BUDGET_US) {
            return Err(ConfigError::TimingBudgetTooShort);
        }
        if let Some(offset) = self.offset_calibration_um {
            if !(-512_000..=511_000).contains(&offset) {
                return Err(ConfigError::OffsetOutOfRange);
            }
        }
        if let Some(rate) = self.crosstalk_compensation_mcps {
            if !(0.0..=10.0).contains(&rate) {
                return Err(ConfigError::CrosstalkOutOfRange);
            }
        }
        if !(1_000..=60_000).contains(&self.reading_timeout_ms) {
            return Err(ConfigError::ReadingTimeoutOutOfRange);
        }
        if self.bus_timeout_us > 60_000_000 {
            return Err(ConfigError::BusTimeoutTooLong);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::PollIntervalZero);
        }
        Ok(())
    }
}

/// Validates `config` and hands it back on success, for callers that build a
/// configuration from external input once before constructing the driver.
///
/// # Errors
///
/// See [`SensorConfig::validate`].
pub fn validate(config: SensorConfig, has_enable_pin: bool) -> Result<SensorConfig, ConfigError> {
    config.validate(has_enable_pin).map(|()| config)
}
