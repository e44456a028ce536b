#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::clock::Clock;
use crate::config::{SenseMode, SensorConfig};
use crate::error::{ConfigError, Error};
use crate::ranging::{DeviceState, Measurement, Phase, RangingStateMachine};
use crate::scheduler::PollingScheduler;

/// Stand-in for sensors whose XSHUT line is not wired to the host.
///
/// Drivers built with [`Vl53l0x::new`] carry this type and never drive it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnablePin;

impl ErrorType for NoEnablePin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoEnablePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// VL53L0X time-of-flight ranging sensor driver.
///
/// The driver owns the bus handle, the optional enable (XSHUT) pin, a delay
/// and a millisecond [`Clock`]. It exposes configuration setters that are only
/// accepted before activation, an activation call, single polls, a
/// scheduler-paced [`update`](Self::update) and read access to the runtime
/// [`DeviceState`].
///
/// Every method that touches the device takes `&mut self`, so polls on one
/// sensor never overlap.
pub struct Vl53l0x<I2C, EN, D, C> {
    machine: RangingStateMachine<I2C, EN, D, C>,
    scheduler: PollingScheduler,
}

impl<I2C, D, C> Vl53l0x<I2C, NoEnablePin, D, C> {
    /// Creates a driver for a sensor whose enable pin is not controlled by the host.
    ///
    /// Such a sensor must stay at the default address 0x29 and be alone on its
    /// bus. The device is not touched until [`activate`](Self::activate).
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C interface implementation for sensor communication
    /// * `delay` - Delay implementation for timing operations
    /// * `clock` - Monotonic millisecond time source
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vl53l0x_ranging::Vl53l0x;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    ///
    /// let boot = std::time::Instant::now();
    /// let clock = move || boot.elapsed().as_millis() as u64;
    /// let mut sensor = Vl53l0x::new(i2c, delay, clock);
    /// ```
    pub fn new(i2c: I2C, delay: D, clock: C) -> Self {
        Self::build(i2c, None, delay, clock)
    }
}

impl<I2C, EN, D, C> Vl53l0x<I2C, EN, D, C> {
    /// Creates a driver that hard-resets the sensor through `enable_pin`.
    ///
    /// An enable pin is required to move the sensor off 0x29 and to share the
    /// bus with other VL53 devices. When several sensors share a bus, hold
    /// every other sensor's enable pin low until this one is activated; the
    /// driver does not sequence that for you.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vl53l0x_ranging::{SensorConfig, Vl53l0x};
    /// use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let xshut = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);
    ///
    /// let boot = std::time::Instant::now();
    /// let clock = move || boot.elapsed().as_millis() as u64;
    /// let mut sensor = Vl53l0x::with_enable_pin(i2c, xshut, delay, clock);
    /// sensor.set_config(SensorConfig::default().with_address(0x30)).unwrap();
    /// sensor.activate().unwrap();
    /// ```
    pub fn with_enable_pin(i2c: I2C, enable_pin: EN, delay: D, clock: C) -> Self {
        Self::build(i2c, Some(enable_pin), delay, clock)
    }

    fn build(i2c: I2C, enable_pin: Option<EN>, delay: D, clock: C) -> Self {
        let machine = RangingStateMachine::new(i2c, enable_pin, delay, clock);
        let scheduler = PollingScheduler::new(machine.config.poll_interval_ms);
        Self { machine, scheduler }
    }

    /// Current configuration.
    pub fn config(&self) -> &SensorConfig {
        &self.machine.config
    }

    /// Runtime record: phase, last valid distance, last rejection, applied
    /// calibration and the failure counter.
    pub fn state(&self) -> &DeviceState {
        &self.machine.state
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.machine.state.phase
    }

    /// Address the driver currently talks to.
    pub fn address(&self) -> u8 {
        self.machine.bus.address()
    }

    /// Timing budget in effect on the device, in µs. Zero before activation.
    pub fn measurement_timing_budget_us(&self) -> u32 {
        self.machine.timing_budget_us
    }

    /// The latest measurement, valid or not, or `None` if no poll has completed yet.
    pub fn last_measurement(&self) -> Option<Measurement> {
        self.machine.last_measurement().copied()
    }

    /// Replaces the whole configuration.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_config(&mut self, config: SensorConfig) -> Result<(), ConfigError> {
        self.configure(|c| *c = config)
    }

    /// Sets the bus address assigned during activation.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_address(&mut self, address: u8) -> Result<(), ConfigError> {
        self.configure(|c| c.address = address)
    }

    /// Declares whether other VL53 devices share the bus.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_shared_bus(&mut self, shared: bool) -> Result<(), ConfigError> {
        self.configure(|c| c.shared_bus = shared)
    }

    /// Overrides the profile's signal rate limit, in Mcps.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_signal_rate_limit(&mut self, limit_mcps: f32) -> Result<(), ConfigError> {
        self.configure(|c| c.signal_rate_limit = Some(limit_mcps))
    }

    /// Sets the legacy long-range switch.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_long_range(&mut self, long_range: bool) -> Result<(), ConfigError> {
        self.configure(|c| c.long_range = long_range)
    }

    /// Selects the ranging profile.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_sense_mode(&mut self, mode: SenseMode) -> Result<(), ConfigError> {
        self.configure(|c| c.sense_mode = mode)
    }

    /// Enables or disables the sigma check.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_sigma_check(&mut self, enable: bool) -> Result<(), ConfigError> {
        self.configure(|c| c.sigma_check = enable)
    }

    /// Enables or disables the signal check.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_signal_check(&mut self, enable: bool) -> Result<(), ConfigError> {
        self.configure(|c| c.signal_check = enable)
    }

    /// Overrides the profile's timing budget, in µs.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_timing_budget_us(&mut self, budget_us: u32) -> Result<(), ConfigError> {
        self.configure(|c| c.timing_budget_us = Some(budget_us))
    }

    /// Supplies a part-to-part offset in µm.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_offset_calibration_um(&mut self, offset_um: i32) -> Result<(), ConfigError> {
        self.configure(|c| c.offset_calibration_um = Some(offset_um))
    }

    /// Supplies a crosstalk compensation rate in Mcps.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_crosstalk_compensation_mcps(&mut self, rate_mcps: f32) -> Result<(), ConfigError> {
        self.configure(|c| c.crosstalk_compensation_mcps = Some(rate_mcps))
    }

    /// Enables periodic temperature recalibration.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_temperature_recalibration(&mut self, enable: bool) -> Result<(), ConfigError> {
        self.configure(|c| c.temperature_recalibration = enable)
    }

    /// Sets the reading timeout in ms.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_reading_timeout_ms(&mut self, timeout_ms: u32) -> Result<(), ConfigError> {
        self.configure(|c| c.reading_timeout_ms = timeout_ms)
    }

    /// Sets the bus communication timeout in µs.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_bus_timeout_us(&mut self, timeout_us: u32) -> Result<(), ConfigError> {
        self.configure(|c| c.bus_timeout_us = timeout_us)
    }

    /// Sets the scheduler interval in ms.
    ///
    /// # Errors
    ///
    /// * `ConfigError::AlreadyActivated` - called after activation was attempted
    pub fn set_poll_interval_ms(&mut self, interval_ms: u32) -> Result<(), ConfigError> {
        self.configure(|c| c.poll_interval_ms = interval_ms)
    }

    fn configure(&mut self, f: impl FnOnce(&mut SensorConfig)) -> Result<(), ConfigError> {
        if self.phase() != Phase::Uninitialized {
            error!("setter rejected in {:?}", self.phase());
            return Err(ConfigError::AlreadyActivated);
        }
        f(&mut self.machine.config);
        self.scheduler
            .set_interval_ms(self.machine.config.poll_interval_ms);
        Ok(())
    }

    /// Hands back the bus, the enable pin (if any), the delay and the clock.
    pub fn release(self) -> (I2C, Option<EN>, D, C) {
        self.machine.release()
    }
}

impl<I2C, EN, D, C: Clock> Vl53l0x<I2C, EN, D, C> {
    /// Milliseconds until [`update`](Self::update) will poll again.
    pub fn ms_until_next_poll(&self) -> u64 {
        self.scheduler.ms_until_due(self.machine.clock.now_ms())
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E, EN, D, C> Vl53l0x<I2C, EN, D, C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
    EN: OutputPin,
    D: DelayNs,
    C: Clock,
{
    /// Brings the sensor from `Uninitialized` to `Configured`.
    ///
    /// Resets the sensor through the enable pin (if any), assigns the
    /// configured address, waits for it to boot, loads the static settings,
    /// runs the reference calibration or applies the calibration overrides,
    /// and finally programs the sense-mode profile with the explicit overrides
    /// on top.
    ///
    /// # Errors
    ///
    /// * `Error::Config` - enable-pin rules violated or already activated; no bus access happened
    /// * `Error::Protocol` - a configured value the device cannot represent, or an unexpected device
    /// * `Error::Timeout(TimeoutKind::Boot)` - the sensor never answered within the retry budget
    /// * `Error::Bus` / `Error::EnablePin` - hardware failure
    ///
    /// Failures after the first bus access leave the sensor [`Phase::Faulted`].
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vl53l0x_ranging::{Phase, SenseMode, Vl53l0x};
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let boot = std::time::Instant::now();
    /// let clock = move || boot.elapsed().as_millis() as u64;
    /// let mut sensor = Vl53l0x::new(i2c, delay, clock);
    ///
    /// sensor.set_sense_mode(SenseMode::HighAccuracy).unwrap();
    /// sensor.activate().unwrap();
    /// assert_eq!(sensor.phase(), Phase::Configured);
    /// ```
    pub async fn activate(&mut self) -> Result<(), Error<E>> {
        self.machine.activate().await
    }

    /// Issues one ranging request and waits for it within the reading timeout.
    ///
    /// The returned [`Measurement`] may be invalid (see
    /// [`Measurement::rejection`]); invalid readings never replace
    /// [`DeviceState::last_distance_mm`].
    ///
    /// # Errors
    ///
    /// * `Error::Config(ConfigError::NotActivated)` - called before activation
    /// * `Error::Timeout` / `Error::Bus` - the poll failed; the sensor moves to
    ///   [`Phase::Recovering`], or [`Phase::Faulted`] once the retry budget is spent
    /// * `Error::Protocol` - malformed device response, phase unchanged
    /// * `Error::Faulted` - the sensor needs [`reset`](Self::reset)
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vl53l0x_ranging::Vl53l0x;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let boot = std::time::Instant::now();
    /// let clock = move || boot.elapsed().as_millis() as u64;
    /// let mut sensor = Vl53l0x::new(i2c, delay, clock);
    ///
    /// sensor.activate().unwrap();
    /// let measurement = sensor.poll_once().unwrap();
    /// match measurement.valid_distance_mm() {
    ///     Some(mm) => println!("Distance: {} mm", mm),
    ///     None => println!("Rejected: {:?}", measurement.rejection),
    /// }
    /// ```
    pub async fn poll_once(&mut self) -> Result<Measurement, Error<E>> {
        self.machine.poll_once().await
    }

    /// Polls if the scheduler says a poll is due, otherwise returns `Ok(None)`.
    ///
    /// Call it from the host loop as often as convenient; polls are spaced by
    /// the configured poll interval.
    ///
    /// # Errors
    ///
    /// Same as [`poll_once`](Self::poll_once) for the ticks that poll.
    pub async fn update(&mut self) -> Result<Option<Measurement>, Error<E>> {
        let now = self.machine.clock.now_ms();
        if !self.scheduler.poll_due(now) {
            return Ok(None);
        }
        self.machine.poll_once().await.map(Some)
    }

    /// Resets the sensor and activates it again with the current configuration.
    ///
    /// This is the only way out of [`Phase::Faulted`]. With an enable pin the
    /// reset is a hardware reset, otherwise a software reset. The
    /// configuration fixed at activation is reused; the enable-pin and
    /// representability checks run again before the device is touched.
    ///
    /// # Errors
    ///
    /// Same as [`activate`](Self::activate).
    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        self.scheduler.reset();
        self.machine.reset().await
    }

    /// Re-runs the VHV and phase reference calibration now.
    ///
    /// # Errors
    ///
    /// * `Error::Config(ConfigError::NotActivated)` - called before activation
    /// * `Error::Faulted` - the sensor needs [`reset`](Self::reset)
    /// * `Error::Timeout` / `Error::Bus` - counted like a failed poll
    pub async fn recalibrate(&mut self) -> Result<(), Error<E>> {
        self.machine.recalibrate().await
    }

    /// Replaces the offset and/or crosstalk compensation.
    ///
    /// Before activation this only updates the configuration. On an active
    /// sensor the new values are written immediately; `None` leaves a value
    /// unchanged.
    ///
    /// # Errors
    ///
    /// * `Error::Config` - offset outside -512000..=511000 µm or crosstalk outside 0..=10 Mcps
    /// * `Error::Protocol` - crosstalk of 8 Mcps or more, which the device cannot hold
    /// * `Error::Faulted` - the sensor needs [`reset`](Self::reset)
    /// * `Error::Bus` - If there was an I2C communication error
    pub async fn apply_calibration(
        &mut self,
        offset_um: Option<i32>,
        crosstalk_mcps: Option<f32>,
    ) -> Result<(), Error<E>> {
        self.machine
            .apply_calibration(offset_um, crosstalk_mcps)
            .await
    }
}
