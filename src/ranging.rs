//! Ranging lifecycle: activation, polled measurement, recovery and the
//! runtime record the driver exposes.

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use embedded_hal::digital::{Error as _, OutputPin};

use crate::clock::Clock;
use crate::codec::{self, RangeReading, RangeStatus};
use crate::config::{SensorConfig, DEFAULT_ADDRESS};
use crate::error::{ConfigError, Error, ProtocolError, TimeoutKind};
use crate::profile::RangingProfile;
use crate::register::{Register, RegisterBus, MODEL_ID};

/// Lifecycle phase of one sensor.
///
/// ```text
/// Uninitialized → Resetting → Addressing → Booting → Calibrating → Configured
///                                                                     ↓
///                                        Faulted ← Recovering ⇄ Ranging
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Not activated yet, configuration may still change
    #[default]
    Uninitialized,
    /// Enable pin cycling
    Resetting,
    /// Assigning the configured bus address
    Addressing,
    /// Waiting for the device to answer and loading its static settings
    Booting,
    /// Reference calibration or calibration overrides
    Calibrating,
    /// Profile applied, no poll issued yet
    Configured,
    /// Steady polling
    Ranging,
    /// The last poll failed; the next one re-syncs first
    Recovering,
    /// Retry budget exhausted. Only an explicit reset leaves this phase.
    Faulted,
}

impl Phase {
    /// Whether polls are accepted in this phase.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Configured | Phase::Ranging | Phase::Recovering)
    }
}

/// Why a completed reading was marked invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// The device reported a range status other than a completed range
    Range(RangeStatus),
    /// Estimated sigma above the profile's sigma limit
    Sigma,
    /// Return signal rate below the signal rate limit
    Signal,
    /// Taken in the poll cycle that re-ran the temperature recalibration
    Recalibrating,
}

/// Calibration values in effect on the device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppliedCalibration {
    /// Part-to-part offset written to the device, in µm
    pub offset_um: Option<i32>,
    /// Crosstalk compensation written to the device, in Mcps
    pub crosstalk_mcps: Option<f32>,
    /// Reference (VHV and phase) calibrations run since activation
    pub reference_runs: u32,
}

/// Runtime record of one sensor, owned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    /// Current lifecycle phase
    pub phase: Phase,
    /// Distance of the last valid reading, in mm
    pub last_distance_mm: Option<u16>,
    /// Reason the most recent invalid reading was rejected
    pub last_error: Option<Rejection>,
    /// Calibration values in effect
    pub calibration: AppliedCalibration,
    /// Failed polls since the last completed one
    pub consecutive_failures: u8,
}

/// One ranging result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Distance reported by the device, in mm, whether or not it passed the checks
    pub distance_mm: u16,
    /// Device range status
    pub status: RangeStatus,
    /// Return signal rate in Mcps
    pub signal_mcps: f32,
    /// Ambient rate in Mcps
    pub ambient_mcps: f32,
    /// Estimated 1σ noise in mm
    pub sigma_mm: f32,
    /// `None` when the reading is valid
    pub rejection: Option<Rejection>,
    /// Completion time in clock milliseconds, strictly increasing per sensor
    pub timestamp_ms: u64,
    /// Poll sequence number, starting at 1 after activation
    pub sequence: u32,
}

impl Measurement {
    /// Whether the reading passed every enabled check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// The distance if the reading is valid.
    #[must_use]
    pub fn valid_distance_mm(&self) -> Option<u16> {
        self.is_valid().then_some(self.distance_mm)
    }
}

/// Applies the validity policy to a decoded reading.
///
/// The device's own status wins, then the sigma check, then the signal check.
#[must_use]
pub fn judge(
    reading: &RangeReading,
    sigma_mm: f32,
    config: &SensorConfig,
    profile: &RangingProfile,
) -> Option<Rejection> {
    if !reading.status.is_ok() {
        return Some(Rejection::Range(reading.status));
    }
    if config.sigma_check && !(sigma_mm <= profile.sigma_limit_mm) {
        return Some(Rejection::Sigma);
    }
    if config.signal_check && reading.signal_mcps < profile.signal_rate_limit_mcps {
        return Some(Rejection::Signal);
    }
    None
}

/// Register values checked for representability before activation touches the bus.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoded {
    pub(crate) signal_rate_limit: u16,
    pub(crate) offset: Option<u16>,
    pub(crate) crosstalk: Option<u16>,
}

impl Encoded {
    pub(crate) fn from_config(
        config: &SensorConfig,
        profile: &RangingProfile,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            signal_rate_limit: codec::mcps_to_q9_7(profile.signal_rate_limit_mcps)?,
            offset: config
                .offset_calibration_um
                .map(codec::encode_offset_um)
                .transpose()?,
            crosstalk: config
                .crosstalk_compensation_mcps
                .map(codec::crosstalk_to_q3_13)
                .transpose()?,
        })
    }
}

/// Bound on one blocking wait.
///
/// Ends at a clock deadline or after `timeout_ms` one-millisecond polls,
/// whichever comes first, so a clock that never advances cannot hang a wait.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at_ms: u64,
    polls_left: u64,
}

/// The per-sensor state machine. All device mutation goes through it.
pub(crate) struct RangingStateMachine<I2C, EN, D, C> {
    pub(crate) bus: RegisterBus<I2C>,
    pub(crate) enable_pin: Option<EN>,
    pub(crate) delay: D,
    pub(crate) clock: C,
    pub(crate) config: SensorConfig,
    pub(crate) profile: RangingProfile,
    pub(crate) state: DeviceState,
    pub(crate) stop_variable: u8,
    pub(crate) timing_budget_us: u32,
    last: Option<Measurement>,
    sequence: u32,
    polls_since_recalibration: u32,
}

impl<I2C, EN, D, C> RangingStateMachine<I2C, EN, D, C> {
    pub(crate) fn new(i2c: I2C, enable_pin: Option<EN>, delay: D, clock: C) -> Self {
        let config = SensorConfig::default();
        Self {
            bus: RegisterBus::new(i2c, DEFAULT_ADDRESS),
            enable_pin,
            delay,
            clock,
            profile: RangingProfile::for_config(&config),
            config,
            state: DeviceState::default(),
            stop_variable: 0,
            timing_budget_us: 0,
            last: None,
            sequence: 0,
            polls_since_recalibration: 0,
        }
    }

    pub(crate) fn last_measurement(&self) -> Option<&Measurement> {
        self.last.as_ref()
    }

    pub(crate) fn release(self) -> (I2C, Option<EN>, D, C) {
        (self.bus.release(), self.enable_pin, self.delay, self.clock)
    }

    fn enter(&mut self, phase: Phase) {
        debug!("phase {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E, EN, D, C> RangingStateMachine<I2C, EN, D, C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
    EN: OutputPin,
    D: DelayNs,
    C: Clock,
{
    /// Drives `Uninitialized` to `Configured`.
    ///
    /// Configuration and representability problems are reported before the
    /// first bus access and leave the phase at `Uninitialized`. Any failure
    /// after that leaves the device `Faulted`.
    pub(crate) async fn activate(&mut self) -> Result<(), Error<E>> {
        if self.state.phase != Phase::Uninitialized {
            return Err(Error::Config(ConfigError::AlreadyActivated));
        }
        let (profile, encoded) = self.preflight()?;
        self.profile = profile;

        let result = self.bring_up(encoded).await;
        if result.is_err() {
            warn!("activation failed in {:?}", self.state.phase);
            self.enter(Phase::Faulted);
        }
        result
    }

    /// Checks that run before any bus access: the enable-pin rules, a 7-bit
    /// address and register representability of the configured values.
    fn preflight(&self) -> Result<(RangingProfile, Encoded), Error<E>> {
        if let Err(e) = self.config.check_enable_pin(self.enable_pin.is_some()) {
            error!("activation rejected: {:?}", e);
            return Err(Error::Config(e));
        }
        if self.config.address > 0x7F {
            error!("activation rejected: address {} is not 7-bit", self.config.address);
            return Err(Error::Config(ConfigError::InvalidAddress(self.config.address)));
        }
        let profile = RangingProfile::for_config(&self.config);
        match Encoded::from_config(&self.config, &profile) {
            Ok(encoded) => Ok((profile, encoded)),
            Err(e) => {
                error!("activation rejected: {:?}", e);
                Err(Error::Protocol(e))
            }
        }
    }

    async fn bring_up(&mut self, encoded: Encoded) -> Result<(), Error<E>> {
        self.enter(Phase::Resetting);
        self.hard_reset().await?;

        self.enter(Phase::Addressing);
        if self.config.address != self.bus.address() {
            info!("moving sensor to address {}", self.config.address);
            self.bus
                .write_byte(Register::I2cSlaveDeviceAddress, self.config.address & 0x7F)
                .await?;
            self.bus.set_address(self.config.address);
        }

        self.enter(Phase::Booting);
        self.boot_with_retries().await?;
        self.data_init().await?;
        self.static_init().await?;

        self.enter(Phase::Calibrating);
        self.calibrate(encoded).await?;
        self.apply_profile(encoded).await?;

        self.sequence = 0;
        self.polls_since_recalibration = 0;
        self.state.consecutive_failures = 0;
        self.enter(Phase::Configured);
        info!(
            "sensor {} configured, budget {} us",
            self.bus.address(),
            self.timing_budget_us
        );
        Ok(())
    }

    async fn hard_reset(&mut self) -> Result<(), Error<E>> {
        let Some(pin) = self.enable_pin.as_mut() else {
            debug!("no enable pin, assuming the device is already reset");
            return Ok(());
        };
        pin.set_low().map_err(|e| Error::EnablePin(e.kind()))?;
        self.delay.delay_ms(10).await;
        pin.set_high().map_err(|e| Error::EnablePin(e.kind()))?;
        self.delay.delay_ms(10).await;
        self.bus.set_address(DEFAULT_ADDRESS);
        Ok(())
    }

    async fn boot_with_retries(&mut self) -> Result<(), Error<E>> {
        let mut attempts = 0u8;
        loop {
            match self.wait_for_boot().await {
                Ok(()) => break Ok(()),
                Err(Error::Timeout(kind)) if attempts < self.config.max_retries => {
                    attempts += 1;
                    warn!("boot wait timed out ({:?}), retry {}", kind, attempts);
                }
                Err(e) => break Err(e),
            }
        }
    }

    async fn wait_for_boot(&mut self) -> Result<(), Error<E>> {
        let mut deadline = self.deadline_after(self.config.bus_timeout_ms());
        loop {
            match self.bus.read_byte(Register::IdentificationModelId).await {
                Ok(MODEL_ID) => break Ok(()),
                Ok(other) => break Err(Error::Protocol(ProtocolError::UnexpectedModelId(other))),
                // not answering yet
                Err(_) => {}
            }
            if self.poll_expired(&mut deadline) {
                break Err(Error::Timeout(TimeoutKind::Boot));
            }
            self.delay.delay_ms(1).await;
        }
    }

    async fn calibrate(&mut self, encoded: Encoded) -> Result<(), Error<E>> {
        if !self.config.has_calibration_overrides() {
            self.reference_calibration().await?;
            self.state.calibration = AppliedCalibration {
                reference_runs: 1,
                ..AppliedCalibration::default()
            };
            return Ok(());
        }
        debug!("calibration overrides supplied, skipping reference calibration");
        self.write_calibration(encoded.offset, encoded.crosstalk).await?;
        self.state.calibration = AppliedCalibration {
            offset_um: self.config.offset_calibration_um,
            crosstalk_mcps: self.config.crosstalk_compensation_mcps,
            reference_runs: 0,
        };
        Ok(())
    }

    async fn write_calibration(
        &mut self,
        offset: Option<u16>,
        crosstalk: Option<u16>,
    ) -> Result<(), Error<E>> {
        if let Some(raw) = offset {
            self.bus
                .write_word(Register::AlgoPartToPartRangeOffset, raw)
                .await?;
        }
        if let Some(raw) = crosstalk {
            self.bus
                .write_word(Register::CrosstalkCompensationPeakRate, raw)
                .await?;
        }
        Ok(())
    }

    async fn apply_profile(&mut self, encoded: Encoded) -> Result<(), Error<E>> {
        let profile = self.profile;
        let changed = self.set_vcsel_periods(&profile).await?;
        self.set_timing_budget(profile.timing_budget_us).await?;
        if changed {
            self.phase_calibration().await?;
        }
        let limit = if self.config.signal_check {
            encoded.signal_rate_limit
        } else {
            0
        };
        self.bus
            .write_word(Register::FinalRangeMinCountRateRtnLimit, limit)
            .await?;
        Ok(())
    }

    /// One poll step.
    ///
    /// # Errors
    ///
    /// * `Error::Config(ConfigError::NotActivated)` - before activation
    /// * `Error::Faulted` - the retry budget was exhausted earlier
    /// * `Error::Timeout` / `Error::Bus` - counted against the retry budget
    /// * `Error::Protocol` - surfaced without a phase change
    pub(crate) async fn poll_once(&mut self) -> Result<Measurement, Error<E>> {
        self.require_active()?;
        if self.state.phase == Phase::Configured {
            self.enter(Phase::Ranging);
        }
        match self.poll_step().await {
            Ok(measurement) => {
                self.state.consecutive_failures = 0;
                Ok(measurement)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    async fn poll_step(&mut self) -> Result<Measurement, Error<E>> {
        if self.state.phase == Phase::Recovering {
            self.resync().await?;
            info!("re-sync complete, resuming ranging");
            self.enter(Phase::Ranging);
        }
        let recalibrating = self.recalibration_due();
        if recalibrating {
            debug!("temperature recalibration");
            self.reference_calibration().await?;
            self.polls_since_recalibration = 0;
            self.state.calibration.reference_runs += 1;
        }
        let reading = self.measure().await?;
        Ok(self.record(&reading, recalibrating))
    }

    /// Lightweight re-sync: abandon any pending range, clear the interrupt and
    /// check the device still identifies itself, all within the bus timeout.
    async fn resync(&mut self) -> Result<(), Error<E>> {
        let deadline = self.deadline_after(self.config.bus_timeout_ms());
        self.bus.write_byte(Register::SysrangeStart, 0x00).await?;
        self.check_deadline(&deadline, TimeoutKind::BusComm)?;
        self.bus
            .write_byte(Register::SystemInterruptClear, 0x01)
            .await?;
        self.check_deadline(&deadline, TimeoutKind::BusComm)?;
        let id = self.bus.read_byte(Register::IdentificationModelId).await?;
        self.check_deadline(&deadline, TimeoutKind::BusComm)?;
        if id != MODEL_ID {
            return Err(Error::Protocol(ProtocolError::UnexpectedModelId(id)));
        }
        Ok(())
    }

    /// Immediate reference recalibration.
    pub(crate) async fn recalibrate(&mut self) -> Result<(), Error<E>> {
        self.require_active()?;
        match self.reference_calibration().await {
            Ok(()) => {
                self.polls_since_recalibration = 0;
                self.state.calibration.reference_runs += 1;
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Writes new offset and crosstalk values to an active device.
    pub(crate) async fn apply_calibration(
        &mut self,
        offset_um: Option<i32>,
        crosstalk_mcps: Option<f32>,
    ) -> Result<(), Error<E>> {
        let candidate = SensorConfig {
            offset_calibration_um: offset_um.or(self.config.offset_calibration_um),
            crosstalk_compensation_mcps: crosstalk_mcps.or(self.config.crosstalk_compensation_mcps),
            ..self.config
        };
        if let Some(offset) = offset_um {
            if !(-512_000..=511_000).contains(&offset) {
                return Err(Error::Config(ConfigError::OffsetOutOfRange));
            }
        }
        if let Some(rate) = crosstalk_mcps {
            if !(0.0..=10.0).contains(&rate) {
                return Err(Error::Config(ConfigError::CrosstalkOutOfRange));
            }
        }
        let encoded = Encoded::from_config(&candidate, &self.profile).map_err(Error::Protocol)?;

        if self.state.phase == Phase::Uninitialized {
            self.config = candidate;
            return Ok(());
        }
        self.require_active()?;
        self.write_calibration(
            offset_um.and(encoded.offset),
            crosstalk_mcps.and(encoded.crosstalk),
        )
        .await?;
        self.config = candidate;
        if offset_um.is_some() {
            self.state.calibration.offset_um = offset_um;
        }
        if crosstalk_mcps.is_some() {
            self.state.calibration.crosstalk_mcps = crosstalk_mcps;
        }
        debug!("calibration updated");
        Ok(())
    }

    /// Resets the device and runs a full activation again.
    ///
    /// Uses the enable pin when present, otherwise a software reset on the
    /// device's current address.
    pub(crate) async fn reset(&mut self) -> Result<(), Error<E>> {
        info!("resetting sensor from {:?}", self.state.phase);
        self.preflight()?;
        if self.enable_pin.is_none() && self.state.phase != Phase::Uninitialized {
            if let Err(e) = self.soft_reset().await {
                warn!("software reset failed");
                self.enter(Phase::Faulted);
                return Err(e);
            }
        }
        self.state = DeviceState::default();
        self.last = None;
        self.activate().await
    }

    async fn measure(&mut self) -> Result<RangeReading, Error<E>> {
        let mut deadline = self.deadline_after(u64::from(self.config.reading_timeout_ms));
        self.start_single_shot().await?;
        self.check_deadline(&deadline, TimeoutKind::Reading)?;

        while self.bus.read_byte(Register::SysrangeStart).await? & 0x01 != 0 {
            self.check_poll(&mut deadline, TimeoutKind::Reading)?;
            self.delay.delay_ms(1).await;
        }

        loop {
            let status = self.bus.read_byte(Register::ResultInterruptStatus).await?;
            match codec::decode_interrupt_status(status) {
                Ok(true) => break Ok(()),
                Ok(false) => {}
                Err(e) => {
                    self.bus
                        .write_byte(Register::SystemInterruptClear, 0x01)
                        .await?;
                    break Err(Error::Protocol(e));
                }
            }
            self.check_poll(&mut deadline, TimeoutKind::Reading)?;
            self.delay.delay_ms(1).await;
        }?;

        let mut block = [0u8; codec::RESULT_BLOCK_LEN];
        self.bus
            .read_multi(Register::ResultRangeStatus, &mut block)
            .await?;
        self.bus
            .write_byte(Register::SystemInterruptClear, 0x01)
            .await?;
        self.check_deadline(&deadline, TimeoutKind::Reading)?;
        RangeReading::decode(&block).map_err(Error::Protocol)
    }

    fn record(&mut self, reading: &RangeReading, recalibrating: bool) -> Measurement {
        let sigma_mm =
            codec::sigma_estimate_mm(reading.signal_mcps, reading.ambient_mcps, self.timing_budget_us);
        let rejection = if recalibrating {
            Some(Rejection::Recalibrating)
        } else {
            judge(reading, sigma_mm, &self.config, &self.profile)
        };
        let now = self.clock.now_ms();
        let timestamp_ms = match &self.last {
            Some(previous) if now <= previous.timestamp_ms => previous.timestamp_ms + 1,
            _ => now,
        };
        self.sequence = self.sequence.wrapping_add(1);

        let measurement = Measurement {
            distance_mm: reading.range_mm,
            status: reading.status,
            signal_mcps: reading.signal_mcps,
            ambient_mcps: reading.ambient_mcps,
            sigma_mm,
            rejection,
            timestamp_ms,
            sequence: self.sequence,
        };
        match rejection {
            None => self.state.last_distance_mm = Some(reading.range_mm),
            Some(reason) => {
                debug!("reading {} rejected: {:?}", self.sequence, reason);
                self.state.last_error = Some(reason);
            }
        }
        self.last = Some(measurement);
        measurement
    }

    /// Counts a timeout or bus failure against the retry budget.
    fn require_active(&self) -> Result<(), Error<E>> {
        match self.state.phase {
            Phase::Faulted => Err(Error::Faulted),
            phase if phase.is_active() => Ok(()),
            _ => Err(Error::Config(ConfigError::NotActivated)),
        }
    }

    fn record_failure(&mut self, error: Error<E>) -> Error<E> {
        if matches!(error, Error::Timeout(_) | Error::Bus(_)) {
            self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
            if self.state.consecutive_failures > self.config.max_retries {
                warn!(
                    "{} consecutive failed polls, sensor faulted",
                    self.state.consecutive_failures
                );
                self.enter(Phase::Faulted);
            } else {
                warn!(
                    "poll failed ({}/{}), recovering",
                    self.state.consecutive_failures,
                    self.config.max_retries
                );
                self.enter(Phase::Recovering);
            }
        }
        error
    }

    fn recalibration_due(&mut self) -> bool {
        if !self.config.temperature_recalibration || self.config.recalibration_interval == 0 {
            return false;
        }
        self.polls_since_recalibration += 1;
        self.polls_since_recalibration >= self.config.recalibration_interval
    }

    pub(crate) fn deadline_after(&self, ms: u64) -> Deadline {
        Deadline {
            at_ms: self.clock.now_ms().saturating_add(ms),
            polls_left: ms,
        }
    }

    fn expired(&self, deadline: &Deadline) -> bool {
        self.clock.now_ms() > deadline.at_ms
    }

    /// Spends one poll of a wait loop; each poll is followed by a 1 ms delay.
    pub(crate) fn poll_expired(&self, deadline: &mut Deadline) -> bool {
        if deadline.polls_left == 0 {
            return true;
        }
        deadline.polls_left -= 1;
        self.expired(deadline)
    }

    pub(crate) fn check_deadline(&self, deadline: &Deadline, kind: TimeoutKind) -> Result<(), Error<E>> {
        if self.expired(deadline) {
            return Err(Error::Timeout(kind));
        }
        Ok(())
    }

    fn check_poll(&self, deadline: &mut Deadline, kind: TimeoutKind) -> Result<(), Error<E>> {
        if self.poll_expired(deadline) {
            return Err(Error::Timeout(kind));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SenseMode;

    fn reading(status: RangeStatus, signal_mcps: f32) -> RangeReading {
        RangeReading {
            status,
            range_mm: 412,
            signal_mcps,
            ambient_mcps: 0.2,
            effective_spads: 40.0,
        }
    }

    #[test]
    fn device_status_is_judged_first() {
        let config = SensorConfig::default();
        let profile = RangingProfile::for_config(&config);
        let r = reading(RangeStatus::PhaseConsistency, 0.01);
        assert_eq!(
            judge(&r, 100.0, &config, &profile),
            Some(Rejection::Range(RangeStatus::PhaseConsistency))
        );
    }

    #[test]
    fn sigma_and_signal_checks_follow_their_flags() {
        let config = SensorConfig::default();
        let profile = RangingProfile::for_config(&config);
        let r = reading(RangeStatus::RangeComplete, 0.1);
        assert_eq!(judge(&r, 30.0, &config, &profile), Some(Rejection::Sigma));
        assert_eq!(judge(&r, 5.0, &config, &profile), Some(Rejection::Signal));

        let lenient = config.with_sigma_check(false).with_signal_check(false);
        assert_eq!(judge(&r, 30.0, &lenient, &profile), None);
        assert_eq!(
            judge(&r, f32::INFINITY, &config.with_signal_check(false), &profile),
            Some(Rejection::Sigma)
        );
    }

    #[test]
    fn status_without_a_range_is_rejected() {
        let config = SensorConfig::default();
        let profile = RangingProfile::for_config(&config);
        let r = reading(RangeStatus::None, 10.0);
        assert_eq!(
            judge(&r, 1.0, &config, &profile),
            Some(Rejection::Range(RangeStatus::None))
        );
    }

    #[test]
    fn signal_limit_follows_the_profile_and_override() {
        let config = SensorConfig::default().with_sense_mode(SenseMode::LongRange);
        let profile = RangingProfile::for_config(&config);
        let r = reading(RangeStatus::RangeComplete, 0.15);
        assert_eq!(judge(&r, 5.0, &config, &profile), None);

        let strict = config.with_signal_rate_limit(0.5);
        let profile = RangingProfile::for_config(&strict);
        assert_eq!(judge(&r, 5.0, &strict, &profile), Some(Rejection::Signal));
    }

    #[test]
    fn encoded_values_are_checked_up_front() {
        let config = SensorConfig::default().with_crosstalk_compensation_mcps(9.0);
        let profile = RangingProfile::for_config(&config);
        assert!(matches!(
            Encoded::from_config(&config, &profile),
            Err(ProtocolError::CrosstalkUnrepresentable)
        ));

        let config = SensorConfig::default().with_offset_calibration_um(-1_000);
        let encoded = Encoded::from_config(&config, &profile).unwrap();
        assert_eq!(encoded.offset, Some(0x0FFC));
        assert_eq!(encoded.signal_rate_limit, 32);
    }

    #[test]
    fn only_settled_phases_accept_polls() {
        assert!(Phase::Configured.is_active());
        assert!(Phase::Recovering.is_active());
        assert!(!Phase::Booting.is_active());
        assert!(!Phase::Faulted.is_active());
    }
}
