#![cfg(not(feature = "async"))]

mod common;

use common::{activated, setup};
use vl53l0x_ranging::{
    ConfigError, Error, Phase, ProtocolError, RangeStatus, Rejection, SensorConfig,
};

#[test]
fn poll_before_activation_is_a_config_error() {
    let (mut sensor, fake, _clock) = setup(SensorConfig::default());
    assert!(matches!(
        sensor.poll_once(),
        Err(Error::Config(ConfigError::NotActivated))
    ));
    assert_eq!(fake.device().writes, 0);
}

#[test]
fn first_poll_enters_ranging_and_records_the_distance() {
    let (mut sensor, _fake, _clock) = activated(SensorConfig::default());

    let measurement = sensor.poll_once().unwrap();

    assert_eq!(sensor.phase(), Phase::Ranging);
    assert!(measurement.is_valid());
    assert_eq!(measurement.valid_distance_mm(), Some(523));
    assert_eq!(measurement.status, RangeStatus::RangeComplete);
    assert_eq!(measurement.signal_mcps, 10.0);
    assert!(measurement.sigma_mm < 18.0);
    assert_eq!(measurement.sequence, 1);
    assert_eq!(sensor.state().last_distance_mm, Some(523));
    assert_eq!(sensor.last_measurement(), Some(measurement));
}

#[test]
fn weak_signal_is_invalid_and_keeps_the_last_distance() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default().with_sigma_check(false));
    sensor.poll_once().unwrap();

    fake.device().set_result(11, 800, 0.1, 0.5);
    let measurement = sensor.poll_once().unwrap();

    assert!(!measurement.is_valid());
    assert_eq!(measurement.rejection, Some(Rejection::Signal));
    assert_eq!(measurement.distance_mm, 800);
    assert_eq!(measurement.valid_distance_mm(), None);
    assert_eq!(sensor.state().last_distance_mm, Some(523));
    assert_eq!(sensor.state().last_error, Some(Rejection::Signal));
    assert_eq!(sensor.phase(), Phase::Ranging);
}

#[test]
fn weak_signal_fails_the_sigma_check_first() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default());
    fake.device().set_result(11, 800, 0.1, 0.5);

    let measurement = sensor.poll_once().unwrap();

    assert_eq!(measurement.rejection, Some(Rejection::Sigma));
    assert_eq!(sensor.state().last_distance_mm, None);
}

#[test]
fn device_range_status_marks_the_reading_invalid() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default());
    fake.device().set_result(4, 8190, 0.0, 0.5);

    let measurement = sensor.poll_once().unwrap();

    assert_eq!(
        measurement.rejection,
        Some(Rejection::Range(RangeStatus::MsrcNoTarget))
    );

    // the rejection stays on record after a later valid reading
    fake.device().set_result(11, 300, 5.0, 0.1);
    assert!(sensor.poll_once().unwrap().is_valid());
    assert_eq!(sensor.state().last_distance_mm, Some(300));
    assert_eq!(
        sensor.state().last_error,
        Some(Rejection::Range(RangeStatus::MsrcNoTarget))
    );
}

#[test]
fn repeated_polls_produce_distinct_records() {
    let (mut sensor, _fake, clock) = activated(SensorConfig::default());
    let now = clock.now();

    let first = sensor.poll_once().unwrap();
    let second = sensor.poll_once().unwrap();

    // the simulated clock does not move while ranging
    assert_eq!(clock.now(), now);
    assert_eq!(first.distance_mm, second.distance_mm);
    assert!(second.timestamp_ms > first.timestamp_ms);
    assert_eq!(second.sequence, first.sequence + 1);
}

#[test]
fn update_polls_once_per_interval() {
    let (mut sensor, fake, clock) = activated(SensorConfig::default().with_poll_interval_ms(1_000));
    let started = fake.device().ranges_started;

    assert!(sensor.update().unwrap().is_some());
    assert!(sensor.update().unwrap().is_none());
    assert_eq!(sensor.ms_until_next_poll(), 1_000);

    clock.advance(400);
    assert!(sensor.update().unwrap().is_none());
    assert_eq!(sensor.ms_until_next_poll(), 600);

    clock.advance(600);
    assert!(sensor.update().unwrap().is_some());
    assert_eq!(fake.device().ranges_started, started + 2);
}

#[test]
fn temperature_recalibration_marks_its_cycle_invalid() {
    let (mut sensor, _fake, _clock) = activated(
        SensorConfig::default()
            .with_temperature_recalibration(true)
            .with_recalibration_interval(3),
    );

    assert!(sensor.poll_once().unwrap().is_valid());
    assert!(sensor.poll_once().unwrap().is_valid());
    let third = sensor.poll_once().unwrap();
    assert_eq!(third.rejection, Some(Rejection::Recalibrating));
    assert_eq!(third.distance_mm, 523);
    assert_eq!(sensor.state().calibration.reference_runs, 2);
    assert_eq!(sensor.phase(), Phase::Ranging);
    assert!(sensor.poll_once().unwrap().is_valid());
}

#[test]
fn explicit_recalibration_runs_the_reference_sequence() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default());
    let started = fake.device().ranges_started;

    sensor.recalibrate().unwrap();

    // VHV then phase calibration
    assert_eq!(fake.device().ranges_started, started + 2);
    assert_eq!(sensor.state().calibration.reference_runs, 2);
    assert_eq!(fake.device().reg(0x01), 0xE8);
}

#[test]
fn interrupt_error_bits_are_a_protocol_error() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default());
    sensor.poll_once().unwrap();
    fake.device().ready_status = 0x1C;

    assert!(matches!(
        sensor.poll_once(),
        Err(Error::Protocol(ProtocolError::RangeError(0x1C)))
    ));
    assert_eq!(sensor.phase(), Phase::Ranging);
    assert_eq!(sensor.state().consecutive_failures, 0);
}

#[test]
fn runtime_calibration_updates_the_device() {
    let (mut sensor, fake, _clock) = activated(SensorConfig::default());

    sensor.apply_calibration(Some(2_000), None).unwrap();
    assert_eq!(fake.device().word(0x28), 8);
    assert_eq!(sensor.state().calibration.offset_um, Some(2_000));
    assert_eq!(sensor.config().offset_calibration_um, Some(2_000));

    assert!(matches!(
        sensor.apply_calibration(None, Some(11.0)),
        Err(Error::Config(ConfigError::CrosstalkOutOfRange))
    ));
    assert!(matches!(
        sensor.apply_calibration(None, Some(9.0)),
        Err(Error::Protocol(ProtocolError::CrosstalkUnrepresentable))
    ));
    assert_eq!(sensor.state().calibration.crosstalk_mcps, None);
}
