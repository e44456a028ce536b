//! # VL53L0X Time-of-Flight Ranging Driver
//!
//! A `no_std` driver for ST-Microelectronics' VL53L0X time-of-flight distance
//! sensor that manages the whole ranging lifecycle: hardware reset and address
//! assignment, boot, reference calibration, sense-mode profiles, polled
//! single-shot ranging with per-reading validity checks, and bounded recovery
//! from timeouts and bus errors.
//!
//! The driver is blocking by default. Enable the `async` feature to get the
//! same API as `async fn`s over `embedded-hal-async`.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use vl53l0x_ranging::{SenseMode, SensorConfig, Vl53l0x};
//!
//! let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let delay = embedded_hal_mock::eh1::delay::NoopDelay;
//! let boot = std::time::Instant::now();
//! let clock = move || boot.elapsed().as_millis() as u64;
//! let mut sensor = Vl53l0x::new(i2c, delay, clock);
//!
//! let config = SensorConfig::default()
//!     .with_sense_mode(SenseMode::LongRange)
//!     .with_poll_interval_ms(1_000);
//! sensor.set_config(config).unwrap();
//! sensor.activate().unwrap();
//!
//! loop {
//!     if let Some(measurement) = sensor.update().unwrap() {
//!         match measurement.valid_distance_mm() {
//!             Some(mm) => println!("Distance: {} mm", mm),
//!             None => println!("Invalid reading: {:?}", measurement.rejection),
//!         }
//!     }
//!     // sleep for sensor.ms_until_next_poll() here
//! }
//! ```
//!
//! ## Lifecycle
//!
//! Activation walks `Uninitialized → Resetting → Addressing → Booting →
//! Calibrating → Configured`. Polling moves to `Ranging`; a timed-out or
//! failed poll moves to `Recovering`, and the next poll re-syncs before
//! measuring. Once more than [`SensorConfig::max_retries`] polls in a row have
//! failed the sensor is `Faulted` until [`Vl53l0x::reset`] is called.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod fmt; // <-- must be first module!

mod clock;
pub mod codec;
mod config;
mod driver;
mod error;
mod profile;
mod ranging;
mod register;
mod scheduler;
mod sequence;

pub use clock::Clock;
pub use codec::{RangeReading, RangeStatus};
pub use config::{validate, SenseMode, SensorConfig, DEFAULT_ADDRESS, MIN_TIMING_BUDGET_US};
pub use driver::{NoEnablePin, Vl53l0x};
pub use error::{ConfigError, Error, ProtocolError, TimeoutKind};
pub use profile::RangingProfile;
pub use ranging::{judge, AppliedCalibration, DeviceState, Measurement, Phase, Rejection};
pub use register::{Register, MODEL_ID};
pub use scheduler::PollingScheduler;
