//! Sensor Configuration and Acquisition
//!
//! ## Overview
//!
//! Configuration is plain immutable values: [`SensorConfig`] for
//! oversampling and filtering, [`HeaterConfig`] for the gas heater. An
//! acquisition plan maps onto them with a pure function (see
//! [`crate::plan`]); writing them to the device is a separate, fallible step.
//!
//! [`acquire`] runs one forced measurement with a bounded wait:
//!
//! ```text
//! trigger ─→ delay(measurement_duration) ─→ poll ─┬─ ready ──→ Some(sample)
//!                                     ▲           │
//!                                     └─ delay ◄──┴─ WouldBlock (≤ poll_limit)
//!                                                  exhausted ─→ None
//! ```
//!
//! Running out of polls is not an error: the device simply had no new data
//! this cycle. Bus failures abort immediately.

mod forced;

pub use forced::ForcedModeSensor;

use fugit::MicrosDurationU32;

use crate::constants::time::{DEFAULT_READY_POLL_INTERVAL_US, DEFAULT_READY_POLL_LIMIT};
use crate::errors::BusResult;
use crate::sample::PhysicalSample;
use crate::time::Timestamp;
use crate::traits::SensorDevice;

/// Oversampling ratio of one measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Oversampling {
    /// Quantity not measured
    Skipped = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Decode the 3-bit register code (codes above 5 mean x16)
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => Oversampling::Skipped,
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }

    /// 3-bit register code
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// ADC conversion cycles for this ratio
    pub const fn cycles(&self) -> u32 {
        match self {
            Oversampling::Skipped => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Oversampling::Skipped)
    }
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Filter {
    #[default]
    Off = 0,
    Coeff1 = 1,
    Coeff3 = 2,
    Coeff7 = 3,
    Coeff15 = 4,
    Coeff31 = 5,
    Coeff63 = 6,
    Coeff127 = 7,
}

impl Filter {
    /// 3-bit register code
    pub const fn code(&self) -> u8 {
        *self as u8
    }
}

/// Acquisition configuration of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    pub os_temperature: Oversampling,
    pub os_pressure: Oversampling,
    pub os_humidity: Oversampling,
    pub filter: Filter,
}

/// Gas heater configuration (profile slot 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaterConfig {
    pub enabled: bool,
    /// Target hot-plate temperature, °C
    pub target_celsius: u16,
    /// Time the plate is held at target before the gas reading, ms
    pub duration_ms: u16,
}

impl HeaterConfig {
    /// Heater switched off
    pub const fn off() -> Self {
        Self { enabled: false, target_celsius: 0, duration_ms: 0 }
    }
}

impl Default for HeaterConfig {
    /// 300 °C for 100 ms, the sensor's power-on profile
    fn default() -> Self {
        Self { enabled: true, target_celsius: 300, duration_ms: 100 }
    }
}

/// Raw ADC words of one field, before compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawMeasurement {
    /// `new_data` bit was set
    pub new_data: bool,
    /// Device was still converting
    pub measuring: bool,
    pub temperature_adc: u32,
    pub pressure_adc: u32,
    pub humidity_adc: u16,
    pub gas_adc: u16,
    pub gas_range: u8,
    pub gas_valid: bool,
    pub heat_stable: bool,
}

/// Compensated values in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Compensated {
    /// °C
    pub temperature: f32,
    /// Pa
    pub pressure: f32,
    /// %RH
    pub humidity: f32,
    /// Ohm, `None` when no gas conversion ran
    pub gas_resistance: Option<f32>,
}

/// Bounded wait for a forced measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireSettings {
    /// Polls after the measurement delay before giving up
    pub poll_limit: u8,
    /// Delay between polls
    pub poll_interval: MicrosDurationU32,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            poll_limit: DEFAULT_READY_POLL_LIMIT,
            poll_interval: MicrosDurationU32::micros(DEFAULT_READY_POLL_INTERVAL_US),
        }
    }
}

/// Trigger one forced measurement and wait for it, bounded
///
/// Returns `Ok(None)` when the device reported no new data within
/// `settings.poll_limit` polls, and also when the fetched sample is not
/// flagged as new data.
pub fn acquire<S: SensorDevice + ?Sized>(
    sensor: &mut S,
    timestamp: Timestamp,
    settings: &AcquireSettings,
) -> BusResult<Option<PhysicalSample>> {
    sensor.trigger()?;
    let settle = sensor.measurement_duration();
    sensor.delay(settle);

    for attempt in 0..settings.poll_limit {
        match sensor.poll_sample(timestamp) {
            Ok(sample) if sample.has_new_data() => return Ok(Some(sample)),
            Ok(_) => {
                log_debug!("acquire: sample without new data flag");
                return Ok(None);
            }
            Err(nb::Error::WouldBlock) => {
                if attempt + 1 < settings.poll_limit {
                    sensor.delay(settings.poll_interval);
                }
            }
            Err(nb::Error::Other(e)) => return Err(e),
        }
    }

    log_debug!("acquire: no data after {} polls", settings.poll_limit);
    Ok(None)
}
