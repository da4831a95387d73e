//! Sensor Device Traits
//!
//! [`SensorDevice`] is what the scheduling controller drives: read the
//! current configuration, write a new one, trigger a forced measurement and
//! poll for its result. The poll follows the `nb` convention so "not ready
//! yet" is `WouldBlock`, distinct from a bus failure.
//!
//! ## Common Patterns
//!
//! ```rust
//! use airnode_core::traits::SensorDevice;
//! use airnode_core::errors::BusError;
//!
//! fn read_now<S: SensorDevice>(sensor: &mut S) -> Result<bool, BusError> {
//!     sensor.trigger()?;
//!     let settle = sensor.measurement_duration();
//!     sensor.delay(settle);
//!     match sensor.poll_sample(0) {
//!         Ok(_sample) => Ok(true),
//!         Err(nb::Error::WouldBlock) => Ok(false),
//!         Err(nb::Error::Other(e)) => Err(e),
//!     }
//! }
//! ```

use fugit::MicrosDurationU32;

use crate::errors::{BusError, BusResult};
use crate::sample::PhysicalSample;
use crate::sensor::{Compensated, HeaterConfig, RawMeasurement, SensorConfig};
use crate::time::Timestamp;

/// A sensor measuring in forced (one-shot) mode
pub trait SensorDevice {
    /// Configuration currently applied to the device
    fn config(&self) -> SensorConfig;

    /// Heater configuration currently applied to the device
    fn heater_config(&self) -> HeaterConfig;

    /// Write oversampling/filter configuration
    ///
    /// On failure the previously applied configuration stays authoritative.
    fn set_config(&mut self, config: &SensorConfig) -> BusResult<()>;

    /// Write gas heater configuration
    ///
    /// Sensors without a gas heater accept and ignore this.
    fn set_heater_config(&mut self, heater: &HeaterConfig) -> BusResult<()>;

    /// Start one forced measurement
    fn trigger(&mut self) -> BusResult<()>;

    /// Expected time from trigger to data ready, heater time included
    fn measurement_duration(&self) -> MicrosDurationU32;

    /// Fetch the measurement if it is ready
    ///
    /// `WouldBlock` while the device is still measuring or has no new data.
    fn poll_sample(&mut self, timestamp: Timestamp) -> nb::Result<PhysicalSample, BusError>;

    /// Block for at least `duration`
    fn delay(&mut self, duration: MicrosDurationU32);
}

/// Vendor compensation math
///
/// Converts raw ADC words into physical units using the calibration
/// coefficients burned into each part. Kept behind a trait so the register
/// driver stays independent of the vendor's formulas.
pub trait Compensation {
    /// Convert one raw measurement
    ///
    /// Temperature must be compensated first; pressure and humidity depend
    /// on it, so implementations may keep the intermediate between calls.
    fn compensate(&mut self, raw: &RawMeasurement) -> Compensated;

    /// Heater set-point register code for `target_celsius`
    fn heater_resistance(&self, target_celsius: u16) -> u8;
}
