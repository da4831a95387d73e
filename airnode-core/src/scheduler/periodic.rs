//! Simple periodic sampling
//!
//! The path without a fusion library: fixed sensor configuration, one
//! forced measurement per interval. Samples go to the distribution pipeline.

use crate::errors::BusResult;
use crate::sample::PhysicalSample;
use crate::sensor::{acquire, AcquireSettings, HeaterConfig, SensorConfig};
use crate::time::Timestamp;
use crate::traits::SensorDevice;

/// Fixed-interval forced-mode sampler
pub struct PeriodicSampler<S> {
    sensor: S,
    config: SensorConfig,
    heater: HeaterConfig,
    settings: AcquireSettings,
    interval: Timestamp,
    next_due: Timestamp,
    configured: bool,
}

impl<S: SensorDevice> PeriodicSampler<S> {
    /// Sample every `interval` nanoseconds with a fixed configuration
    ///
    /// The first sample is due immediately.
    pub fn new(sensor: S, config: SensorConfig, heater: HeaterConfig, interval: Timestamp) -> Self {
        Self {
            sensor,
            config,
            heater,
            settings: AcquireSettings::default(),
            interval,
            next_due: 0,
            configured: false,
        }
    }

    /// Override the bounded-wait settings
    pub fn with_settings(mut self, settings: AcquireSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Earliest time the next sample is due
    pub fn next_due(&self) -> Timestamp {
        self.next_due
    }

    /// Measure if the interval elapsed
    ///
    /// The configuration is written before the first measurement and again
    /// after any bus error, so a sensor that browned out recovers. The next
    /// due time advances whether or not the measurement succeeded.
    pub fn sample_if_due(&mut self, now: Timestamp) -> BusResult<Option<PhysicalSample>> {
        if now < self.next_due {
            return Ok(None);
        }
        self.next_due = now.saturating_add(self.interval);

        let result = self.sample(now);
        if let Err(e) = &result {
            log_warn!("periodic: sampling failed: {}", e);
            self.configured = false;
        }
        result
    }

    fn sample(&mut self, now: Timestamp) -> BusResult<Option<PhysicalSample>> {
        if !self.configured {
            self.sensor.set_config(&self.config)?;
            self.sensor.set_heater_config(&self.heater)?;
            self.configured = true;
        }

        let sample = acquire(&mut self.sensor, now, &self.settings)?;
        if sample.is_none() {
            log_debug!("periodic: no new data");
        }
        Ok(sample)
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
