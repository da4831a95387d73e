//! Acquisition Plans
//!
//! The fusion library answers "what next?" with an [`AcquisitionPlan`]: when
//! to call again, whether to measure at all, and how. A plan lives for one
//! scheduling cycle.
//!
//! Mapping a plan onto sensor configuration is pure. The controller reads
//! the device's current configuration, derives the new one here, and only
//! then performs the bus writes:
//!
//! ```rust
//! use airnode_core::plan::AcquisitionPlan;
//! use airnode_core::sample::ChannelSet;
//! use airnode_core::sensor::{Oversampling, SensorConfig};
//!
//! let plan = AcquisitionPlan {
//!     trigger_measurement: true,
//!     process: ChannelSet::TEMPERATURE.with(ChannelSet::HUMIDITY),
//!     temperature_oversampling: Oversampling::X2,
//!     humidity_oversampling: Oversampling::X1,
//!     ..AcquisitionPlan::idle(3_000_000_000)
//! };
//!
//! let config = plan.sensor_config(&SensorConfig::default());
//! assert_eq!(config.os_temperature, Oversampling::X2);
//! assert_eq!(config.os_pressure, Oversampling::Skipped);
//! ```

use crate::sample::{Channel, ChannelSet};
use crate::sensor::{HeaterConfig, Oversampling, SensorConfig};
use crate::time::Timestamp;

/// What the fusion library wants measured next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionPlan {
    /// Earliest time of the next `run_cycle`, nanoseconds since boot
    pub next_call: Timestamp,
    /// Whether a physical measurement is needed this cycle
    pub trigger_measurement: bool,
    /// Channels the library will consume from the measurement
    pub process: ChannelSet,
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    /// Run a gas conversion (heater on)
    pub run_gas: bool,
    /// Heater target, °C
    pub heater_temperature: u16,
    /// Heater hold time, ms
    pub heating_duration: u16,
}

impl AcquisitionPlan {
    /// Nothing to do until `next_call`
    pub const fn idle(next_call: Timestamp) -> Self {
        Self {
            next_call,
            trigger_measurement: false,
            process: ChannelSet::empty(),
            temperature_oversampling: Oversampling::Skipped,
            pressure_oversampling: Oversampling::Skipped,
            humidity_oversampling: Oversampling::Skipped,
            run_gas: false,
            heater_temperature: 0,
            heating_duration: 0,
        }
    }

    /// Channels the sensor must capture for this plan
    pub fn requires(&self) -> ChannelSet {
        let mut set = ChannelSet::empty();
        if self.temperature_oversampling.is_enabled() {
            set.set(ChannelSet::TEMPERATURE);
        }
        if self.pressure_oversampling.is_enabled() {
            set.set(ChannelSet::PRESSURE);
        }
        if self.humidity_oversampling.is_enabled() {
            set.set(ChannelSet::HUMIDITY);
        }
        if self.run_gas {
            set.set(ChannelSet::GAS);
        }
        set
    }

    /// Whether the library will consume `channel`
    pub fn processes(&self, channel: Channel) -> bool {
        self.process.has(channel)
    }

    /// Sensor configuration for this plan, starting from `current`
    ///
    /// Only oversampling changes; the filter setting is kept.
    pub fn sensor_config(&self, current: &SensorConfig) -> SensorConfig {
        SensorConfig {
            os_temperature: self.temperature_oversampling,
            os_pressure: self.pressure_oversampling,
            os_humidity: self.humidity_oversampling,
            ..*current
        }
    }

    /// Heater configuration for this plan, starting from `current`
    ///
    /// With gas off the heater is disabled but the last profile is kept, so
    /// switching gas back on later restores a sensible set-point.
    pub fn heater_config(&self, current: &HeaterConfig) -> HeaterConfig {
        if self.run_gas {
            HeaterConfig {
                enabled: true,
                target_celsius: self.heater_temperature,
                duration_ms: self.heating_duration,
            }
        } else {
            HeaterConfig { enabled: false, ..*current }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Filter;

    fn gas_plan() -> AcquisitionPlan {
        AcquisitionPlan {
            trigger_measurement: true,
            process: ChannelSet::all(),
            temperature_oversampling: Oversampling::X2,
            pressure_oversampling: Oversampling::X1,
            humidity_oversampling: Oversampling::X1,
            run_gas: true,
            heater_temperature: 320,
            heating_duration: 197,
            ..AcquisitionPlan::idle(10)
        }
    }

    #[test]
    fn idle_plan_requires_nothing() {
        let plan = AcquisitionPlan::idle(42);
        assert!(!plan.trigger_measurement);
        assert!(plan.requires().is_empty());
        assert_eq!(plan.next_call, 42);
    }

    #[test]
    fn sensor_config_keeps_filter() {
        let current = SensorConfig { filter: Filter::Coeff7, ..SensorConfig::default() };
        let next = gas_plan().sensor_config(&current);
        assert_eq!(next.filter, Filter::Coeff7);
        assert_eq!(next.os_temperature, Oversampling::X2);
    }

    #[test]
    fn heater_follows_run_gas() {
        let heater = gas_plan().heater_config(&HeaterConfig::off());
        assert_eq!(heater, HeaterConfig { enabled: true, target_celsius: 320, duration_ms: 197 });

        let off = AcquisitionPlan { run_gas: false, ..gas_plan() }.heater_config(&heater);
        assert!(!off.enabled);
        assert_eq!(off.target_celsius, 320);
    }

    #[test]
    fn requires_matches_oversampling() {
        let plan = AcquisitionPlan {
            pressure_oversampling: Oversampling::Skipped,
            run_gas: false,
            ..gas_plan()
        };
        assert_eq!(plan.requires(), ChannelSet::TEMPERATURE.with(ChannelSet::HUMIDITY));
        assert!(plan.processes(Channel::GasResistance));
    }
}
