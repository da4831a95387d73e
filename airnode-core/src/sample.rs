//! Physical Samples
//!
//! A [`PhysicalSample`] is one forced measurement: every channel the sensor
//! supports, captured at one instant. Channels the sensor lacks (a
//! temperature/humidity/pressure-only part has no gas channel) are `None`.
//!
//! Samples are `Copy` and immutable once produced. They flow from the sensor
//! driver to the scheduling controller (continuous fusion path) or to the
//! distribution pipeline (simple periodic path).
//!
//! ## Units
//!
//! | Channel        | Unit |
//! |----------------|------|
//! | Temperature    | °C   |
//! | Humidity       | %RH  |
//! | Pressure       | Pa   |
//! | Gas resistance | Ohm  |
//!
//! ```rust
//! use airnode_core::sample::{Channel, PhysicalSample};
//!
//! let sample = PhysicalSample::new(1_000)
//!     .with_temperature(21.0)
//!     .with_humidity(40.0)
//!     .with_pressure(101_300.0);
//!
//! assert_eq!(sample.get(Channel::Temperature), Some(21.0));
//! assert_eq!(sample.get(Channel::GasResistance), None);
//! assert!(sample.has_new_data());
//! ```

use crate::time::Timestamp;

/// Measured quantity of a physical sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Channel {
    Temperature = 0,
    Humidity = 1,
    Pressure = 2,
    GasResistance = 3,
}

impl Channel {
    /// All channels, in capture order
    pub const ALL: [Channel; 4] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Pressure,
        Channel::GasResistance,
    ];

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Pressure => "pressure",
            Channel::GasResistance => "gas_resistance",
        }
    }

    /// Get unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Humidity => "%",
            Channel::Pressure => "Pa",
            Channel::GasResistance => "Ohm",
        }
    }

    const fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// Bit set of channels
///
/// Used by acquisition plans to say which channels the fusion engine needs
/// this cycle, and by subscriptions to report which it needs at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const TEMPERATURE: Self = Self(1 << 0);
    pub const HUMIDITY: Self = Self(1 << 1);
    pub const PRESSURE: Self = Self(1 << 2);
    pub const GAS: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// Temperature, humidity and pressure without gas
    pub const fn climate() -> Self {
        Self(0b0111)
    }

    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn has(&self, channel: Channel) -> bool {
        (self.0 & channel.bit()) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate contained channels in capture order
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.has(*c))
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        Self(channel.bit())
    }
}

/// Status flags reported with a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleStatus(u8);

impl SampleStatus {
    /// The data registers hold a measurement not read before
    pub const NEW_DATA: Self = Self(1 << 0);
    /// The gas measurement is valid
    pub const GAS_VALID: Self = Self(1 << 1);
    /// The heater reached its target temperature
    pub const HEAT_STABLE: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// One forced measurement, all channels captured at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalSample {
    /// Capture time, nanoseconds since boot
    pub timestamp: Timestamp,
    /// Temperature in °C
    pub temperature: Option<f32>,
    /// Relative humidity in %
    pub humidity: Option<f32>,
    /// Pressure in Pa
    pub pressure: Option<f32>,
    /// Gas sensor resistance in Ohm
    pub gas_resistance: Option<f32>,
    /// Driver status flags
    pub status: SampleStatus,
}

impl PhysicalSample {
    /// Empty sample flagged as new data; add channels with the `with_*` methods
    pub const fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            temperature: None,
            humidity: None,
            pressure: None,
            gas_resistance: None,
            status: SampleStatus::NEW_DATA,
        }
    }

    pub const fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub const fn with_humidity(mut self, percent: f32) -> Self {
        self.humidity = Some(percent);
        self
    }

    pub const fn with_pressure(mut self, pascal: f32) -> Self {
        self.pressure = Some(pascal);
        self
    }

    pub const fn with_gas_resistance(mut self, ohm: f32) -> Self {
        self.gas_resistance = Some(ohm);
        self
    }

    pub const fn with_status(mut self, status: SampleStatus) -> Self {
        self.status = status;
        self
    }

    /// Value of one channel, `None` if the sensor did not measure it
    pub const fn get(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Pressure => self.pressure,
            Channel::GasResistance => self.gas_resistance,
        }
    }

    /// Channels carrying a value
    pub fn channels(&self) -> ChannelSet {
        let mut set = ChannelSet::empty();
        for channel in Channel::ALL {
            if self.get(channel).is_some() {
                set.set(channel.into());
            }
        }
        set
    }

    /// Whether the driver flagged this as a fresh measurement
    pub const fn has_new_data(&self) -> bool {
        self.status.contains(SampleStatus::NEW_DATA)
    }

    /// Pressure converted to hPa
    pub fn pressure_hpa(&self) -> Option<f32> {
        self.pressure.map(|pa| pa * 0.01)
    }
}
