//! Fusion Data Types
//!
//! Values exchanged with the [`FusionEngine`](crate::traits::FusionEngine):
//! subscriptions, physical inputs, derived outputs with their accuracy tier,
//! and the opaque state blob.
//!
//! ## Accuracy Tiers
//!
//! The library grades every derived output. Tiers are ordered so consumers
//! can filter with a comparison:
//!
//! ```rust
//! use airnode_core::fusion::Accuracy;
//!
//! assert!(Accuracy::Unreliable < Accuracy::Low);
//! assert!(Accuracy::Medium < Accuracy::High);
//! assert_eq!(Accuracy::from_raw(2), Some(Accuracy::Medium));
//! assert_eq!(Accuracy::from_raw(7), None);
//! ```

use core::fmt;

use heapless::Vec;

use crate::constants::buffers::{MAX_FUSION_INPUTS, MAX_FUSION_OUTPUTS, MAX_STATE_BLOB_SIZE};
use crate::constants::time::{SAMPLE_RATE_CONT_HZ, SAMPLE_RATE_LP_HZ, SAMPLE_RATE_ULP_HZ};
use crate::time::Timestamp;

/// Derived outputs of one processing step
pub type DerivedOutputs = Vec<DerivedOutput, MAX_FUSION_OUTPUTS>;

/// Physical inputs of one processing step
pub type FusionInputs = Vec<FusionInput, MAX_FUSION_INPUTS>;

/// Rate at which subscribed outputs are produced
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SampleRate {
    /// Output switched off
    Disabled,
    /// One measurement every 300 s
    UltraLowPower,
    /// One measurement every 3 s
    LowPower,
    /// One measurement per second
    Continuous,
    /// Library-specific rate in Hz
    Custom(f32),
}

impl SampleRate {
    /// Rate in Hz (0.0 when disabled)
    pub fn hz(&self) -> f32 {
        match self {
            SampleRate::Disabled => 0.0,
            SampleRate::UltraLowPower => SAMPLE_RATE_ULP_HZ,
            SampleRate::LowPower => SAMPLE_RATE_LP_HZ,
            SampleRate::Continuous => SAMPLE_RATE_CONT_HZ,
            SampleRate::Custom(hz) => *hz,
        }
    }
}

/// Virtual output of the fusion library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum OutputChannel {
    Iaq = 0,
    StaticIaq = 1,
    Co2Equivalent = 2,
    BreathVocEquivalent = 3,
    RawTemperature = 4,
    RawPressure = 5,
    RawHumidity = 6,
    RawGas = 7,
    StabilizationStatus = 8,
    RunInStatus = 9,
    CompensatedTemperature = 10,
    CompensatedHumidity = 11,
    CompensatedGas = 12,
    GasPercentage = 13,
}

impl OutputChannel {
    /// Every output the library offers
    pub const ALL: [OutputChannel; 14] = [
        OutputChannel::Iaq,
        OutputChannel::StaticIaq,
        OutputChannel::Co2Equivalent,
        OutputChannel::BreathVocEquivalent,
        OutputChannel::RawTemperature,
        OutputChannel::RawPressure,
        OutputChannel::RawHumidity,
        OutputChannel::RawGas,
        OutputChannel::StabilizationStatus,
        OutputChannel::RunInStatus,
        OutputChannel::CompensatedTemperature,
        OutputChannel::CompensatedHumidity,
        OutputChannel::CompensatedGas,
        OutputChannel::GasPercentage,
    ];

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            OutputChannel::Iaq => "iaq",
            OutputChannel::StaticIaq => "static_iaq",
            OutputChannel::Co2Equivalent => "co2_equivalent",
            OutputChannel::BreathVocEquivalent => "breath_voc_equivalent",
            OutputChannel::RawTemperature => "raw_temperature",
            OutputChannel::RawPressure => "raw_pressure",
            OutputChannel::RawHumidity => "raw_humidity",
            OutputChannel::RawGas => "raw_gas",
            OutputChannel::StabilizationStatus => "stabilization_status",
            OutputChannel::RunInStatus => "run_in_status",
            OutputChannel::CompensatedTemperature => "compensated_temperature",
            OutputChannel::CompensatedHumidity => "compensated_humidity",
            OutputChannel::CompensatedGas => "compensated_gas",
            OutputChannel::GasPercentage => "gas_percentage",
        }
    }
}

/// Bit set of output channels, used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputSet(u16);

impl OutputSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0x3FFF)
    }

    pub fn insert(&mut self, channel: OutputChannel) {
        self.0 |= 1 << (channel as u16);
    }

    pub const fn with(self, channel: OutputChannel) -> Self {
        Self(self.0 | (1 << (channel as u16)))
    }

    pub const fn contains(&self, channel: OutputChannel) -> bool {
        (self.0 & (1 << (channel as u16))) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate contained outputs
    pub fn iter(self) -> impl Iterator<Item = OutputChannel> {
        OutputChannel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

/// Accuracy tier the library attaches to an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Accuracy {
    Unreliable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Accuracy {
    /// Map the library's raw tier, `None` for codes outside 0..=3
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Accuracy::Unreliable),
            1 => Some(Accuracy::Low),
            2 => Some(Accuracy::Medium),
            3 => Some(Accuracy::High),
            _ => None,
        }
    }

    /// Log label
    pub const fn label(&self) -> &'static str {
        match self {
            Accuracy::Unreliable => "UNRELIABLE",
            Accuracy::Low => "LOW_ACCURACY",
            Accuracy::Medium => "MEDIUM_ACCURACY",
            Accuracy::High => "HIGH_ACCURACY",
        }
    }
}

/// Physical input channel of the fusion library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InputChannel {
    /// Sensor temperature, °C
    Temperature,
    /// Temperature offset caused by nearby heat sources, °C
    HeatSource,
    /// Relative humidity, %
    Humidity,
    /// Pressure, Pa
    Pressure,
    /// Gas sensor resistance, Ohm
    GasResistance,
}

/// One physical signal fed to the library
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionInput {
    pub channel: InputChannel,
    pub signal: f32,
    pub timestamp: Timestamp,
}

impl FusionInput {
    pub const fn new(channel: InputChannel, signal: f32, timestamp: Timestamp) -> Self {
        Self { channel, signal, timestamp }
    }
}

/// One derived output: named channel, value, accuracy tier
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedOutput {
    pub channel: OutputChannel,
    pub value: f32,
    pub accuracy: Accuracy,
    pub timestamp: Timestamp,
}

impl fmt::Display for DerivedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>24} = {:>10.2} [{}]",
            self.channel.name(),
            self.value,
            self.accuracy.label()
        )
    }
}

/// Library version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineVersion {
    pub major: u8,
    pub minor: u8,
    pub major_bugfix: u8,
    pub minor_bugfix: u8,
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.major_bugfix, self.minor_bugfix
        )
    }
}

/// Opaque, size-bounded serialized state of the fusion library
///
/// Only the binding interprets the bytes. Everything else copies them.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct FusionState {
    blob: Vec<u8, MAX_STATE_BLOB_SIZE>,
}

impl FusionState {
    /// Empty state
    pub const fn new() -> Self {
        Self { blob: Vec::new() }
    }

    /// Copy `bytes`, `None` if longer than [`MAX_STATE_BLOB_SIZE`]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes).ok().map(|blob| Self { blob })
    }

    /// State bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.blob
    }

    /// Declared length in bytes
    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// Printable dump of the state as a Rust constant
    ///
    /// The output pastes back into firmware as the known-good default
    /// imported when no valid record is stored:
    ///
    /// ```rust
    /// use airnode_core::fusion::FusionState;
    ///
    /// let state = FusionState::from_bytes(&[0x03, 0x00, 0xa1]).unwrap();
    /// assert_eq!(
    ///     state.dump().to_string(),
    ///     "// fusion state, 3 bytes\n\
    ///      pub const DEFAULT_FUSION_STATE: [u8; 3] = [\n\
    ///      \x20   0x03, 0x00, 0xa1,\n\
    ///      ];\n"
    /// );
    /// ```
    pub fn dump(&self) -> StateDump<'_> {
        StateDump(self.as_bytes())
    }
}

/// [`FusionState::dump`] formatter, 16 bytes per line
pub struct StateDump<'a>(&'a [u8]);

impl StateDump<'_> {
    const BYTES_PER_LINE: usize = 16;
}

impl fmt::Display for StateDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.len();
        writeln!(f, "// fusion state, {} bytes", len)?;
        if len == 0 {
            return writeln!(f, "pub const DEFAULT_FUSION_STATE: [u8; 0] = [];");
        }

        writeln!(f, "pub const DEFAULT_FUSION_STATE: [u8; {}] = [", len)?;
        for line in self.0.chunks(Self::BYTES_PER_LINE) {
            f.write_str("    ")?;
            for (i, byte) in line.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:#04x},", byte)?;
            }
            f.write_str("\n")?;
        }
        writeln!(f, "];")
    }
}

impl fmt::Debug for FusionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FusionState")
            .field("len", &self.blob.len())
            .finish()
    }
}
