//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scriptable sensor device with fault injection
//! - A scriptable fusion engine that records every batch it processes
//! - Sample and plan fixtures

#![allow(dead_code)]

pub mod scenarios;

use std::collections::VecDeque;

use airnode_core::errors::{BusError, BusResult, EngineError};
use airnode_core::fusion::{
    Accuracy, DerivedOutput, DerivedOutputs, EngineVersion, FusionInput, FusionState, OutputChannel,
    OutputSet, SampleRate,
};
use airnode_core::plan::AcquisitionPlan;
use airnode_core::sample::{ChannelSet, PhysicalSample};
use airnode_core::sensor::{HeaterConfig, SensorConfig};
use airnode_core::time::Timestamp;
use airnode_core::traits::{FusionEngine, SensorDevice};
use fugit::MicrosDurationU32;

/// Sensor double: returns a template sample after a number of not-ready polls
#[derive(Debug, Default)]
pub struct FakeSensor {
    pub config: SensorConfig,
    pub heater: HeaterConfig,
    /// Successful configuration writes (acquisition + heater)
    pub config_writes: usize,
    pub triggers: usize,
    pub delays_us: Vec<u32>,
    /// Sample returned once ready; `None` means never ready
    pub template: Option<PhysicalSample>,
    /// WouldBlock polls before the template is returned
    pub busy_polls: u8,
    pub polls_left: u8,
    pub fail_set_config: Option<BusError>,
    pub fail_set_heater: Option<BusError>,
    pub fail_trigger: Option<BusError>,
}

impl FakeSensor {
    pub fn returning(sample: PhysicalSample) -> Self {
        Self { template: Some(sample), ..Self::default() }
    }

    pub fn never_ready() -> Self {
        Self::default()
    }
}

impl SensorDevice for FakeSensor {
    fn config(&self) -> SensorConfig {
        self.config
    }

    fn heater_config(&self) -> HeaterConfig {
        self.heater
    }

    fn set_config(&mut self, config: &SensorConfig) -> BusResult<()> {
        if let Some(err) = self.fail_set_config {
            return Err(err);
        }
        self.config = *config;
        self.config_writes += 1;
        Ok(())
    }

    fn set_heater_config(&mut self, heater: &HeaterConfig) -> BusResult<()> {
        if let Some(err) = self.fail_set_heater {
            return Err(err);
        }
        self.heater = *heater;
        self.config_writes += 1;
        Ok(())
    }

    fn trigger(&mut self) -> BusResult<()> {
        if let Some(err) = self.fail_trigger {
            return Err(err);
        }
        self.triggers += 1;
        self.polls_left = self.busy_polls;
        Ok(())
    }

    fn measurement_duration(&self) -> MicrosDurationU32 {
        MicrosDurationU32::micros(2_000)
    }

    fn poll_sample(&mut self, timestamp: Timestamp) -> nb::Result<PhysicalSample, BusError> {
        if self.polls_left > 0 {
            self.polls_left -= 1;
            return Err(nb::Error::WouldBlock);
        }
        match self.template {
            Some(sample) => Ok(PhysicalSample { timestamp, ..sample }),
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn delay(&mut self, duration: MicrosDurationU32) {
        self.delays_us.push(duration.ticks());
    }
}

/// Fusion engine double
///
/// Plans come from a script (idle once it runs out). Every processed batch
/// is recorded and appends one byte to the state, so exports change as the
/// engine runs.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub plans: VecDeque<Result<AcquisitionPlan, EngineError>>,
    pub batches: Vec<Vec<FusionInput>>,
    /// Outputs returned per processed batch
    pub outputs_per_batch: usize,
    pub state: FusionState,
    pub imported: Vec<FusionState>,
    pub fail_init: Option<EngineError>,
    pub fail_subscribe: Option<EngineError>,
    pub fail_process: Option<EngineError>,
    pub fail_export: Option<EngineError>,
    /// Reject any imported state whose first byte matches
    pub reject_import_marker: Option<u8>,
    pub subscribed: Option<(OutputSet, SampleRate)>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self { outputs_per_batch: 2, ..Self::default() }
    }

    pub fn with_plans(plans: impl IntoIterator<Item = AcquisitionPlan>) -> Self {
        let mut engine = Self::new();
        engine.plans = plans.into_iter().map(Ok).collect();
        engine
    }

    pub fn with_state(mut self, bytes: &[u8]) -> Self {
        self.state = FusionState::from_bytes(bytes).unwrap();
        self
    }
}

impl FusionEngine for ScriptedEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        self.fail_init.map_or(Ok(()), Err)
    }

    fn version(&self) -> Result<EngineVersion, EngineError> {
        Ok(EngineVersion { major: 2, minor: 4, major_bugfix: 0, minor_bugfix: 0 })
    }

    fn subscribe(&mut self, outputs: OutputSet, rate: SampleRate) -> Result<ChannelSet, EngineError> {
        if let Some(err) = self.fail_subscribe {
            return Err(err);
        }
        self.subscribed = Some((outputs, rate));
        Ok(ChannelSet::all())
    }

    fn plan_next(&mut self, now: Timestamp) -> Result<AcquisitionPlan, EngineError> {
        self.plans
            .pop_front()
            .unwrap_or(Ok(AcquisitionPlan::idle(now + 3_000_000_000)))
    }

    fn process(&mut self, inputs: &[FusionInput]) -> Result<DerivedOutputs, EngineError> {
        if let Some(err) = self.fail_process {
            return Err(err);
        }
        self.batches.push(inputs.to_vec());

        let mut bytes = self.state.as_bytes().to_vec();
        if bytes.len() < airnode_core::constants::MAX_STATE_BLOB_SIZE {
            bytes.push(self.batches.len() as u8);
        }
        self.state = FusionState::from_bytes(&bytes).unwrap();

        let ts = inputs.first().map(|i| i.timestamp).unwrap_or(0);
        let mut outputs = DerivedOutputs::new();
        for channel in OutputChannel::ALL.iter().take(self.outputs_per_batch) {
            outputs
                .push(DerivedOutput { channel: *channel, value: 50.0, accuracy: Accuracy::Low, timestamp: ts })
                .unwrap();
        }
        Ok(outputs)
    }

    fn export_state(&mut self) -> Result<FusionState, EngineError> {
        match self.fail_export {
            Some(err) => Err(err),
            None => Ok(self.state.clone()),
        }
    }

    fn import_state(&mut self, state: &FusionState) -> Result<(), EngineError> {
        if let Some(marker) = self.reject_import_marker {
            if state.as_bytes().first() == Some(&marker) {
                return Err(EngineError::new(-32));
            }
        }
        self.imported.push(state.clone());
        self.state = state.clone();
        Ok(())
    }
}

/// Plan measuring and processing every channel, gas included
pub fn full_plan(next_call: Timestamp) -> AcquisitionPlan {
    use airnode_core::sensor::Oversampling;

    AcquisitionPlan {
        trigger_measurement: true,
        process: ChannelSet::all(),
        temperature_oversampling: Oversampling::X2,
        pressure_oversampling: Oversampling::X1,
        humidity_oversampling: Oversampling::X1,
        run_gas: true,
        heater_temperature: 320,
        heating_duration: 197,
        ..AcquisitionPlan::idle(next_call)
    }
}
