//! Shared fakes for connector integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use airnode_connectors::display::{Screen, TextDisplay, WallClock};
use airnode_connectors::telemetry::Publisher;
use airnode_connectors::ConnectorError;
use airnode_core::errors::{BusError, BusResult, EngineError};
use airnode_core::fusion::{
    Accuracy, DerivedOutput, DerivedOutputs, EngineVersion, FusionInput, FusionState, OutputChannel, OutputSet,
    SampleRate,
};
use airnode_core::plan::AcquisitionPlan;
use airnode_core::sample::{ChannelSet, PhysicalSample};
use airnode_core::sensor::{HeaterConfig, Oversampling, SensorConfig};
use airnode_core::time::Timestamp;
use airnode_core::traits::{FusionEngine, SensorDevice, TimeSource};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use fugit::MicrosDurationU32;

/// Simulated clock advancing by `step` on every read
#[derive(Debug, Clone)]
pub struct SteppingClock {
    now: Arc<AtomicU64>,
    step: u64,
}

impl SteppingClock {
    pub fn new(step: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(0)), step }
    }
}

impl TimeSource for SteppingClock {
    fn now(&self) -> Timestamp {
        self.now.fetch_add(self.step, Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Sensor returning scripted samples; repeats the last one when exhausted
#[derive(Debug)]
pub struct ScriptSensor {
    samples: VecDeque<PhysicalSample>,
    last: PhysicalSample,
    config: SensorConfig,
    heater: HeaterConfig,
    trigger_error: Option<BusError>,
}

impl ScriptSensor {
    pub fn new(samples: impl IntoIterator<Item = PhysicalSample>) -> Self {
        let samples: VecDeque<_> = samples.into_iter().collect();
        let last = samples.back().copied().unwrap_or(PhysicalSample::new(0));
        Self { samples, last, config: SensorConfig::default(), heater: HeaterConfig::off(), trigger_error: None }
    }

    /// Every trigger fails with `err`
    pub fn failing_trigger(mut self, err: BusError) -> Self {
        self.trigger_error = Some(err);
        self
    }

    pub fn constant(sample: PhysicalSample) -> Self {
        Self::new([sample])
    }
}

impl SensorDevice for ScriptSensor {
    fn config(&self) -> SensorConfig {
        self.config
    }

    fn heater_config(&self) -> HeaterConfig {
        self.heater
    }

    fn set_config(&mut self, config: &SensorConfig) -> BusResult<()> {
        self.config = *config;
        Ok(())
    }

    fn set_heater_config(&mut self, heater: &HeaterConfig) -> BusResult<()> {
        self.heater = *heater;
        Ok(())
    }

    fn trigger(&mut self) -> BusResult<()> {
        self.trigger_error.map_or(Ok(()), Err)
    }

    fn measurement_duration(&self) -> MicrosDurationU32 {
        MicrosDurationU32::micros(0)
    }

    fn poll_sample(&mut self, timestamp: Timestamp) -> nb::Result<PhysicalSample, BusError> {
        let sample = self.samples.pop_front().unwrap_or(self.last);
        Ok(PhysicalSample { timestamp, ..sample })
    }

    fn delay(&mut self, _duration: MicrosDurationU32) {}
}

/// Engine measuring every 3 s (or `period_ns`), learning one byte per processed batch
#[derive(Debug, Clone, Default)]
pub struct LearningEngine {
    pub processed: Arc<AtomicUsize>,
    pub fail_init: bool,
    pub state: FusionState,
    pub period_ns: Option<u64>,
    /// `(now, next_call)` of every plan handed out
    pub plans: Arc<Mutex<Vec<(Timestamp, Timestamp)>>>,
}

impl LearningEngine {
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn plans(&self) -> Vec<(Timestamp, Timestamp)> {
        self.plans.lock().unwrap().clone()
    }
}

impl FusionEngine for LearningEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        if self.fail_init {
            return Err(EngineError::new(-1));
        }
        Ok(())
    }

    fn version(&self) -> Result<EngineVersion, EngineError> {
        Ok(EngineVersion { major: 1, minor: 4, major_bugfix: 9, minor_bugfix: 2 })
    }

    fn subscribe(&mut self, _outputs: OutputSet, _rate: SampleRate) -> Result<ChannelSet, EngineError> {
        Ok(ChannelSet::climate())
    }

    fn plan_next(&mut self, now: Timestamp) -> Result<AcquisitionPlan, EngineError> {
        let next_call = now + self.period_ns.unwrap_or(3_000 * 1_000_000);
        self.plans.lock().unwrap().push((now, next_call));
        Ok(AcquisitionPlan {
            trigger_measurement: true,
            process: ChannelSet::climate(),
            temperature_oversampling: Oversampling::X1,
            pressure_oversampling: Oversampling::X1,
            humidity_oversampling: Oversampling::X1,
            ..AcquisitionPlan::idle(next_call)
        })
    }

    fn process(&mut self, inputs: &[FusionInput]) -> Result<DerivedOutputs, EngineError> {
        let count = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        let mut bytes = self.state.as_bytes().to_vec();
        if bytes.len() < airnode_core::constants::MAX_STATE_BLOB_SIZE {
            bytes.push(count as u8);
        }
        self.state = FusionState::from_bytes(&bytes).unwrap();

        let mut outputs = DerivedOutputs::new();
        let timestamp = inputs.first().map(|i| i.timestamp).unwrap_or(0);
        outputs
            .push(DerivedOutput { channel: OutputChannel::Iaq, value: 25.0, accuracy: Accuracy::Medium, timestamp })
            .unwrap();
        Ok(outputs)
    }

    fn export_state(&mut self) -> Result<FusionState, EngineError> {
        Ok(self.state.clone())
    }

    fn import_state(&mut self, state: &FusionState) -> Result<(), EngineError> {
        self.state = state.clone();
        Ok(())
    }
}

/// Publisher recording every message
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    pub messages: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectorError> {
        if self.fail {
            return Err(ConnectorError::Publish("broker unreachable".into()));
        }
        self.messages.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }
}

/// Display recording every frame
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    pub frames: Arc<Mutex<Vec<Screen>>>,
}

impl RecordingDisplay {
    pub fn frames(&self) -> Vec<Screen> {
        self.frames.lock().unwrap().clone()
    }
}

impl TextDisplay for RecordingDisplay {
    fn draw(&mut self, screen: &Screen) -> Result<(), ConnectorError> {
        self.frames.lock().unwrap().push(screen.clone());
        Ok(())
    }
}

/// Wall clock set by the test
#[derive(Debug, Clone, Default)]
pub struct ManualWallClock {
    pub now: Arc<Mutex<Option<NaiveDateTime>>>,
}

impl ManualWallClock {
    pub fn set(&self, t: NaiveDateTime) {
        *self.now.lock().unwrap() = Some(t);
    }
}

impl WallClock for ManualWallClock {
    fn now(&self) -> Option<NaiveDateTime> {
        *self.now.lock().unwrap()
    }
}
