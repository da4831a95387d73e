//! Sensor Scheduling Controller
//!
//! ## Overview
//!
//! The fusion library, not a timer, sets the cadence. Each call to
//! [`Controller::run_cycle`] asks the library what it needs, measures only
//! if asked, and feeds the result back:
//!
//! ```text
//! plan_next(now)
//!     │
//!     ├─ no trigger ──────────────────────────────→ Skipped
//!     ▼
//! configure (sensor config, heater config) ─ err ─→ CycleError::Configure
//!     ▼
//! trigger + bounded wait ─── no data ─────────────→ NotReady
//!     ▼
//! build batch from plan.process ─ empty ──────────→ NothingProduced
//!     ▼
//! process(batch) ─ zero outputs ──────────────────→ NothingProduced
//!     ▼
//! Produced(outputs)
//! ```
//!
//! Every outcome carries the plan's `next_call`; the caller sleeps until
//! then. Errors abort the cycle and are returned with their original cause.
//! There is no automatic retry: the next scheduled cycle is the retry. A
//! cycle that fails after planning still has a schedule, available from
//! [`Controller::planned_call`]; only a failed `plan_next` leaves the caller
//! to pick its own retry time.
//!
//! ## Heat-source Offset
//!
//! When temperature is processed, the batch also carries a synthetic
//! [`InputChannel::HeatSource`] input: the offset between the sensor's
//! reading and ambient caused by nearby heat (a display, a radio). It comes
//! from [`ControllerConfig::heat_source_offset`] and can be changed at
//! runtime.

mod periodic;

pub use periodic::PeriodicSampler;

use fugit::MicrosDurationU32;

use crate::constants::buffers::MAX_FUSION_INPUTS;
use crate::constants::time::{DEFAULT_READY_POLL_INTERVAL_US, DEFAULT_READY_POLL_LIMIT};
use crate::errors::{CycleError, SetupError};
use crate::fusion::{DerivedOutput, DerivedOutputs, FusionInput, FusionInputs, InputChannel, OutputSet, SampleRate};
use crate::plan::AcquisitionPlan;
use crate::sample::{Channel, ChannelSet, PhysicalSample};
use crate::sensor::{acquire, AcquireSettings};
use crate::time::Timestamp;
use crate::traits::{FusionEngine, SensorDevice};

// Temperature, heat source, humidity, pressure, gas
const _: () = assert!(MAX_FUSION_INPUTS >= 5, "Fusion batch must hold every physical input");

/// Controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    /// Temperature offset from nearby heat sources, °C
    pub heat_source_offset: f32,
    /// Status polls after the measurement delay before "not ready"
    pub ready_poll_limit: u8,
    /// Delay between status polls, µs
    pub ready_poll_interval_us: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            heat_source_offset: 0.0,
            ready_poll_limit: DEFAULT_READY_POLL_LIMIT,
            ready_poll_interval_us: DEFAULT_READY_POLL_INTERVAL_US,
        }
    }
}

impl ControllerConfig {
    /// Bounded-wait settings for one acquisition
    pub fn acquire_settings(&self) -> AcquireSettings {
        AcquireSettings {
            poll_limit: self.ready_poll_limit,
            poll_interval: MicrosDurationU32::micros(self.ready_poll_interval_us),
        }
    }
}

/// Result of one scheduling cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The library asked for no measurement
    Skipped { next_call: Timestamp },
    /// Measurement triggered but the device produced no new data in time
    NotReady { next_call: Timestamp },
    /// Measurement done, nothing came out (empty batch or warm-up)
    NothingProduced { next_call: Timestamp },
    /// The library produced outputs
    Produced { next_call: Timestamp, outputs: DerivedOutputs },
}

impl CycleOutcome {
    /// Earliest time of the next cycle
    pub fn next_call(&self) -> Timestamp {
        match self {
            CycleOutcome::Skipped { next_call }
            | CycleOutcome::NotReady { next_call }
            | CycleOutcome::NothingProduced { next_call }
            | CycleOutcome::Produced { next_call, .. } => *next_call,
        }
    }

    /// Outputs of this cycle, empty unless `Produced`
    pub fn outputs(&self) -> &[DerivedOutput] {
        match self {
            CycleOutcome::Produced { outputs, .. } => outputs.as_slice(),
            _ => &[],
        }
    }
}

/// Cycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Cycles run (any outcome, errors included)
    pub cycles: u32,
    /// Cycles without a measurement
    pub skipped: u32,
    /// Measurements without new data
    pub not_ready: u32,
    /// Cycles that produced outputs
    pub produced: u32,
    /// Cycles aborted by an error
    pub failed: u32,
}

/// Drives the sense-compute loop at the fusion library's cadence
pub struct Controller<S, E> {
    sensor: S,
    engine: E,
    config: ControllerConfig,
    required: ChannelSet,
    planned_call: Option<Timestamp>,
    stats: CycleStats,
}

impl<S: SensorDevice, E: FusionEngine> Controller<S, E> {
    /// Initialise the library and subscribe every output at `rate`
    ///
    /// Failure here is fatal for the owning task.
    pub fn setup(sensor: S, mut engine: E, config: ControllerConfig, rate: SampleRate) -> Result<Self, SetupError> {
        engine.init().map_err(|e| {
            log_error!("setup: engine init returned {}", e.code);
            SetupError::Init(e)
        })?;

        match engine.version() {
            Ok(version) => log_info!("setup: fusion library version {}", version),
            Err(e) => log_warn!("setup: version query returned {}", e.code),
        }

        let required = engine.subscribe(OutputSet::all(), rate).map_err(|e| {
            log_error!("setup: subscription returned {}", e.code);
            SetupError::Subscribe(e)
        })?;
        log_info!("setup: subscribed at {} Hz, {} physical inputs required", rate.hz(), required.len());

        Ok(Self {
            sensor,
            engine,
            config,
            required,
            planned_call: None,
            stats: CycleStats::default(),
        })
    }

    /// Run one duty cycle at time `now`
    pub fn run_cycle(&mut self, now: Timestamp) -> Result<CycleOutcome, CycleError> {
        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        self.planned_call = None;
        let result = self.cycle(now);
        let stats = &mut self.stats;
        match &result {
            Ok(CycleOutcome::Skipped { .. }) => stats.skipped = stats.skipped.wrapping_add(1),
            Ok(CycleOutcome::NotReady { .. }) => stats.not_ready = stats.not_ready.wrapping_add(1),
            Ok(CycleOutcome::Produced { .. }) => stats.produced = stats.produced.wrapping_add(1),
            Ok(CycleOutcome::NothingProduced { .. }) => {}
            Err(_) => stats.failed = stats.failed.wrapping_add(1),
        }
        result
    }

    fn cycle(&mut self, now: Timestamp) -> Result<CycleOutcome, CycleError> {
        let plan = self.engine.plan_next(now).map_err(|e| {
            log_error!("cycle: plan_next returned {}", e.code);
            CycleError::Engine(e)
        })?;
        let next_call = plan.next_call;
        self.planned_call = Some(next_call);

        if !plan.trigger_measurement {
            log_debug!("cycle: no measurement required");
            return Ok(CycleOutcome::Skipped { next_call });
        }

        self.configure(&plan)?;

        let settings = self.config.acquire_settings();
        let sample = match acquire(&mut self.sensor, now, &settings) {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                log_warn!("cycle: no new data after measurement");
                return Ok(CycleOutcome::NotReady { next_call });
            }
            Err(e) => {
                log_error!("cycle: acquisition failed: {}", e);
                return Err(CycleError::Bus(e));
            }
        };
        log_sample(&sample);

        let inputs = build_inputs(&plan, &sample, self.config.heat_source_offset);
        if inputs.is_empty() {
            log_debug!("cycle: no inputs for processing");
            return Ok(CycleOutcome::NothingProduced { next_call });
        }

        let outputs = self.engine.process(&inputs).map_err(|e| {
            log_error!("cycle: process returned {}", e.code);
            CycleError::Engine(e)
        })?;

        if outputs.is_empty() {
            log_debug!("cycle: process returned 0 outputs");
            return Ok(CycleOutcome::NothingProduced { next_call });
        }

        for output in outputs.iter() {
            log_info!("{}", output);
        }

        Ok(CycleOutcome::Produced { next_call, outputs })
    }

    /// Apply the plan's acquisition and heater configuration
    ///
    /// Both are derived from the device's current configuration first, so a
    /// failed write leaves the previous one authoritative.
    fn configure(&mut self, plan: &AcquisitionPlan) -> Result<(), CycleError> {
        let config = plan.sensor_config(&self.sensor.config());
        let heater = plan.heater_config(&self.sensor.heater_config());

        log_debug!(
            "configure: os_t = {:?}, os_p = {:?}, os_h = {:?}, heater = {} ({} °C, {} ms)",
            config.os_temperature,
            config.os_pressure,
            config.os_humidity,
            heater.enabled,
            heater.target_celsius,
            heater.duration_ms
        );

        self.sensor.set_config(&config).map_err(|e| {
            log_error!("configure: sensor config write failed: {}", e);
            CycleError::Configure(e)
        })?;
        self.sensor.set_heater_config(&heater).map_err(|e| {
            log_error!("configure: heater config write failed: {}", e);
            CycleError::Configure(e)
        })
    }

    /// Physical channels the library asked for at subscription
    pub fn required_inputs(&self) -> ChannelSet {
        self.required
    }

    /// `next_call` of the last cycle's plan, `None` if `plan_next` failed
    ///
    /// Set as soon as the plan is known, so it survives a configuration,
    /// acquisition or processing error in the same cycle.
    pub fn planned_call(&self) -> Option<Timestamp> {
        self.planned_call
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Update the heat-source offset used from the next cycle on
    pub fn set_heat_source_offset(&mut self, offset: f32) {
        self.config.heat_source_offset = offset;
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Engine access for the persistence manager
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Take the sensor and engine back
    pub fn into_parts(self) -> (S, E) {
        (self.sensor, self.engine)
    }
}

/// Build the fusion batch from the channels the plan processes
///
/// Channels the plan wants but the sample lacks are left out. Temperature
/// brings the heat-source offset along with it.
pub fn build_inputs(plan: &AcquisitionPlan, sample: &PhysicalSample, heat_source_offset: f32) -> FusionInputs {
    let mut inputs = FusionInputs::new();
    let ts = sample.timestamp;
    // capacity is checked at compile time above
    let mut push = |channel, signal| {
        let _ = inputs.push(FusionInput::new(channel, signal, ts));
    };

    for channel in plan.process.iter() {
        let Some(signal) = sample.get(channel) else {
            continue;
        };
        match channel {
            Channel::Temperature => {
                push(InputChannel::Temperature, signal);
                push(InputChannel::HeatSource, heat_source_offset);
            }
            Channel::Humidity => push(InputChannel::Humidity, signal),
            Channel::Pressure => push(InputChannel::Pressure, signal),
            Channel::GasResistance => push(InputChannel::GasResistance, signal),
        }
    }

    inputs
}

fn log_sample(sample: &PhysicalSample) {
    log_debug!(
        "sample: T: {:.2} C H: {:.2} % P: {:.2} hPa G: {:.2} Ohm",
        sample.temperature.unwrap_or(f32::NAN),
        sample.humidity.unwrap_or(f32::NAN),
        sample.pressure_hpa().unwrap_or(f32::NAN),
        sample.gas_resistance.unwrap_or(f32::NAN)
    );
}
