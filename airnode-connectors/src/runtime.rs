//! Task runtime
//!
//! Wires the core components into tasks:
//!
//! - **fusion**: blocking thread owning the controller and the persistence
//!   manager. Setup or restore failure stops the task.
//! - **sampling**: blocking thread owning the periodic sampler and the
//!   distributor with one sender per consumer.
//! - **telemetry** / **display**: async tasks, each draining its own queue.
//!
//! Blocking loops sleep in short naps and check the [`Shutdown`] flag
//! between them. When the sampling loop stops it drops its senders and the
//! consumers finish once their queues are drained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airnode_core::constants::MAX_CONSUMERS;
use airnode_core::distribution::{DistributionStats, Distributor};
use airnode_core::fusion::FusionState;
use airnode_core::persistence::PersistenceManager;
use airnode_core::scheduler::{Controller, CycleOutcome, CycleStats, PeriodicSampler};
use airnode_core::time::{millis_to_ns, until, Timestamp};
use airnode_core::traits::{DurableStorage, FusionEngine, SensorDevice, TimeSource};
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::display::{DisplayConsumer, TextDisplay, WallClock};
use crate::queue::{consumer_queue, QueueSender};
use crate::telemetry::{PublishStats, Publisher, TelemetryConsumer};
use crate::ConnectorError;

/// Longest single sleep of a blocking loop
const MAX_NAP: Duration = Duration::from_millis(100);

/// Cooperative stop flag shared by every task
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Sleep until `deadline` or until shutdown
fn nap_until<T: TimeSource>(clock: &T, deadline: Timestamp, shutdown: &Shutdown) {
    while !shutdown.is_triggered() {
        let left = until(clock.now(), deadline);
        if left == 0 {
            return;
        }
        std::thread::sleep(Duration::from_nanos(left).min(MAX_NAP));
    }
}

/// Everything the fusion task owns
pub struct FusionParts<S, E, St> {
    pub sensor: S,
    pub engine: E,
    pub storage: St,
    /// Imported when storage holds no valid state
    pub default_state: FusionState,
}

/// Fusion loop: plan, acquire, process, snapshot, sleep until the next call
///
/// A failed cycle still waits for its plan's `next_call`; `fusion.retry_ms`
/// only applies when no plan was obtained.
pub fn run_fusion_loop<S, E, St, T>(
    parts: FusionParts<S, E, St>,
    config: &NodeConfig,
    clock: T,
    shutdown: Shutdown,
) -> Result<CycleStats, ConnectorError>
where
    S: SensorDevice,
    E: FusionEngine,
    St: DurableStorage,
    T: TimeSource,
{
    let mut controller = Controller::setup(
        parts.sensor,
        parts.engine,
        config.fusion.controller(),
        config.fusion.sample_rate,
    )?;

    let mut persistence = PersistenceManager::new(
        parts.storage,
        config.persistence.manager_config(),
        parts.default_state,
    );
    let source = persistence.restore(controller.engine_mut())?;
    log::info!("fusion: running, state from {:?}", source);

    let retry = millis_to_ns(config.fusion.retry_ms);
    while !shutdown.is_triggered() {
        let now = clock.now();
        let next_call = match controller.run_cycle(now) {
            Ok(outcome) => {
                if let CycleOutcome::Produced { outputs, .. } = &outcome {
                    log::debug!("fusion: {} outputs", outputs.len());
                }
                outcome.next_call()
            }
            Err(e) => {
                log::warn!("fusion: cycle failed: {}", e);
                controller.planned_call().unwrap_or_else(|| now.saturating_add(retry))
            }
        };

        if let Err(e) = persistence.tick(clock.now(), controller.engine_mut()) {
            log::warn!("fusion: snapshot failed: {}", e);
        }

        nap_until(&clock, next_call, &shutdown);
    }

    Ok(controller.stats())
}

/// Sampling loop: periodic acquisition fanned out to `consumers`
pub fn run_sampling_loop<S, T>(
    sensor: S,
    config: &NodeConfig,
    consumers: Vec<(&'static str, QueueSender)>,
    clock: T,
    shutdown: Shutdown,
) -> DistributionStats
where
    S: SensorDevice,
    T: TimeSource,
{
    let sampling = &config.sampling;
    let mut sampler = PeriodicSampler::new(sensor, sampling.sensor, sampling.heater, sampling.interval())
        .with_settings(sampling.acquire_settings());

    let mut distributor: Distributor<QueueSender, MAX_CONSUMERS> = Distributor::new();
    for (name, sender) in consumers {
        if distributor.add_consumer(name, sender).is_err() {
            log::warn!("sampling: no slot for consumer {}, ignored", name);
        }
    }

    while !shutdown.is_triggered() {
        match sampler.sample_if_due(clock.now()) {
            Ok(Some(sample)) => {
                distributor.publish(sample);
            }
            Ok(None) => {}
            Err(e) => log::warn!("sampling: {}", e),
        }
        nap_until(&clock, sampler.next_due(), &shutdown);
    }

    distributor.stats()
}

/// Handles of a spawned node
pub struct TaskHandles {
    pub fusion: Option<JoinHandle<()>>,
    pub sampling: JoinHandle<DistributionStats>,
    pub telemetry: Option<JoinHandle<PublishStats>>,
    pub display: Option<JoinHandle<()>>,
}

impl TaskHandles {
    /// Wait for every task; a panicked task is logged
    pub async fn join(self) {
        if let Some(fusion) = self.fusion {
            if let Err(e) = fusion.await {
                log::error!("fusion task panicked: {}", e);
            }
        }
        if let Err(e) = self.sampling.await {
            log::error!("sampling task panicked: {}", e);
        }
        if let Some(telemetry) = self.telemetry {
            if let Err(e) = telemetry.await {
                log::error!("telemetry task panicked: {}", e);
            }
        }
        if let Some(display) = self.display {
            if let Err(e) = display.await {
                log::error!("display task panicked: {}", e);
            }
        }
    }
}

/// Sensors, engine and consumer backends of one node
pub struct NodeParts<FS, E, St, PS, P, D, C> {
    pub fusion: Option<FusionParts<FS, E, St>>,
    pub sampling_sensor: PS,
    pub publisher: Option<P>,
    pub display: Option<(D, C)>,
}

/// Spawn every task of the node on the current tokio runtime
///
/// Sections disabled in `config` are not spawned even if their parts are
/// supplied.
pub fn spawn_node<FS, E, St, PS, P, D, C, T>(
    config: &NodeConfig,
    parts: NodeParts<FS, E, St, PS, P, D, C>,
    clock: T,
    shutdown: Shutdown,
) -> TaskHandles
where
    FS: SensorDevice + Send + 'static,
    E: FusionEngine + Send + 'static,
    St: DurableStorage + Send + 'static,
    PS: SensorDevice + Send + 'static,
    P: Publisher + 'static,
    D: TextDisplay + 'static,
    C: WallClock + 'static,
    T: TimeSource + Clone + Send + 'static,
{
    let wait = config.queues.wait();
    let mut senders = Vec::new();

    let telemetry = match parts.publisher {
        Some(publisher) if config.telemetry.enabled => {
            let (tx, rx) = consumer_queue(config.queues.capacity);
            senders.push(("telemetry", tx));
            let consumer = TelemetryConsumer::new(publisher, rx, &config.telemetry, wait);
            Some(tokio::spawn(consumer.run()))
        }
        _ => None,
    };

    let display = match parts.display {
        Some((device, wall_clock)) if config.display.enabled => {
            let (tx, rx) = consumer_queue(config.queues.capacity);
            senders.push(("display", tx));
            let consumer = DisplayConsumer::new(device, wall_clock, rx, wait);
            Some(tokio::spawn(consumer.run()))
        }
        _ => None,
    };

    let fusion = match parts.fusion {
        Some(fusion) if config.fusion.enabled => {
            let config = config.clone();
            let clock = clock.clone();
            let shutdown = shutdown.clone();
            Some(tokio::task::spawn_blocking(move || {
                match run_fusion_loop(fusion, &config, clock, shutdown) {
                    Ok(stats) => log::info!("fusion: stopped after {} cycles", stats.cycles),
                    Err(e) => log::error!("fusion: task stopped: {}", e),
                }
            }))
        }
        _ => None,
    };

    let sampling = {
        let config = config.clone();
        let sensor = parts.sampling_sensor;
        tokio::task::spawn_blocking(move || run_sampling_loop(sensor, &config, senders, clock, shutdown))
    };

    TaskHandles { fusion, sampling, telemetry, display }
}
