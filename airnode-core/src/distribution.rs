//! Distribution Pipeline
//!
//! ## Overview
//!
//! One producer, several independent consumers, each with its own bounded
//! queue. Two rules:
//!
//! 1. **Change suppression**: a sample is forwarded only if at least one
//!    channel differs from the last forwarded sample. Comparison is exact
//!    `f32` equality, not tolerance-banded: `0.0` equals `-0.0`, and a `NaN`
//!    reading never equals anything, so it is always forwarded. A channel appearing or
//!    disappearing counts as a change. Timestamps and status flags are not
//!    compared.
//! 2. **Isolation**: enqueueing never blocks. A full queue drops that
//!    consumer's copy only; every other consumer still gets its own.
//!
//! ```text
//!                    ┌── changed? ── no ──→ Suppressed
//! sample ─→ ChangeGate
//!                    └── yes ─→ try_enqueue ─→ consumer 0 (full → dropped)
//!                              try_enqueue ─→ consumer 1
//!                              try_enqueue ─→ consumer N-1
//! ```
//!
//! The gate is updated once a sample is forwarded, even if every queue was
//! full: the gate tracks what was published, not what each consumer saw.
//!
//! ## Example
//!
//! ```rust
//! use airnode_core::distribution::{Distributor, Publication};
//! use airnode_core::queue::SampleQueue;
//! use airnode_core::sample::PhysicalSample;
//!
//! let mut telemetry = SampleQueue::<4>::new();
//! let mut display = SampleQueue::<4>::new();
//!
//! let mut distributor: Distributor<&mut SampleQueue<4>, 2> = Distributor::new();
//! distributor.add_consumer("telemetry", &mut telemetry).ok();
//! distributor.add_consumer("display", &mut display).ok();
//!
//! let a = PhysicalSample::new(0).with_temperature(21.0);
//! assert!(matches!(distributor.publish(a), Publication::Forwarded(_)));
//! assert_eq!(distributor.publish(a), Publication::Suppressed);
//! ```

use heapless::Vec;

use crate::sample::{Channel, PhysicalSample};
use crate::traits::SampleSink;

/// Value of each channel, `None` when absent
type Values = [Option<f32>; 4];

fn values(sample: &PhysicalSample) -> Values {
    Channel::ALL.map(|channel| sample.get(channel))
}

/// Last forwarded value per channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeGate {
    last: Option<Values>,
}

impl ChangeGate {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Whether `sample` differs from the last forwarded one
    ///
    /// Always true before anything was forwarded.
    pub fn differs(&self, sample: &PhysicalSample) -> bool {
        match &self.last {
            None => true,
            // Option<f32> compares with f32's `==`
            Some(last) => *last != values(sample),
        }
    }

    /// Remember `sample` as forwarded
    pub fn record(&mut self, sample: &PhysicalSample) {
        self.last = Some(values(sample));
    }

    /// `differs` then `record` when it does
    pub fn admit(&mut self, sample: &PhysicalSample) -> bool {
        if !self.differs(sample) {
            return false;
        }
        self.record(sample);
        true
    }

    /// Forget the last forwarded sample
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Index of a registered consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerId(pub usize);

/// Per-consumer delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub delivered: u32,
    pub dropped: u32,
}

/// Pipeline-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionStats {
    pub published: u32,
    pub forwarded: u32,
    pub suppressed: u32,
}

/// Fan-out result of one forwarded sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Consumers whose queue accepted the sample
    pub delivered: usize,
    /// Consumers whose queue was full
    pub dropped: usize,
}

/// Result of [`Distributor::publish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// Identical to the last forwarded sample, nothing enqueued
    Suppressed,
    /// Offered to every consumer
    Forwarded(DeliveryReport),
}

struct Consumer<S> {
    name: &'static str,
    sink: S,
    stats: ConsumerStats,
}

/// Change-suppressing fan-out to up to `N` consumers
pub struct Distributor<S, const N: usize> {
    consumers: Vec<Consumer<S>, N>,
    gate: ChangeGate,
    stats: DistributionStats,
}

impl<S: SampleSink, const N: usize> Distributor<S, N> {
    pub const fn new() -> Self {
        Self {
            consumers: Vec::new(),
            gate: ChangeGate::new(),
            stats: DistributionStats { published: 0, forwarded: 0, suppressed: 0 },
        }
    }

    /// Register a consumer queue
    ///
    /// Gives the sink back if all `N` slots are taken.
    pub fn add_consumer(&mut self, name: &'static str, sink: S) -> Result<ConsumerId, S> {
        let id = ConsumerId(self.consumers.len());
        self.consumers
            .push(Consumer { name, sink, stats: ConsumerStats::default() })
            .map_err(|consumer| consumer.sink)?;
        log_debug!("distribution: consumer {} registered as #{}", name, id.0);
        Ok(id)
    }

    /// Filter `sample` through the change gate and fan it out
    pub fn publish(&mut self, sample: PhysicalSample) -> Publication {
        self.stats.published = self.stats.published.wrapping_add(1);

        if !self.gate.admit(&sample) {
            self.stats.suppressed = self.stats.suppressed.wrapping_add(1);
            log_debug!("distribution: unchanged sample suppressed");
            return Publication::Suppressed;
        }
        self.stats.forwarded = self.stats.forwarded.wrapping_add(1);

        let mut report = DeliveryReport::default();
        for consumer in self.consumers.iter_mut() {
            match consumer.sink.try_enqueue(sample) {
                Ok(()) => {
                    consumer.stats.delivered = consumer.stats.delivered.wrapping_add(1);
                    report.delivered += 1;
                }
                Err(_) => {
                    consumer.stats.dropped = consumer.stats.dropped.wrapping_add(1);
                    report.dropped += 1;
                    log_warn!("distribution: {} queue full, update dropped", consumer.name);
                }
            }
        }

        Publication::Forwarded(report)
    }

    pub fn consumer_stats(&self, id: ConsumerId) -> Option<ConsumerStats> {
        self.consumers.get(id.0).map(|c| c.stats)
    }

    pub fn consumer_name(&self, id: ConsumerId) -> Option<&'static str> {
        self.consumers.get(id.0).map(|c| c.name)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn stats(&self) -> DistributionStats {
        self.stats
    }

    pub fn gate(&self) -> &ChangeGate {
        &self.gate
    }

    /// Access a registered sink
    pub fn sink_mut(&mut self, id: ConsumerId) -> Option<&mut S> {
        self.consumers.get_mut(id.0).map(|c| &mut c.sink)
    }
}

impl<S: SampleSink, const N: usize> Default for Distributor<S, N> {
    fn default() -> Self {
        Self::new()
    }
}
