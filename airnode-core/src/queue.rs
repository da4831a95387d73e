//! Bounded Consumer Queues
//!
//! ## Overview
//!
//! Each consumer of the distribution pipeline owns one bounded FIFO of
//! [`PhysicalSample`]s. Enqueue never blocks: a full queue rejects the
//! sample and counts a drop. This module provides the `no_std` variant on
//! top of [`heapless::spsc::Queue`]; the std runtime uses a tokio channel
//! with a timed receive instead.
//!
//! ```text
//! Distributor (producer)              Consumer task
//!      ↓                                   ↑
//!   try_enqueue ──→ [ s0 | s1 | .. ] ──→ dequeue
//!      ↓ full
//!   dropped += 1
//! ```
//!
//! ## Capacity
//!
//! `heapless::spsc::Queue<T, N>` keeps one slot free, so `SampleQueue<N>`
//! holds `N - 1` samples. [`ConsumerQueue`] is sized for
//! [`DEFAULT_CONSUMER_QUEUE_CAPACITY`] usable slots.
//!
//! ## Example
//!
//! ```rust
//! use airnode_core::queue::SampleQueue;
//! use airnode_core::sample::PhysicalSample;
//! use airnode_core::traits::SampleSink;
//!
//! let mut queue = SampleQueue::<3>::new();
//! let (mut producer, mut consumer) = queue.split();
//!
//! producer.try_enqueue(PhysicalSample::new(1)).unwrap();
//! producer.try_enqueue(PhysicalSample::new(2)).unwrap();
//! assert!(producer.try_enqueue(PhysicalSample::new(3)).is_err());
//!
//! assert_eq!(consumer.dequeue().map(|s| s.timestamp), Some(1));
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use crate::constants::buffers::DEFAULT_CONSUMER_QUEUE_CAPACITY;
use crate::sample::PhysicalSample;
use crate::traits::{QueueFull, SampleSink};

/// Queue with [`DEFAULT_CONSUMER_QUEUE_CAPACITY`] usable slots
pub type ConsumerQueue = SampleQueue<{ DEFAULT_CONSUMER_QUEUE_CAPACITY + 1 }>;

/// Queue health counters
///
/// Atomic so the producer and consumer halves can both update them.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Samples accepted
    pub enqueued: AtomicU32,
    /// Samples taken out
    pub dequeued: AtomicU32,
    /// Samples rejected because the queue was full
    pub dropped: AtomicU32,
    /// Maximum depth seen
    pub max_depth: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            enqueued: AtomicU32::new(0),
            dequeued: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_depth: AtomicU32::new(0),
        }
    }

    fn update_max_depth(&self, current: u32) {
        self.max_depth.fetch_max(current, Ordering::Relaxed);
    }

    /// Plain-value copy of the counters
    pub fn snapshot(&self) -> QueueCounters {
        QueueCounters {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

/// Non-atomic copy of [`QueueStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounters {
    pub enqueued: u32,
    pub dequeued: u32,
    pub dropped: u32,
    pub max_depth: u32,
}

/// Bounded FIFO of samples, `N - 1` usable slots
pub struct SampleQueue<const N: usize> {
    inner: Queue<PhysicalSample, N>,
    stats: QueueStats,
}

impl<const N: usize> SampleQueue<N> {
    pub const fn new() -> Self {
        Self { inner: Queue::new(), stats: QueueStats::new() }
    }

    /// Usable slots
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Oldest sample, if any
    pub fn dequeue(&mut self) -> Option<PhysicalSample> {
        let sample = self.inner.dequeue();
        if sample.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        sample
    }

    /// Drain everything queued
    pub fn drain(&mut self) -> impl Iterator<Item = PhysicalSample> + '_ {
        core::iter::from_fn(move || self.dequeue())
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Split into producer and consumer halves sharing the counters
    pub fn split(&mut self) -> (SampleProducer<'_, N>, SampleConsumer<'_, N>) {
        let stats = &self.stats;
        let (producer, consumer) = self.inner.split();
        (
            SampleProducer { inner: producer, stats },
            SampleConsumer { inner: consumer, stats },
        )
    }
}

impl<const N: usize> Default for SampleQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleSink for SampleQueue<N> {
    fn try_enqueue(&mut self, sample: PhysicalSample) -> Result<(), QueueFull> {
        match self.inner.enqueue(sample) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                self.stats.update_max_depth(self.inner.len() as u32);
                Ok(())
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueFull)
            }
        }
    }
}

/// Producer half, handed to the distributor
pub struct SampleProducer<'a, const N: usize> {
    inner: Producer<'a, PhysicalSample, N>,
    stats: &'a QueueStats,
}

impl<const N: usize> SampleSink for SampleProducer<'_, N> {
    fn try_enqueue(&mut self, sample: PhysicalSample) -> Result<(), QueueFull> {
        match self.inner.enqueue(sample) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                self.stats.update_max_depth(self.inner.len() as u32);
                Ok(())
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueFull)
            }
        }
    }
}

/// Consumer half, drained by the consumer task
pub struct SampleConsumer<'a, const N: usize> {
    inner: Consumer<'a, PhysicalSample, N>,
    stats: &'a QueueStats,
}

impl<const N: usize> SampleConsumer<'_, N> {
    /// Oldest sample, if any
    pub fn dequeue(&mut self) -> Option<PhysicalSample> {
        let sample = self.inner.dequeue();
        if sample.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        sample
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}
