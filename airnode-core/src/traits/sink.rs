//! Consumer Queue Endpoints
//!
//! The distribution pipeline only ever *tries* to enqueue. A full queue is a
//! per-consumer drop, never a stall of the producer.

use thiserror_no_std::Error;

use crate::sample::PhysicalSample;

/// The consumer queue had no free slot
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Consumer queue full")]
pub struct QueueFull;

/// Producer side of one consumer's bounded FIFO
pub trait SampleSink {
    /// Enqueue without blocking
    fn try_enqueue(&mut self, sample: PhysicalSample) -> Result<(), QueueFull>;
}

impl<T: SampleSink + ?Sized> SampleSink for &mut T {
    fn try_enqueue(&mut self, sample: PhysicalSample) -> Result<(), QueueFull> {
        (**self).try_enqueue(sample)
    }
}
