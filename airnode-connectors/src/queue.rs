//! Hosted consumer queues
//!
//! Same contract as the core's `SampleQueue`: bounded FIFO, non-blocking
//! enqueue that drops on full. The receive side waits with a budget, so a
//! consumer task wakes up at least once per budget even without data.

use std::time::Duration;

use airnode_core::sample::PhysicalSample;
use airnode_core::traits::{QueueFull, SampleSink};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Bounded queue of `capacity` samples (at least one)
pub fn consumer_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer end, registered with the distributor
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<PhysicalSample>,
}

impl QueueSender {
    /// Receiver dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl SampleSink for QueueSender {
    fn try_enqueue(&mut self, sample: PhysicalSample) -> Result<(), QueueFull> {
        self.tx.try_send(sample).map_err(|e| {
            if let TrySendError::Closed(_) = e {
                log::debug!("queue: receiver gone, sample discarded");
            }
            QueueFull
        })
    }
}

/// What one timed receive produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Received {
    Sample(PhysicalSample),
    /// Budget elapsed with nothing queued
    TimedOut,
    /// Every sender dropped and the queue is drained
    Closed,
}

/// Consumer end
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<PhysicalSample>,
}

impl QueueReceiver {
    /// Wait at most `wait` for the next sample
    pub async fn recv_timeout(&mut self, wait: Duration) -> Received {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(sample)) => Received::Sample(sample),
            Ok(None) => Received::Closed,
            Err(_) => Received::TimedOut,
        }
    }

    /// Take a sample if one is queued
    pub fn try_recv(&mut self) -> Option<PhysicalSample> {
        self.rx.try_recv().ok()
    }
}
