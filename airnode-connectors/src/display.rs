//! Status display consumer
//!
//! Renders the latest sample and the wall-clock date/time as five text
//! lines. Refresh is expensive on e-paper, so the screen is redrawn only
//! when a new sample arrives or the displayed minute changes:
//!
//! ```text
//!   21.5 °C
//!   40.0 %
//! 1013.2 hPa
//! Mon, 19 Oct 2026
//! 14:07
//! ```

use std::time::Duration;

use airnode_core::sample::PhysicalSample;
use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::queue::{QueueReceiver, Received};
use crate::ConnectorError;

/// Placeholder for a channel or clock that has no value yet
const MISSING: &str = "--";

/// Text-mode output device
pub trait TextDisplay: Send {
    fn draw(&mut self, screen: &Screen) -> Result<(), ConnectorError>;
}

/// Calendar time source; `None` until the clock has been set
pub trait WallClock: Send {
    fn now(&self) -> Option<NaiveDateTime>;
}

/// Local time from the host clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Option<NaiveDateTime> {
        Some(chrono::Local::now().naive_local())
    }
}

/// One rendered frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
    pub date: String,
    pub time: String,
}

impl Screen {
    pub fn render(sample: Option<&PhysicalSample>, now: Option<NaiveDateTime>) -> Self {
        let field = |value: Option<f32>, unit: &str| match value {
            Some(v) => format!("{v:6.1} {unit}"),
            None => format!("{MISSING:>6} {unit}"),
        };

        Self {
            temperature: field(sample.and_then(|s| s.temperature), "°C"),
            humidity: field(sample.and_then(|s| s.humidity), "%"),
            pressure: field(sample.and_then(|s| s.pressure_hpa()), "hPa"),
            date: now.map_or_else(|| MISSING.into(), |t| t.format("%a, %-d %b %Y").to_string()),
            time: now.map_or_else(|| MISSING.into(), |t| t.format("%_H:%M").to_string()),
        }
    }

    pub fn lines(&self) -> [&str; 5] {
        [&self.temperature, &self.humidity, &self.pressure, &self.date, &self.time]
    }
}

type MinuteKey = (NaiveDate, u32, u32);

fn minute_of(t: NaiveDateTime) -> MinuteKey {
    (t.date(), t.hour(), t.minute())
}

pub struct DisplayConsumer<D, C> {
    display: D,
    clock: C,
    queue: QueueReceiver,
    wait: Duration,
    latest: Option<PhysicalSample>,
    shown_minute: Option<MinuteKey>,
    redraws: u64,
}

impl<D: TextDisplay, C: WallClock> DisplayConsumer<D, C> {
    pub fn new(display: D, clock: C, queue: QueueReceiver, wait: Duration) -> Self {
        Self {
            display,
            clock,
            queue,
            wait,
            latest: None,
            shown_minute: None,
            redraws: 0,
        }
    }

    /// Handle one receive; `false` once the queue is closed
    ///
    /// The clock is read after the wait, so a minute that rolls over while
    /// waiting is drawn on this step.
    pub async fn step(&mut self) -> bool {
        let received = self.queue.recv_timeout(self.wait).await;
        let now = self.clock.now();
        match received {
            Received::Sample(sample) => {
                self.latest = Some(sample);
                self.redraw(now);
            }
            Received::TimedOut => {
                let minute = now.map(minute_of);
                if minute.is_some() && minute != self.shown_minute {
                    self.redraw(now);
                }
            }
            Received::Closed => return false,
        }
        true
    }

    pub async fn run(mut self) {
        while self.step().await {}
        log::info!("display: queue closed after {} redraws", self.redraws);
    }

    fn redraw(&mut self, now: Option<NaiveDateTime>) {
        let screen = Screen::render(self.latest.as_ref(), now);
        match self.display.draw(&screen) {
            Ok(()) => {
                self.shown_minute = now.map(minute_of);
                self.redraws += 1;
            }
            Err(e) => log::warn!("display: draw failed: {}", e),
        }
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}
