// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

use crate::output::INFO_PREFIX;

/// Batched counters one worker reports for one window of attempts.
///
/// Produced once per reporting window and consumed exactly once by the
/// aggregator. `errors` never exceeds `sent`; `max_elapsed` is a running
/// maximum over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsMessage {
    pub sent: usize,
    pub errors: usize,
    pub elapsed: Duration,
    pub max_elapsed: Duration,
}

/// Counters the aggregator accumulates between two display ticks. Owned
/// exclusively by the aggregator, never shared.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateWindow {
    sent: usize,
    errors: usize,
    elapsed: Duration,
    max_elapsed: Duration,
}

impl AggregateWindow {
    pub fn fold(&mut self, message: &StatsMessage) {
        self.sent += message.sent;
        self.errors += message.errors;
        self.elapsed += message.elapsed;
        self.max_elapsed = self.max_elapsed.max(message.max_elapsed);
    }

    pub fn reset(&mut self) {
        *self = AggregateWindow::default();
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    pub fn summarize(&self, interval: Duration) -> IntervalSummary {
        IntervalSummary {
            window: *self,
            interval,
        }
    }
}

/// One display line worth of derived numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSummary {
    window: AggregateWindow,
    interval: Duration,
}

impl IntervalSummary {
    pub fn rate(&self) -> f64 {
        if self.interval.is_zero() {
            return 0.0;
        }
        self.window.sent as f64 / self.interval.as_secs_f64()
    }

    pub fn average_latency(&self) -> Option<Duration> {
        if self.window.sent == 0 {
            return None;
        }
        Some(self.window.elapsed / self.window.sent as u32)
    }
}

impl fmt::Display for IntervalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.average_latency() {
            Some(average) => write!(
                f,
                "{:.0} req/s, {} errors, average latency {:.1} ms, max {:.1} ms",
                self.rate(),
                self.window.errors,
                millis(average),
                millis(self.window.max_elapsed),
            ),
            None => write!(f, "0 req/s, no requests completed"),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingMode {
    /// Drain the channel and print the accumulated window on every display
    /// interval.
    Reporting,
    /// Flood mode: drain the channel only, so senders never back up on a
    /// full channel.
    Silent,
}

/// The single consumer of all worker statistics.
///
/// The mode is fixed at startup; there is no runtime transition between
/// the two.
#[derive(Debug)]
pub struct Aggregator {
    receiver: mpsc::Receiver<StatsMessage>,
    interval: Duration,
    mode: ReportingMode,
}

impl Aggregator {
    pub fn new(receiver: mpsc::Receiver<StatsMessage>, interval: Duration, mode: ReportingMode) -> Aggregator {
        Aggregator {
            receiver,
            interval,
            mode,
        }
    }

    /// Runs until every sender is gone, which in normal operation means
    /// forever.
    pub async fn run(self) {
        match self.mode {
            ReportingMode::Reporting => self.report().await,
            ReportingMode::Silent => self.drain().await,
        }
    }

    async fn drain(mut self) {
        while self.receiver.recv().await.is_some() {}
    }

    async fn report(mut self) {
        let mut window = AggregateWindow::default();
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    println!("{} {}", INFO_PREFIX, window.summarize(self.interval));
                    window.reset();
                }
                message = self.receiver.recv() => match message {
                    Some(message) => window.fold(&message),
                    None => break,
                },
            }
        }
    }
}
