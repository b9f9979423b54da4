// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hickory_proto::op::Message;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

use crate::exchange;
use crate::query::Query;
use crate::stats::StatsMessage;
use crate::target::ResolverTarget;

/// Number of attempts between two statistics updates.
pub const REPORT_BATCH: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerOpts {
    /// Sends iterative instead of recursive queries.
    pub iterative: bool,
    /// Assigns a fresh random request identifier to every attempt.
    pub random_ids: bool,
    /// Dispatches exchanges without waiting for their responses.
    pub flood: bool,
}

/// Drives one partition of the query set, cycling it indefinitely, and
/// reports batched statistics on the shared channel.
pub struct Worker {
    id: usize,
    queries: Vec<Query>,
    target: SocketAddr,
    opts: WorkerOpts,
    sender: mpsc::Sender<StatsMessage>,
    flood_slots: Arc<Semaphore>,
}

impl Worker {
    pub fn new(
        id: usize,
        queries: Vec<Query>,
        target: ResolverTarget,
        opts: WorkerOpts,
        sender: mpsc::Sender<StatsMessage>,
        flood_slots: Arc<Semaphore>,
    ) -> Worker {
        Worker {
            id,
            queries,
            target: target.socket_addr(),
            opts,
            sender,
            flood_slots,
        }
    }

    /// Resolves the partition as fast as possible until the process dies.
    ///
    /// Every `REPORT_BATCH` attempts produce exactly one `StatsMessage`,
    /// even if every attempt failed. A failed exchange only increments the
    /// error counter of the current window; it never stops the loop. The
    /// send on the statistics channel blocks while the channel is full,
    /// which stalls this worker until the aggregator catches up.
    pub async fn run(self) {
        debug!("Starting worker #{}", self.id);

        if self.queries.is_empty() {
            debug!("Worker #{} has no queries, stopping", self.id);
            return;
        }

        let mut errors = 0usize;
        let mut elapsed = Duration::ZERO;
        let mut max_elapsed = Duration::ZERO;

        loop {
            for query in &self.queries {
                let mut message = exchange::build_message(query, !self.opts.iterative);

                for _ in 0..REPORT_BATCH {
                    if self.opts.random_ids {
                        exchange::randomize_id(&mut message);
                    }

                    if self.opts.flood {
                        self.dispatch(message.clone()).await;
                    } else {
                        let start = Instant::now();
                        let result = exchange::exchange(self.target, &message).await;
                        let spent = start.elapsed();
                        elapsed += spent;
                        max_elapsed = max_elapsed.max(spent);
                        if let Err(error) = result {
                            debug!("{} error: {} ({})", query.name(), error, self.target);
                            errors += 1;
                        }
                    }
                }

                let update = StatsMessage {
                    sent: REPORT_BATCH,
                    errors,
                    elapsed,
                    max_elapsed,
                };
                if self.sender.send(update).await.is_err() {
                    debug!("Worker #{} lost the aggregator, stopping", self.id);
                    return;
                }
                errors = 0;
                elapsed = Duration::ZERO;
                max_elapsed = Duration::ZERO;
            }
        }
    }

    /// Fires one exchange without waiting for its response. Whatever the
    /// exchange returns is dropped unseen. The permit bounds how many of
    /// these are in flight at once; the wait is for a permit only, never
    /// for a response.
    async fn dispatch(&self, message: Message) {
        let permit = match Arc::clone(&self.flood_slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        let target = self.target;
        tokio::spawn(async move {
            let _ = exchange::exchange(target, &message).await;
            drop(permit);
        });
    }
}

#[cfg(test)]
mod test {
    use hickory_proto::op::{Message, MessageType};
    use spectral::prelude::*;
    use tokio::net::UdpSocket;
    use tokio::time::timeout;

    use crate::query::QuerySet;

    use super::*;

    const RECV_TIMEOUT: Duration = Duration::from_secs(10);

    enum Responder {
        WellFormed,
        Garbage,
    }

    async fn spawn_responder(kind: Responder) -> ResolverTarget {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("failed to bind responder");
        let addr = socket.local_addr().expect("failed to read responder addr");

        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];
            loop {
                let (received, peer) = match socket.recv_from(&mut buffer).await {
                    Ok(x) => x,
                    Err(_) => break,
                };
                let bytes = match kind {
                    Responder::Garbage => b"not dns".to_vec(),
                    Responder::WellFormed => {
                        let mut message = match Message::from_vec(&buffer[..received]) {
                            Ok(message) => message,
                            Err(_) => continue,
                        };
                        message.set_message_type(MessageType::Response);
                        match message.to_vec() {
                            Ok(bytes) => bytes,
                            Err(_) => continue,
                        }
                    }
                };
                let _ = socket.send_to(&bytes, peer).await;
            }
        });

        ResolverTarget::from(addr)
    }

    fn partition() -> Vec<Query> {
        QuerySet::from_domains(["one.example.com.", "two.example.com."])
            .expect("failed to parse domains")
            .partition(1)
            .remove(0)
    }

    async fn recv(receiver: &mut mpsc::Receiver<StatsMessage>) -> StatsMessage {
        timeout(RECV_TIMEOUT, receiver.recv())
            .await
            .expect("timed out waiting for stats")
            .expect("stats channel closed")
    }

    #[tokio::test]
    async fn worker_reports_one_message_per_batch() {
        let target = spawn_responder(Responder::WellFormed).await;
        let (sender, mut receiver) = mpsc::channel(2);
        let worker = Worker::new(
            0,
            partition(),
            target,
            WorkerOpts::default(),
            sender,
            Arc::new(Semaphore::new(16)),
        );

        let handle = tokio::spawn(worker.run());
        let first = recv(&mut receiver).await;
        let second = recv(&mut receiver).await;
        handle.abort();

        assert_that(&first.sent).is_equal_to(REPORT_BATCH);
        assert_that(&first.errors).is_equal_to(0);
        assert_that(&(first.max_elapsed <= first.elapsed)).is_equal_to(true);
        assert_that(&second.sent).is_equal_to(REPORT_BATCH);
    }

    #[tokio::test]
    async fn worker_counts_malformed_responses_as_errors_and_keeps_going() {
        let target = spawn_responder(Responder::Garbage).await;
        let (sender, mut receiver) = mpsc::channel(2);
        let worker = Worker::new(
            0,
            partition(),
            target,
            WorkerOpts::default(),
            sender,
            Arc::new(Semaphore::new(16)),
        );

        let handle = tokio::spawn(worker.run());
        let first = recv(&mut receiver).await;
        let second = recv(&mut receiver).await;
        handle.abort();

        assert_that(&first.sent).is_equal_to(REPORT_BATCH);
        assert_that(&first.errors).is_equal_to(REPORT_BATCH);
        assert_that(&second.errors).is_equal_to(REPORT_BATCH);
    }

    #[tokio::test]
    async fn flooding_worker_reports_batches_without_latencies() {
        let target = spawn_responder(Responder::WellFormed).await;
        let (sender, mut receiver) = mpsc::channel(2);
        let opts = WorkerOpts {
            flood: true,
            ..Default::default()
        };
        let worker = Worker::new(0, partition(), target, opts, sender, Arc::new(Semaphore::new(16)));

        let handle = tokio::spawn(worker.run());
        let first = recv(&mut receiver).await;
        handle.abort();

        assert_that(&first.sent).is_equal_to(REPORT_BATCH);
        assert_that(&first.errors).is_equal_to(0);
        assert_that(&first.elapsed).is_equal_to(Duration::ZERO);
        assert_that(&first.max_elapsed).is_equal_to(Duration::ZERO);
    }

    #[tokio::test]
    async fn worker_with_an_empty_partition_stops() {
        let target = spawn_responder(Responder::WellFormed).await;
        let (sender, mut receiver) = mpsc::channel(2);
        let worker = Worker::new(
            0,
            Vec::new(),
            target,
            WorkerOpts::default(),
            sender,
            Arc::new(Semaphore::new(16)),
        );

        worker.run().await;

        assert_that(&receiver.try_recv().is_err()).is_equal_to(true);
    }
}
