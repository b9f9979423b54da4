// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use crate::query::{Query, QuerySet};
use crate::stats::{Aggregator, ReportingMode};
use crate::target::ResolverTarget;
use crate::worker::{Worker, WorkerOpts};
use crate::{Error, Result};

/// Ceiling for in-flight fire-and-forget exchanges, shared by all workers.
/// Flooding stays fire-and-forget below this many open sockets; above it,
/// workers wait for a slot before dispatching the next attempt.
const MAX_FLOOD_IN_FLIGHT: usize = 1024;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub target: ResolverTarget,
    pub concurrency: usize,
    pub display_interval: Duration,
    pub iterative: bool,
    pub random_ids: bool,
    pub flood: bool,
}

/// Wires the workers to the aggregator: partitions the query set, spawns
/// one task per partition, and hands the receiving end of the statistics
/// channel to the aggregator.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    partitions: Vec<Vec<Query>>,
}

impl Engine {
    /// Plans the run. The worker count is clamped to the query count so no
    /// worker ever starts with an empty partition.
    pub fn new(config: EngineConfig, queries: QuerySet) -> Result<Engine> {
        if queries.is_empty() {
            return Err(Error::InternalError {
                msg: "query set is empty",
            });
        }

        let worker_count = effective_concurrency(config.concurrency, queries.len());
        if worker_count < config.concurrency {
            warn!(
                "Only {} queries for {} workers, running {} workers instead",
                queries.len(),
                config.concurrency,
                worker_count
            );
        }
        let partitions = queries.partition(worker_count);

        Ok(Engine { config, partitions })
    }

    pub fn worker_count(&self) -> usize {
        self.partitions.len()
    }

    /// Spawns the workers and runs the aggregator on the calling task.
    ///
    /// Returns only once every worker is gone, which does not happen in
    /// normal operation; the process is expected to be killed from the
    /// outside.
    pub async fn run(self) {
        let Engine { config, partitions } = self;

        let (sender, receiver) = mpsc::channel(partitions.len());
        let flood_slots = Arc::new(Semaphore::new(MAX_FLOOD_IN_FLIGHT));
        let opts = WorkerOpts {
            iterative: config.iterative,
            random_ids: config.random_ids,
            flood: config.flood,
        };

        for (id, queries) in partitions.into_iter().enumerate() {
            let worker = Worker::new(
                id,
                queries,
                config.target,
                opts,
                sender.clone(),
                Arc::clone(&flood_slots),
            );
            tokio::spawn(worker.run());
        }
        drop(sender);
        debug!("Spawned all workers");

        let mode = if config.flood {
            ReportingMode::Silent
        } else {
            ReportingMode::Reporting
        };
        Aggregator::new(receiver, config.display_interval, mode).run().await;
    }
}

fn effective_concurrency(requested: usize, queries: usize) -> usize {
    requested.min(queries).max(1)
}
