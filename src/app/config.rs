// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::convert::TryFrom;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::ArgMatches;

/// All runtime options, collected into one immutable value at startup. The
/// engine, workers, and aggregator only ever see this value; nothing reads
/// process-wide state after it has been constructed.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub resolver: String,
    pub concurrency: usize,
    pub display_interval: Duration,
    pub iterative: bool,
    pub random_ids: bool,
    pub flood: bool,
    pub data_file: Option<PathBuf>,
    pub domains: Vec<String>,
}

impl TryFrom<&ArgMatches> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: &ArgMatches) -> std::result::Result<Self, Self::Error> {
        let config = AppConfig {
            resolver: args
                .get_one::<String>("resolver")
                .cloned()
                .context("failed to read resolver")?, // Safe, because of clap's default value
            concurrency: args
                .get_one::<usize>("concurrency")
                .copied()
                .context("failed to read concurrency")?, // Safe, because of clap's default value
            display_interval: args
                .get_one::<Duration>("display-interval")
                .copied()
                .context("failed to read display-interval")?, // Safe, because of clap's default value
            iterative: args.get_flag("iterative"),
            random_ids: args.get_flag("random-ids"),
            flood: args.get_flag("flood"),
            data_file: args.get_one::<PathBuf>("data-file").cloned(),
            domains: args
                .get_many::<String>("domains")
                .map(|xs| xs.cloned().collect())
                .unwrap_or_default(),
        };

        Ok(config)
    }
}
