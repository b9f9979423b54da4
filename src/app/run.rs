use crate::app::console::{Console, Fmt};
use crate::app::{AppConfig, ExitStatus};
use crate::engine::{Engine, EngineConfig};
use crate::query::QuerySet;
use crate::target::ResolverTarget;
use crate::Result;

/// Runs the load generator until the process is killed from the outside.
///
/// All user-facing error reporting happens here; the returned status is
/// what the process exits with.
pub async fn run(config: &AppConfig, console: &Console) -> ExitStatus {
    let target: ResolverTarget = match config.resolver.parse() {
        Ok(target) => target,
        Err(error) => {
            console.error(format!("Unable to parse the resolver address ({})", error));
            return ExitStatus::ConfigParsingFailed;
        }
    };

    let queries = match load_queries(config) {
        Ok(queries) => queries,
        Err(error) => {
            console.error(format!("Unable to load queries ({})", error));
            return ExitStatus::ConfigParsingFailed;
        }
    };

    if queries.is_empty() {
        console.error("No domains to query. Pass domains as arguments or use --data-file.");
        return ExitStatus::CliParsingFailed;
    }

    let query_count = queries.len();
    let engine = match Engine::new(engine_config(config, target), queries) {
        Ok(engine) => engine,
        Err(error) => {
            console.error(format!("Unable to set up the engine ({})", error));
            return ExitStatus::UnrecoverableError;
        }
    };

    console.caption("dnsburst -- DNS load generator");
    console.info(format!(
        "{}: target={}, workers={}, display interval={}{}{}{}",
        Fmt::emph("Options"),
        target,
        engine.worker_count(),
        humantime::format_duration(config.display_interval),
        if config.iterative { ", iterative queries" } else { "" },
        if config.random_ids { ", random ids" } else { "" },
        if config.flood { ", flood" } else { "" },
    ));
    console.info(format!(
        "Cycling {} queries across {} workers.",
        query_count,
        engine.worker_count()
    ));
    if config.flood {
        console.attention("Flooding mode, responses are not awaited and nothing will be printed.");
    }

    engine.run().await;
    ExitStatus::Ok
}

fn load_queries(config: &AppConfig) -> Result<QuerySet> {
    if let Some(path) = &config.data_file {
        QuerySet::from_file(path)
    } else {
        QuerySet::from_domains(&config.domains)
    }
}

fn engine_config(config: &AppConfig, target: ResolverTarget) -> EngineConfig {
    EngineConfig {
        target,
        concurrency: config.concurrency,
        display_interval: config.display_interval,
        iterative: config.iterative,
        random_ids: config.random_ids,
        flood: config.flood,
    }
}
