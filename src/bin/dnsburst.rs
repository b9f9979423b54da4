use std::env;
use std::process;

use clap::ArgMatches;

use dnsburst::app::console::Console;
use dnsburst::app::logging::Logging;
use dnsburst::app::{self, cli_parser, AppConfig, ExitStatus};
use dnsburst::output;

#[tokio::main]
async fn main() {
    let args = cli_parser::setup_clap().get_matches();

    if args.get_flag("no-color") {
        output::no_color_mode();
    }

    let console = Console::new();

    if let Err(error) = start_logging(&args) {
        console.error(format!("Failed to start logging ({})", error));
        process::exit(ExitStatus::UnrecoverableError as i32);
    }

    let config = match AppConfig::try_from(&args) {
        Ok(config) => config,
        Err(error) => {
            console.error(format!("Failed to read configuration ({:#})", error));
            process::exit(ExitStatus::ConfigParsingFailed as i32);
        }
    };

    let status = app::run(&config, &console).await;
    process::exit(status as i32);
}

fn start_logging(args: &ArgMatches) -> anyhow::Result<()> {
    let color = !args.get_flag("no-color");
    Logging::new(args.get_count("v"), env::var_os("RUST_LOG"), color).start()
}
