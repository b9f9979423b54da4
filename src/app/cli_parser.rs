use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub fn setup_clap() -> Command {
    Command::new("dnsburst")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .long_about(
            "Send DNS requests as fast as possible to a given server and display the rate, \
             error count, and latency envelope.",
        )
        .arg(
            Arg::new("domains")
                .value_name("DOMAIN")
                .num_args(1..)
                .required_unless_present("data-file")
                .help("Domains to query in round-robin, record type A")
                .long_help(
                    "Domains are used as given; names intended as fully qualified must carry \
                     their trailing dot, e.g., www.example.com.",
                ),
        )
        .arg(
            Arg::new("resolver")
                .short('r')
                .long("resolver")
                .value_name("IP ADDR[:PORT]")
                .default_value("127.0.0.1:53")
                .help("Resolver to test against"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("NUMBER")
                .default_value("50")
                .value_parser(value_parser!(usize))
                .help("Sets the number of concurrent workers"),
        )
        .arg(
            Arg::new("display-interval")
                .short('d')
                .long("display-interval")
                .value_name("DURATION")
                .default_value("1s")
                .value_parser(humantime::parse_duration)
                .help("Sets the update interval of the statistics display"),
        )
        .arg(
            Arg::new("iterative")
                .short('i')
                .long("iterative")
                .action(ArgAction::SetTrue)
                .help("Sends iterative instead of recursive queries, to stress authoritative nameservers"),
        )
        .arg(
            Arg::new("random-ids")
                .long("random-ids")
                .action(ArgAction::SetTrue)
                .help("Uses a fresh random request identifier for every query"),
        )
        .arg(
            Arg::new("flood")
                .short('f')
                .long("flood")
                .action(ArgAction::SetTrue)
                .help("Does not wait for an answer before sending the next query"),
        )
        .arg(
            Arg::new("data-file")
                .long("data-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Reads queries from FILE, one '<domain> <record type>' per line"),
        )
        // This is a special option that is not reflected in AppConfig, but is checked during
        // setup in `dnsburst.rs`.
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disables colorful output"),
        )
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .help("Sets the level of verbosity"),
        )
}
