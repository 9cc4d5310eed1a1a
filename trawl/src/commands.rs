use crate::CLAP_STYLING;
use clap::{ArgAction, arg};
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("trawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trawl")
        .about("Crawl a single origin breadth-first and map how its pages link together")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(
            arg!(<URL>)
                .required(true)
                .help("Seed URL; only pages on the same host and port are followed"),
        )
        .arg(
            arg!(-d --"max-depth" <N>)
                .required(false)
                .help("Maximum link distance from the seed to fetch")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            arg!(-w --"workers" <N>)
                .required(false)
                .help("Maximum number of concurrent requests")
                .value_parser(clap::value_parser!(usize))
                .default_value("20"),
        )
        .arg(
            arg!(-t --"timeout" <SECS>)
                .required(false)
                .help("Per-request timeout in seconds")
                .value_parser(clap::value_parser!(f64))
                .default_value("5"),
        )
        .arg(
            arg!(-o --"output" <DIR>)
                .required(false)
                .help("Directory for discovered.json, graph.json and graph.dot")
                .default_value("."),
        )
        .arg(
            arg!(--"render")
                .required(false)
                .help("Render graph.png with Graphviz 'dot' after the crawl"),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .help("Also archive the run as a session in this SQLite database"),
        )
        .arg(
            arg!(--"insecure")
                .required(false)
                .help("Accept invalid TLS certificates"),
        )
        .arg(
            arg!(--"user-agent" <UA>)
                .required(false)
                .help("User-Agent header to send"),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count),
        )
        .arg(
            arg!(--"log-file" <PATH>)
                .required(false)
                .help("Write logs to this file instead of stderr")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}
