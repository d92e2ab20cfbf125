use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("nymph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("nymph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").global(true))
        .arg(arg!(-v --"verbose" "Show debug logging").global(true))
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Order table describing which orders to crawl")
                .default_value("urlinfo.json"),
        )
        .arg(
            arg!(--"state-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory holding the queue.json and queue_master.json snapshots")
                .default_value("."),
        )
        .arg(
            arg!(--"data-root" <PATH>)
                .required(false)
                .global(true)
                .help("Directory that order image directories are created under")
                .default_value("data"),
        )
        .arg(
            arg!(--"base-url" <URL>)
                .required(false)
                .global(true)
                .help("Root of the hatch forum")
                .value_parser(clap::value_parser!(Url))
                .default_value("http://www.troutnut.com"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .global(true)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("30"),
        )
        .subcommand_required(false)
        .subcommand(command!("orders").about("List the rows of the order table"))
        .subcommand(
            command!("discover")
                .about(
                    "Walk every order's listing pages and queue the specimen pages found. \
                Checkpoints the queue into both snapshot slots when done.",
                )
                .arg(
                    arg!(--"append")
                        .required(false)
                        .help("Start from the current snapshot instead of an empty queue")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"page-delay" <SECONDS>)
                        .required(false)
                        .help("Pause between listing pages")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2"),
                ),
        )
        .subcommand(
            command!("harvest")
                .about("Drain the queue, saving every specimen image and its metadata line")
                .arg(
                    arg!(-d --"delay" <SECONDS>)
                        .required(false)
                        .help("Pause between specimen pages")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"on-failure" <POLICY>)
                        .required(false)
                        .help("What to do with a specimen page that cannot be harvested")
                        .value_parser(["drop", "requeue", "quarantine"])
                        .default_value("quarantine"),
                ),
        )
        .subcommand(
            command!("repopulate")
                .about("Rediscover a single order on top of the current snapshot")
                .arg(
                    arg!(-r --"row" <N>)
                        .required(false)
                        .help("Order table row to rediscover (prompted for when omitted)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"page-delay" <SECONDS>)
                        .required(false)
                        .help("Pause between listing pages")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2"),
                ),
        )
        .subcommand(
            command!("queue")
                .about("Inspect and manage the queue snapshots")
                .subcommand_required(true)
                .subcommand(command!("status").about("Show both snapshot slots"))
                .subcommand(
                    command!("checkpoint").about("Copy the current snapshot into the master slot"),
                )
                .subcommand(
                    command!("restore-master")
                        .about("Overwrite the current snapshot with the master slot"),
                ),
        )
}
