use colored::Colorize;
use commands::command_argument_builder;
use nymph::handlers::{self, GlobalArgs};
use nymph_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let globals = GlobalArgs::from_matches(&chosen_command);

    // Show banner unless --quiet flag is set
    if !globals.quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    handlers::init_tracing(globals.log_level());

    let result = match chosen_command.subcommand() {
        Some(("orders", _)) => handlers::handle_orders(&globals),
        Some(("discover", primary_command)) => {
            handlers::handle_discover(&globals, primary_command).await
        }
        Some(("harvest", primary_command)) => {
            handlers::handle_harvest(&globals, primary_command).await
        }
        Some(("repopulate", primary_command)) => {
            handlers::handle_repopulate(&globals, primary_command).await
        }
        Some(("queue", primary_command)) => match primary_command.subcommand() {
            Some(("status", _)) => handlers::handle_queue_status(&globals),
            Some(("checkpoint", _)) => handlers::handle_queue_checkpoint(&globals),
            Some(("restore-master", _)) => handlers::handle_queue_restore(&globals),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
