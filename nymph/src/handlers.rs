use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nymph_core::discovery::{Discoverer, DiscoveryProgressCallback, OrderDiscovery};
use nymph_core::harvest::{HarvestOutcome, HarvestProgressCallback, Harvester};
use nymph_core::options::{DEFAULT_BASE_URL, FailurePolicy, TrawlOptions};
use nymph_core::{OrderTable, Slot, SlotStatus, SnapshotStore, TrawlError};
use nymph_scanner::Fetcher;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;

pub const DEFAULT_CONFIG: &str = "urlinfo.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: PathBuf,
    pub state_dir: PathBuf,
    pub data_root: PathBuf,
    pub base_url: String,
    pub timeout: u64,
    pub verbose: bool,
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let path_arg = |id: &str, default: &str| {
            resolve_path(
                matches
                    .get_one::<String>(id)
                    .map(String::as_str)
                    .unwrap_or(default),
            )
        };

        Self {
            config: path_arg("config", DEFAULT_CONFIG),
            state_dir: path_arg("state-dir", "."),
            data_root: path_arg("data-root", "data"),
            base_url: matches
                .get_one::<Url>("base-url")
                .map(|u| u.as_str().trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: matches
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            verbose: matches.get_flag("verbose"),
            quiet: matches.get_flag("quiet"),
        }
    }

    pub fn log_level(&self) -> Level {
        log_level(self.verbose, self.quiet)
    }

    pub fn options(&self) -> TrawlOptions {
        TrawlOptions {
            base_url: self.base_url.clone(),
            data_root: self.data_root.clone(),
            state_dir: self.state_dir.clone(),
            ..TrawlOptions::default()
        }
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.state_dir)
    }

    fn fetcher(&self) -> anyhow::Result<Fetcher> {
        Fetcher::with_timeout(self.timeout).context("Failed to build HTTP client")
    }
}

// Helper functions

/// Expand a leading `~` to the home directory.
pub fn resolve_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn log_level(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    }
}

pub fn init_tracing(level: Level) {
    // A subscriber may already be installed when handlers run under a test harness
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Parse an operator-typed order table row.
pub fn parse_row_index(input: &str, len: usize) -> Result<usize, String> {
    let trimmed = input.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| format!("'{}' is not a row number", trimmed))?;
    if index >= len {
        return Err(format!(
            "Row {} is out of range, the order table has {} rows",
            index, len
        ));
    }
    Ok(index)
}

pub fn delay_arg(matches: &ArgMatches, id: &str, default: Duration) -> Duration {
    matches
        .get_one::<u64>(id)
        .map(|secs| Duration::from_secs(*secs))
        .unwrap_or(default)
}

pub fn load_orders(path: &Path) -> anyhow::Result<OrderTable> {
    OrderTable::load(path)
        .with_context(|| format!("Failed to load order table {}", path.display()))
}

pub fn describe_slot(slot: Slot, status: Option<&SlotStatus>) -> String {
    match status {
        Some(status) => format!(
            "{:<8} {} URLs, revision {}, saved {}",
            slot.as_str(),
            status.len,
            status.revision,
            status.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => format!("{:<8} not written yet", slot.as_str()),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn discovery_callback(pb: &ProgressBar) -> DiscoveryProgressCallback {
    let pb = pb.clone();
    Arc::new(move |msg: String| pb.set_message(msg))
}

fn print_orders(orders: &OrderTable) {
    for (index, order) in orders.iter().enumerate() {
        println!(
            "  {} {} {} {}",
            format!("{:>3}", index).cyan(),
            order.order.bright_white(),
            format!("(#{})", order.tn_num).bright_black(),
            format!("→ {}", order.directory).blue()
        );
    }
}

fn print_discovery(summaries: &[OrderDiscovery]) {
    for summary in summaries {
        println!(
            "  {} {}: {} pages, {} new URLs",
            "•".green(),
            summary.order.bright_white(),
            summary.pages.to_string().cyan(),
            summary.added.to_string().cyan()
        );
    }
}

// Handler functions

pub fn handle_orders(globals: &GlobalArgs) -> anyhow::Result<()> {
    let orders = load_orders(&globals.config)?;
    print_divider();
    println!(
        "{}",
        format!("  ORDER TABLE ({})", globals.config.display())
            .bright_white()
            .bold()
    );
    print_divider();
    print_orders(&orders);
    Ok(())
}

pub async fn handle_discover(globals: &GlobalArgs, args: &ArgMatches) -> anyhow::Result<()> {
    let orders = load_orders(&globals.config)?;
    let store = globals.store();
    let mut options = globals.options();
    options.page_delay = delay_arg(args, "page-delay", options.page_delay);

    let mut queue = if args.get_flag("append") {
        match store.load(Slot::Current) {
            Ok(queue) => queue,
            Err(TrawlError::SlotMissing(_)) => store.fresh_queue(),
            Err(e) => return Err(e).context("Failed to load current snapshot"),
        }
    } else {
        store.fresh_queue()
    };

    println!(
        "{} Discovering {} orders from {}",
        "→".blue(),
        orders.len().to_string().cyan(),
        options.base_url.bright_white()
    );

    let pb = spinner();
    let discoverer = Discoverer::new(globals.fetcher()?, &options)
        .with_progress_callback(discovery_callback(&pb));
    let result = discoverer.discover_all(&mut queue, &orders, &store).await;
    pb.finish_and_clear();

    let summaries = result.context("Discovery failed")?;
    print_discovery(&summaries);
    println!(
        "{} Discovery complete, {} URLs checkpointed to {}",
        "✓".green().bold(),
        queue.len().to_string().cyan(),
        store.path(Slot::Master).display().to_string().bright_white()
    );
    Ok(())
}

pub async fn handle_harvest(globals: &GlobalArgs, args: &ArgMatches) -> anyhow::Result<()> {
    let orders = load_orders(&globals.config)?;
    let store = globals.store();
    let mut options = globals.options();
    options.harvest_delay = delay_arg(args, "delay", options.harvest_delay);
    if let Some(policy) = args.get_one::<String>("on-failure") {
        options.failure_policy = policy
            .parse::<FailurePolicy>()
            .map_err(anyhow::Error::msg)?;
    }

    println!(
        "{} Harvesting into {} (failed pages: {})",
        "→".blue(),
        options.data_root.display().to_string().bright_white(),
        options.failure_policy.as_str().yellow()
    );

    let pb = spinner();
    let pb_clone = pb.clone();
    let callback: HarvestProgressCallback =
        Arc::new(move |outcome: &HarvestOutcome, remaining: usize| match outcome {
            HarvestOutcome::Harvested { url, images, .. } => {
                pb_clone.set_message(format!("{} images from {}, {} left", images, url, remaining));
            }
            HarvestOutcome::Failed { url, reason, .. } => {
                pb_clone.println(format!("  {} {} ({})", "⚠".yellow(), url, reason));
                pb_clone.set_message(format!("{} left", remaining));
            }
        });

    let harvester =
        Harvester::new(globals.fetcher()?, orders, &options).with_progress_callback(callback);
    let result = harvester.drain(&store).await;
    pb.finish_and_clear();

    let summary = result.context("Harvest stopped")?;
    println!(
        "{} Harvest complete: {} pages, {} images, {} failed",
        "✓".green().bold(),
        summary.pages.to_string().cyan(),
        summary.images.to_string().cyan(),
        summary.failed.to_string().yellow()
    );
    Ok(())
}

pub async fn handle_repopulate(globals: &GlobalArgs, args: &ArgMatches) -> anyhow::Result<()> {
    let orders = load_orders(&globals.config)?;
    let store = globals.store();
    let mut options = globals.options();
    options.page_delay = delay_arg(args, "page-delay", options.page_delay);

    let row = match args.get_one::<usize>("row") {
        Some(row) => *row,
        None => {
            print_orders(&orders);
            let response = print_prompt("num -->").context("Failed to read row number")?;
            parse_row_index(&response, orders.len()).map_err(anyhow::Error::msg)?
        }
    };

    let pb = spinner();
    let discoverer = Discoverer::new(globals.fetcher()?, &options)
        .with_progress_callback(discovery_callback(&pb));
    let result = discoverer.repopulate(&orders, row, &store).await;
    pb.finish_and_clear();

    let (queue, summary) = result.context("Repopulate failed")?;
    print_discovery(std::slice::from_ref(&summary));
    println!(
        "{} Queue now holds {} URLs",
        "✓".green().bold(),
        queue.len().to_string().cyan()
    );
    Ok(())
}

pub fn handle_queue_status(globals: &GlobalArgs) -> anyhow::Result<()> {
    let store = globals.store();
    println!(
        "{} State directory: {}",
        "ℹ".blue(),
        store.dir().display().to_string().bright_white()
    );
    for slot in [Slot::Current, Slot::Master] {
        let status = store
            .status(slot)
            .with_context(|| format!("Failed to read {} snapshot", slot))?;
        println!("  {}", describe_slot(slot, status.as_ref()));
    }
    Ok(())
}

pub fn handle_queue_checkpoint(globals: &GlobalArgs) -> anyhow::Result<()> {
    let store = globals.store();
    let queue = store
        .load(Slot::Current)
        .context("Failed to load current snapshot")?;
    store.checkpoint(&queue).context("Checkpoint failed")?;
    println!(
        "{} Checkpointed {} URLs into the master slot",
        "✓".green().bold(),
        queue.len().to_string().cyan()
    );
    Ok(())
}

pub fn handle_queue_restore(globals: &GlobalArgs) -> anyhow::Result<()> {
    let store = globals.store();
    let queue = store
        .restore_master()
        .context("Failed to restore from master snapshot")?;
    println!(
        "{} Current slot restored from master, {} URLs queued",
        "✓".green().bold(),
        queue.len().to_string().cyan()
    );
    Ok(())
}
