use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use icdwalk_browser::session::{DEFAULT_BROWSE_URL, DEFAULT_ROOT_TIMEOUT};
use icdwalk_browser::{Session, SessionConfig};
use icdwalk_core::report::{StatusSummary, generate_status_report};
use icdwalk_core::store::{self, DEFAULT_CHECKPOINT_INTERVAL, StorePaths};
use icdwalk_core::walker::DEFAULT_EXPAND_TIMEOUT;
use icdwalk_core::{
    CategoryMap, DiseaseStore, Harvest, HarvestStats, ProgressCallback, WalkOptions, WalkProgress,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, warn};
use url::Url;

/// Everything a harvest run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub url: Url,
    pub output_dir: PathBuf,
    pub walk: WalkOptions,
    pub session: SessionConfig,
    pub snapshot: bool,
}

pub fn print_banner() {
    println!(
        "{} {}",
        "icdwalk".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}", "ICD-11 classification tree harvester".bright_white());
    println!();
}

pub fn init_tracing(quiet: bool, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand `~` in the output directory argument.
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn harvest_config_from_args(args: &ArgMatches) -> anyhow::Result<HarvestConfig> {
    let url = match args.get_one::<Url>("url") {
        Some(url) => url.clone(),
        None => Url::parse(DEFAULT_BROWSE_URL).context("Invalid default URL")?,
    };
    let output = args
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(".");
    let millis = |name: &str| args.get_one::<u64>(name).map(|ms| Duration::from_millis(*ms));

    let walk = WalkOptions {
        expand_timeout: millis("expand-timeout").unwrap_or(DEFAULT_EXPAND_TIMEOUT),
        checkpoint_interval: args
            .get_one::<u64>("checkpoint-every")
            .map(|n| *n as usize)
            .unwrap_or(DEFAULT_CHECKPOINT_INTERVAL),
        ..WalkOptions::default()
    };
    let session = SessionConfig {
        headless: !args.get_flag("headful"),
        sandbox: !args.get_flag("no-sandbox"),
        root_timeout: millis("root-timeout").unwrap_or(DEFAULT_ROOT_TIMEOUT),
        ..SessionConfig::default()
    };

    Ok(HarvestConfig {
        url,
        output_dir: resolve_output_dir(output),
        walk,
        session,
        snapshot: !args.get_flag("no-snapshot"),
    })
}

/// One-line spinner message for a visited node.
pub fn progress_message(progress: &WalkProgress) -> String {
    format!(
        "[{}] {} records | {}",
        progress.category, progress.records, progress.label
    )
}

/// Launch the browser, walk every top-level category, and snapshot the
/// page. The browser is closed whether or not the walk succeeds.
pub async fn run_harvest(
    config: &HarvestConfig,
    progress: Option<ProgressCallback>,
) -> anyhow::Result<HarvestStats> {
    let paths = StorePaths::in_dir(&config.output_dir);
    let mut harvest = Harvest::open(paths).with_options(config.walk.clone());
    if let Some(callback) = progress {
        harvest = harvest.with_progress_callback(callback);
    }

    let session = Session::launch(config.session.clone())
        .await
        .context("Failed to launch browser")?;
    let outcome = walk(&session, &mut harvest, config).await;
    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }
    outcome
}

async fn walk(
    session: &Session,
    harvest: &mut Harvest,
    config: &HarvestConfig,
) -> anyhow::Result<HarvestStats> {
    session
        .open(&config.url)
        .await
        .with_context(|| format!("Failed to open {}", config.url))?;
    let categories = session
        .top_categories()
        .await
        .context("Failed to locate the classification tree")?;

    let stats = harvest.run(&categories).await?;

    if config.snapshot {
        let paths = harvest.paths();
        session
            .snapshot(&paths.page_html, &paths.page_png)
            .await
            .context("Failed to save page snapshot")?;
    }
    Ok(stats)
}

pub async fn handle_harvest(args: &ArgMatches, quiet: bool, verbose: bool) {
    init_tracing(quiet, verbose);
    let config = match harvest_config_from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{} Harvesting {}",
        "→".blue(),
        config.url.as_str().bright_white()
    );
    println!("Output: {}", config.output_dir.display());
    println!(
        "Checkpoint every {} records, expand timeout {:?}\n",
        config.walk.checkpoint_interval, config.walk.expand_timeout
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Launching browser...");

    let bar = spinner.clone();
    let progress_callback: ProgressCallback = Arc::new(move |progress: WalkProgress| {
        bar.set_message(progress_message(&progress));
    });

    match run_harvest(&config, Some(progress_callback)).await {
        Ok(stats) => {
            spinner.finish_and_clear();
            println!("\n{} Harvest complete!\n", "✓".green().bold());
            print!("{}", format_harvest_stats(&stats));
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} Harvest failed: {:#}", "✗".red().bold(), e);
            eprintln!("Progress up to the last checkpoint is saved; rerun to resume.");
            std::process::exit(1);
        }
    }
}

pub fn format_harvest_stats(stats: &HarvestStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Categories walked: {}\n", stats.categories_walked));
    out.push_str(&format!(
        "  Categories already captured: {}\n",
        stats.categories_skipped
    ));
    out.push_str(&format!("  New records: {}\n", stats.records_added));
    out.push_str(&format!("  Nodes expanded: {}\n", stats.expansions));
    out.push_str(&format!("  Checkpoints: {}\n", stats.checkpoints));
    if stats.categories_unlabelled > 0 {
        out.push_str(&format!(
            "  Unlabelled categories: {}\n",
            stats.categories_unlabelled
        ));
    }
    if stats.uncoded_labels > 0 {
        out.push_str(&format!("  Labels without a code: {}\n", stats.uncoded_labels));
    }
    if stats.save_failures > 0 {
        out.push_str(&format!(
            "  {} {} failed saves\n",
            "⚠".yellow(),
            stats.save_failures
        ));
    }
    if stats.captured_conflicts > 0 {
        out.push_str(&format!(
            "  {} {} captured-list conflicts\n",
            "⚠".yellow(),
            stats.captured_conflicts
        ));
    }
    out
}

/// Read both documents as they are on disk, without normalizing, so the
/// status report can point out inconsistencies.
pub fn load_documents(paths: &StorePaths) -> (CategoryMap, DiseaseStore) {
    let categories: CategoryMap = store::load(&paths.categories);
    let diseases: DiseaseStore = store::load(&paths.diseases);
    (categories, diseases)
}

pub fn handle_status(args: &ArgMatches, quiet: bool, verbose: bool) {
    init_tracing(quiet, verbose);
    let output = args
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(".");
    let paths = StorePaths::in_dir(&resolve_output_dir(output));

    let (categories, diseases) = load_documents(&paths);
    let summary = StatusSummary::from_documents(&categories, &diseases);
    print!("{}", generate_status_report(&summary, &categories));
}
