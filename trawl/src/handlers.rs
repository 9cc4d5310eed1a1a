use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, warn};
use trawl_core::data::Database;
use trawl_core::report::{display_path, generate_crawl_report};
use trawl_core::sink::{self, PersistReport, SinkOptions};
use trawl_scanner::fetch::DEFAULT_USER_AGENT;
use trawl_scanner::{
    ConfigError, CrawlConfig, CrawlOutcome, Crawler, FetcherOptions, HttpFetcher, ProgressCallback,
};

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 1;
pub const EXIT_PERSIST: i32 = 2;

/// Everything the crawl command needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: CrawlConfig,
    pub fetcher: FetcherOptions,
    pub sink: SinkOptions,
    pub db_path: Option<PathBuf>,
    pub quiet: bool,
    pub verbosity: u8,
    pub log_file: Option<PathBuf>,
}

impl RunSettings {
    pub fn from_matches(args: &ArgMatches) -> Result<Self, ConfigError> {
        let seed = args.get_one::<String>("URL").map(String::as_str).unwrap_or_default();
        let max_depth = args.get_one::<usize>("max-depth").copied().unwrap_or(3);
        let workers = args.get_one::<usize>("workers").copied().unwrap_or(20);
        let timeout = args.get_one::<f64>("timeout").copied().unwrap_or(5.0);

        let config = build_config(seed, max_depth, workers, timeout)?;

        let output = args.get_one::<String>("output").map(String::as_str).unwrap_or(".");
        let sink = SinkOptions::new(expand_path(output)).with_render(args.get_flag("render"));

        let fetcher = FetcherOptions {
            user_agent: args
                .get_one::<String>("user-agent")
                .cloned()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            accept_invalid_certs: args.get_flag("insecure"),
            ..Default::default()
        };

        Ok(Self {
            config,
            fetcher,
            sink,
            db_path: args.get_one::<String>("db").map(String::as_str).map(expand_path),
            quiet: args.get_flag("quiet"),
            verbosity: args.get_count("verbose"),
            log_file: args.get_one::<PathBuf>("log-file").cloned(),
        })
    }
}

/// Parse a seed, adding http:// when no scheme was given
pub fn parse_url_line(line: &str) -> String {
    let line = line.trim();
    if line.contains("://") {
        line.to_string()
    } else {
        format!("http://{}", line)
    }
}

/// Build and validate a crawl configuration from raw command-line values.
pub fn build_config(
    seed: &str,
    max_depth: usize,
    workers: usize,
    timeout_secs: f64,
) -> Result<CrawlConfig, ConfigError> {
    let timeout = Duration::try_from_secs_f64(timeout_secs).map_err(|_| ConfigError::InvalidTimeout)?;
    let config = CrawlConfig::new(&parse_url_line(seed))?
        .with_max_depth(max_depth)
        .with_workers(workers)
        .with_timeout(timeout);
    config.validate()?;
    Ok(config)
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(log_level(verbosity));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!(e))
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e)),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_error(context: &str, error: &anyhow::Error) {
    eprintln!("{} {}: {:#}", "✗".red().bold(), context, error);
}

fn level_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight work");
            token.cancel();
        }
    });
}

fn open_session(path: &Path, config: &CrawlConfig) -> anyhow::Result<(Database, String)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db = Database::new(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    let configuration = serde_json::to_string(config)?;
    let session_id = db
        .create_session(config.seed.as_str(), Some(&configuration))
        .context("Failed to create crawl session")?;
    Ok((db, session_id))
}

fn print_outputs(report: &PersistReport) {
    println!("{}", "Output".bright_white().bold());
    for path in [&report.records_path, &report.graph_json_path, &report.graph_dot_path] {
        println!("  {} {}", "→".blue(), path.display());
    }
    if let Some(ref image) = report.image_path {
        println!("  {} {}", "→".blue(), image.display());
    }
    if let Some(ref error) = report.render_error {
        println!("  {} {}", "⚠".yellow().bold(), error.yellow());
    }
}

fn print_summary(outcome: &CrawlOutcome) {
    print_divider();
    if outcome.stats.cancelled {
        println!("{}", "  ⚠ Crawl cancelled".yellow().bold());
    } else {
        println!("{}", "  ✓ Crawl complete".green().bold());
    }
    print_divider();
    let color = colored::control::SHOULD_COLORIZE.should_colorize();
    print!("{}", generate_crawl_report(outcome, color));
}

/// Run a crawl from parsed arguments and return the process exit code.
pub async fn handle_crawl(args: &ArgMatches) -> i32 {
    let settings = match RunSettings::from_matches(args) {
        Ok(settings) => settings,
        Err(e) => {
            print_error("Invalid configuration", &anyhow::Error::from(e));
            return EXIT_CONFIG;
        }
    };

    if let Err(e) = init_logging(settings.verbosity, settings.log_file.as_deref()) {
        print_error("Could not set up logging", &e);
        return EXIT_CONFIG;
    }

    run(settings).await
}

pub async fn run(settings: RunSettings) -> i32 {
    let config = settings.config;

    let fetcher = match HttpFetcher::new(&settings.fetcher).context("Failed to build HTTP client") {
        Ok(fetcher) => fetcher,
        Err(e) => {
            print_error("Invalid configuration", &e);
            return EXIT_CONFIG;
        }
    };

    let session = match settings.db_path.as_deref() {
        Some(path) => match open_session(path, &config) {
            Ok(session) => Some(session),
            Err(e) => {
                print_error("Invalid configuration", &e);
                return EXIT_CONFIG;
            }
        },
        None => None,
    };

    if !settings.quiet {
        println!(
            "{} Crawling {} (depth {}, {} workers, {:.1}s timeout)\n",
            "→".blue(),
            config.seed.as_str().bright_white(),
            config.max_depth,
            config.workers,
            config.timeout.as_secs_f64()
        );
    }

    let spinner = level_spinner(settings.quiet);
    let progress_spinner = spinner.clone();
    let progress: ProgressCallback = Arc::new(move |depth: usize, url: String| {
        progress_spinner.set_message(format!("depth {} {}", depth, display_path(&url)));
    });

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let crawler = Crawler::new(config, Arc::new(fetcher))
        .with_progress_callback(progress)
        .with_cancellation(cancel);

    let outcome = match crawler.crawl().await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.finish_and_clear();
            if let Some((ref db, ref session_id)) = session {
                sink::mark_session_failed(db, session_id);
            }
            print_error("Crawl failed", &anyhow::Error::from(e));
            return EXIT_CONFIG;
        }
    };
    spinner.finish_and_clear();

    let report = match sink::persist(&outcome, &settings.sink) {
        Ok(report) => report,
        Err(e) => {
            if let Some((ref db, ref session_id)) = session {
                sink::mark_session_failed(db, session_id);
            }
            print_error("Could not save results", &anyhow::Error::from(e));
            return EXIT_PERSIST;
        }
    };

    if let Some((ref db, ref session_id)) = session
        && let Err(e) = sink::archive(db, session_id, &outcome)
    {
        print_error("Could not archive results", &anyhow::Error::from(e));
        return EXIT_PERSIST;
    }

    print_summary(&outcome);
    print_outputs(&report);
    if let Some((_, ref session_id)) = session {
        println!("  {} session {}", "→".blue(), session_id.bright_white());
    }

    EXIT_OK
}
