//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use datrack_browser::PortalSession;
use datrack_core::{RunReport, RunStatus, pipeline};
use datrack_shared::{
    AppConfig, ProgressReporter, RunConfig, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// datrack: development application records from DA Tracking.
#[derive(Parser)]
#[command(
    name = "datrack",
    version,
    about = "Search the DA Tracking portal by lodgement date and export every application to CSV.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search a date range and export every application found.
    Scrape(ScrapeArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `scrape`; each overrides the matching config file value.
#[derive(Args, Debug, Default)]
pub(crate) struct ScrapeArgs {
    /// First lodgement date, dd/mm/yyyy.
    #[arg(long)]
    pub from: Option<String>,

    /// Last lodgement date, dd/mm/yyyy.
    #[arg(long)]
    pub to: Option<String>,

    /// CSV output path.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Seconds to wait for portal elements.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Run Chrome without a window.
    #[arg(long)]
    pub headless: bool,

    /// WebDriver endpoint, e.g. http://localhost:9515.
    #[arg(long, env = "DATRACK_WEBDRIVER")]
    pub webdriver: Option<String>,

    /// Also write a JSON run report to this path.
    #[arg(long)]
    pub report: Option<String>,

    /// Config file to use instead of ~/.datrack/datrack.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "datrack=info",
        1 => "datrack=debug",
        _ => "datrack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape(args) => cmd_scrape(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(args: ScrapeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_overrides(&mut config, &args);

    let run_config = RunConfig::try_from(&config).wrap_err("invalid scrape settings")?;
    info!(
        from = %run_config.range.start_text(),
        to = %run_config.range.end_text(),
        output = %run_config.output_path.display(),
        "scrape configured"
    );

    let session = PortalSession::connect(&run_config)
        .await
        .wrap_err("could not start the browser; is chromedriver running?")?;

    let reporter = CliProgress::new();
    let report = pipeline::run(&run_config, session, &reporter).await?;

    print_summary(&report);
    Ok(())
}

/// Layer command-line flags over the loaded file config.
fn apply_overrides(config: &mut AppConfig, args: &ScrapeArgs) {
    if let Some(from) = &args.from {
        config.search.start_date = from.clone();
    }
    if let Some(to) = &args.to {
        config.search.end_date = to.clone();
    }
    if let Some(timeout) = args.timeout {
        config.search.wait_timeout_secs = timeout;
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(report) = &args.report {
        config.output.report_path = Some(report.clone());
    }
    if let Some(webdriver) = &args.webdriver {
        config.browser.webdriver_url = webdriver.clone();
    }
    if args.headless {
        config.browser.headless = true;
    }
}

/// First summary line, by how far the run got.
fn headline(report: &RunReport) -> String {
    match report.status {
        RunStatus::NoRecords => format!(
            "No applications lodged between {} and {}.",
            report.range.start_text(),
            report.range.end_text()
        ),
        RunStatus::NothingCollected => format!(
            "{} results listed, but none had a detail link.",
            report.expected_items
        ),
        RunStatus::NothingExtracted => format!(
            "{} candidates found, but no record could be read.",
            report.candidates
        ),
        RunStatus::Exported => "Export complete!".to_string(),
        RunStatus::Started => "Run did not finish.".to_string(),
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  {}", headline(report));
    println!("  Run:        {}", report.run_id);
    println!("  Expected:   {}", report.expected_items);
    println!("  Candidates: {}", report.candidates);
    println!("  Records:    {}", report.records);
    if report.duplicates + report.empty + report.errors > 0 {
        println!(
            "  Skipped:    {} duplicate, {} empty, {} failed",
            report.duplicates, report.empty, report.errors
        );
    }
    if let Some(rate) = report.success_rate {
        println!("  Success:    {:.1}%", rate * 100.0);
    }
    if report.incomplete {
        println!(
            "  Warning:    listing stopped early ({})",
            report.collection_detail.as_deref().unwrap_or("unknown reason")
        );
    }
    if let Some(path) = &report.output_path {
        println!("  Output:     {}", path.display());
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_collected(&self, page: u32, total_pages: u32, candidates: usize) {
        self.spinner.set_message(format!(
            "Collecting [page {page}/{total_pages}] {candidates} candidates"
        ));
    }

    fn record_processed(&self, identifier: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracting [{current}/{total}] {identifier}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let mut config = AppConfig::default();
        config.search.start_date = "01/01/2025".into();
        config.output.path = "from-file.csv".into();

        let args = ScrapeArgs {
            from: Some("01/09/2025".into()),
            to: Some("30/09/2025".into()),
            timeout: Some(45),
            headless: true,
            report: Some("run.json".into()),
            ..ScrapeArgs::default()
        };
        apply_overrides(&mut config, &args);

        assert_eq!(config.search.start_date, "01/09/2025");
        assert_eq!(config.search.end_date, "30/09/2025");
        assert_eq!(config.search.wait_timeout_secs, 45);
        assert!(config.browser.headless);
        assert_eq!(config.output.path, "from-file.csv");
        assert_eq!(config.output.report_path.as_deref(), Some("run.json"));

        let run = RunConfig::try_from(&config).unwrap();
        assert_eq!(run.wait_timeout, std::time::Duration::from_secs(45));
    }

    #[test]
    fn headless_flag_absent_keeps_file_value() {
        let mut config = AppConfig::default();
        config.browser.headless = true;
        apply_overrides(&mut config, &ScrapeArgs::default());
        assert!(config.browser.headless);
    }

    #[test]
    fn unfinished_report_is_not_called_an_export() {
        let range = datrack_shared::DateRange::parse("01/09/2025", "30/09/2025").unwrap();
        let mut report = RunReport::start(range);
        assert_eq!(headline(&report), "Run did not finish.");

        report.finish(RunStatus::Exported);
        assert_eq!(headline(&report), "Export complete!");

        report.finish(RunStatus::NoRecords);
        assert_eq!(
            headline(&report),
            "No applications lodged between 01/09/2025 and 30/09/2025."
        );
    }

    #[test]
    fn cli_parses_scrape() {
        let cli = Cli::try_parse_from([
            "datrack",
            "-v",
            "scrape",
            "--from",
            "01/09/2025",
            "--to",
            "30/09/2025",
            "-o",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Scrape(args) => {
                assert_eq!(args.from.as_deref(), Some("01/09/2025"));
                assert_eq!(args.output.as_deref(), Some("out.csv"));
                assert!(!args.headless);
            }
            Command::Config { .. } => panic!("expected scrape"),
        }
    }
}
