//! Application configuration for datrack.
//!
//! User config lives at `~/.datrack/datrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DatrackError, Result};
use crate::types::DateRange;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "datrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".datrack";

// ---------------------------------------------------------------------------
// Config structs (matching datrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Portal addresses.
    #[serde(default)]
    pub portal: PortalConfig,

    /// Search filters.
    #[serde(default)]
    pub search: SearchConfig,

    /// WebDriver settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Output destinations.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[portal]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Listing entry point (shows the disclaimer first).
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Base for application-relative links such as `default.aspx?...`.
    #[serde(default = "default_app_base")]
    pub app_base: String,

    /// Site root for links beginning with `/`.
    #[serde(default = "default_site_root")]
    pub site_root: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            app_base: default_app_base(),
            site_root: default_site_root(),
        }
    }
}

fn default_search_url() -> String {
    "https://www3.shoalhaven.nsw.gov.au/masterviewUI/modules/ApplicationMaster/Default.aspx".into()
}
fn default_app_base() -> String {
    "https://www3.shoalhaven.nsw.gov.au/masterviewUI/modules/ApplicationMaster/".into()
}
fn default_site_root() -> String {
    "https://www3.shoalhaven.nsw.gov.au".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// First lodgement date, `dd/mm/yyyy`.
    #[serde(default)]
    pub start_date: String,

    /// Last lodgement date, `dd/mm/yyyy`.
    #[serde(default)]
    pub end_date: String,

    /// Seconds to wait for an element before giving up.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_date: String::new(),
            end_date: String::new(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

fn default_wait_timeout() -> u64 {
    20
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver endpoint (e.g. a running chromedriver).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run Chrome without a window.
    #[serde(default)]
    pub headless: bool,

    /// Seconds before a page load is abandoned.
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_secs: u64,

    /// Pause after clicks that trigger a postback, in ms.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            page_load_timeout_secs: default_page_load_timeout(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_page_load_timeout() -> u64 {
    60
}
fn default_settle_ms() -> u64 {
    3000
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV destination.
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Optional JSON run report destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            report_path: None,
        }
    }
}

fn default_output_path() -> String {
    "results.csv".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one scrape, validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Portal addresses (roots checked to be absolute http(s) URLs).
    pub portal: PortalConfig,
    /// Lodgement date range to search.
    pub range: DateRange,
    /// Element wait timeout.
    pub wait_timeout: Duration,
    /// WebDriver settings.
    pub browser: BrowserConfig,
    /// CSV destination.
    pub output_path: PathBuf,
    /// Optional JSON run report destination.
    pub report_path: Option<PathBuf>,
}

impl TryFrom<&AppConfig> for RunConfig {
    type Error = DatrackError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let range = DateRange::parse(&config.search.start_date, &config.search.end_date)?;

        for (key, value) in [
            ("portal.search_url", &config.portal.search_url),
            ("portal.app_base", &config.portal.app_base),
            ("portal.site_root", &config.portal.site_root),
            ("browser.webdriver_url", &config.browser.webdriver_url),
        ] {
            require_http_url(key, value)?;
        }

        if config.search.wait_timeout_secs == 0 {
            return Err(DatrackError::validation(
                "search.wait_timeout_secs must be greater than zero",
            ));
        }

        if config.output.path.trim().is_empty() {
            return Err(DatrackError::validation("output.path must not be empty"));
        }

        Ok(Self {
            portal: config.portal.clone(),
            range,
            wait_timeout: Duration::from_secs(config.search.wait_timeout_secs),
            browser: config.browser.clone(),
            output_path: PathBuf::from(&config.output.path),
            report_path: config.output.report_path.as_ref().map(PathBuf::from),
        })
    }
}

fn require_http_url(key: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value.trim())
        .map_err(|e| DatrackError::validation(format!("{key} '{value}' is not a URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DatrackError::validation(format!(
            "{key} '{value}' must use http or https, not {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.datrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DatrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.datrack/datrack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DatrackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DatrackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DatrackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DatrackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DatrackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
