use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_yaml::Value;
use thiserror::Error;

use crate::browser::driver_factory::{BrowserKind, DriverOptions};
use crate::browser::element_util::Timeouts;
use crate::page::emi_calculator_page::PageSettings;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "emi-smoke",
    version,
    about = "Cucumber smoke suite for the EMI calculator web page"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format: text or json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: String,

    /// Path to config file (default: emi-smoke.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Cucumber scenarios against the live calculator
    Run {
        /// Feature file or directory of feature files
        #[arg(long, default_value = "features")]
        features: String,

        /// Tag expression selecting scenarios, e.g. "@smoke and not @wip"
        #[arg(long, default_value = "@smoke")]
        tags: String,

        /// Browser to drive (overrides browser.name)
        #[arg(long)]
        browser: Option<String>,

        /// Run the browser headless
        #[arg(long)]
        headless: bool,

        /// Skip opening the HTML reports afterwards
        #[arg(long)]
        no_open_reports: bool,
    },

    /// Open the generated HTML reports in a browser window
    OpenReports,

    /// Print the expected EMI breakdown for a loan, offline
    Emi {
        /// Principal amount
        #[arg(long)]
        amount: u64,

        /// Annual interest rate in percent
        #[arg(long)]
        rate: f64,

        /// Loan tenure
        #[arg(long)]
        tenure: u32,

        /// Tenure unit: year or month
        #[arg(long, default_value = "year")]
        unit: String,
    },
}

// ============================================================================
// Properties (flat YAML key/value file)
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "emi-smoke.yaml";
pub const ENV_PREFIX: &str = "EMI_SMOKE_";

/// Property keys.
pub mod keys {
    pub const REPORT_BROWSER: &str = "preferred-browser-for-reports.name";
    pub const REPORTS_PATH: &str = "cucumber.reports.path";
    pub const RETEST_REPORTS_PATH: &str = "cucumber.retest-reports.path";
    pub const HOME_LOAN_EMI_URL: &str = "homeloanemicalculator.url";
    pub const CALCULATOR_URL: &str = "emicalculator.url";
    pub const BROWSER: &str = "browser.name";
    pub const HEADLESS: &str = "browser.headless";
    pub const WEBDRIVER_URL: &str = "webdriver.url";
    pub const SCREENSHOTS_PATH: &str = "screenshots.path";
    pub const WAIT_PAGE_LOAD_SECS: &str = "wait.page-load.secs";
    pub const WAIT_ELEMENT_SECS: &str = "wait.element.secs";
    pub const WAIT_SHORT_MILLIS: &str = "wait.short.millis";
    pub const WAIT_POLL_MILLIS: &str = "wait.poll.millis";
    pub const WAIT_CLICK_RETRIES: &str = "wait.click.retries";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config root must be a mapping of keys to values")]
    NotAMapping,

    #[error("property '{key}' has invalid value '{value}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Flat key/value configuration.
///
/// Nested YAML mappings are flattened with `.`, so `cucumber: { reports:
/// { path: x } }` and `cucumber.reports.path: x` are equivalent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(content)?;
        let mut values = BTreeMap::new();
        match &root {
            Value::Null => {}
            Value::Mapping(_) => flatten("", &root, &mut values),
            _ => return Err(ConfigError::NotAMapping),
        }
        Ok(Properties { values })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `EMI_SMOKE_*` overrides from the given variables.
    pub fn with_env_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(name, _)| name.starts_with(ENV_PREFIX))
            .collect();
        if overrides.is_empty() {
            return self;
        }

        let known: Vec<&str> = self.values.keys().map(String::as_str).chain(ALL_KEYS.iter().copied()).collect();
        let mut applied = Vec::new();
        for key in known {
            if let Some(value) = overrides.get(&env_key(key)) {
                applied.push((key.to_string(), value.clone()));
            }
        }
        for (key, value) in applied {
            self.values.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

const ALL_KEYS: &[&str] = &[
    keys::REPORT_BROWSER,
    keys::REPORTS_PATH,
    keys::RETEST_REPORTS_PATH,
    keys::HOME_LOAN_EMI_URL,
    keys::CALCULATOR_URL,
    keys::BROWSER,
    keys::HEADLESS,
    keys::WEBDRIVER_URL,
    keys::SCREENSHOTS_PATH,
    keys::WAIT_PAGE_LOAD_SECS,
    keys::WAIT_ELEMENT_SECS,
    keys::WAIT_SHORT_MILLIS,
    keys::WAIT_POLL_MILLIS,
    keys::WAIT_CLICK_RETRIES,
];

/// `cucumber.reports.path` → `EMI_SMOKE_CUCUMBER_REPORTS_PATH`
pub fn env_key(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    for c in key.chars() {
        match c {
            '.' | '-' => name.push('_'),
            c => name.push(c.to_ascii_uppercase()),
        }
    }
    name
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => s.clone(),
                    other => scalar_to_string(other),
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&full, v, out);
            }
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), scalar_to_string(other));
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

// ============================================================================
// Typed settings
// ============================================================================

pub const DEFAULT_CALCULATOR_URL: &str = "https://emicalculator.net/";
pub const DEFAULT_HOME_LOAN_EMI_URL: &str = "https://emicalculator.net/home-loan-emi-calculator/";
pub const DEFAULT_REPORTS_PATH: &str = "target/cucumber-reports";
pub const DEFAULT_RETEST_REPORTS_PATH: &str = "target/cucumber-retest-reports";
pub const DEFAULT_SCREENSHOTS_PATH: &str = "target/screenshots";

/// Everything the suite reads from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub browser: String,
    pub headless: bool,
    pub webdriver_url: Option<String>,
    pub calculator_url: String,
    pub home_loan_emi_url: String,
    pub report_browser: String,
    pub reports_dir: PathBuf,
    pub retest_reports_dir: PathBuf,
    /// `None` disables screenshots (empty `screenshots.path`)
    pub screenshots_dir: Option<PathBuf>,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            browser: "chrome".to_string(),
            headless: false,
            webdriver_url: None,
            calculator_url: DEFAULT_CALCULATOR_URL.to_string(),
            home_loan_emi_url: DEFAULT_HOME_LOAN_EMI_URL.to_string(),
            report_browser: "chrome".to_string(),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_PATH),
            retest_reports_dir: PathBuf::from(DEFAULT_RETEST_REPORTS_PATH),
            screenshots_dir: Some(PathBuf::from(DEFAULT_SCREENSHOTS_PATH)),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let browser = props.string_or(keys::BROWSER, &defaults.browser);

        let timeouts = Timeouts {
            page_load: Duration::from_secs(props.parsed(keys::WAIT_PAGE_LOAD_SECS, defaults.timeouts.page_load.as_secs())?),
            element: Duration::from_secs(props.parsed(keys::WAIT_ELEMENT_SECS, defaults.timeouts.element.as_secs())?),
            short: Duration::from_millis(props.parsed(keys::WAIT_SHORT_MILLIS, defaults.timeouts.short.as_millis() as u64)?),
            poll: Duration::from_millis(props.parsed(keys::WAIT_POLL_MILLIS, defaults.timeouts.poll.as_millis() as u64)?),
            click_retries: props.parsed(keys::WAIT_CLICK_RETRIES, defaults.timeouts.click_retries)?,
        };

        let screenshots_dir = match props.get(keys::SCREENSHOTS_PATH) {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path.trim())),
            None => defaults.screenshots_dir,
        };

        Ok(Settings {
            report_browser: props.string_or(keys::REPORT_BROWSER, &browser),
            browser,
            headless: props.parsed(keys::HEADLESS, defaults.headless)?,
            webdriver_url: props.get(keys::WEBDRIVER_URL).map(str::trim).filter(|v| !v.is_empty()).map(String::from),
            calculator_url: props.string_or(keys::CALCULATOR_URL, DEFAULT_CALCULATOR_URL),
            home_loan_emi_url: props.string_or(keys::HOME_LOAN_EMI_URL, DEFAULT_HOME_LOAN_EMI_URL),
            reports_dir: PathBuf::from(props.string_or(keys::REPORTS_PATH, DEFAULT_REPORTS_PATH)),
            retest_reports_dir: PathBuf::from(props.string_or(keys::RETEST_REPORTS_PATH, DEFAULT_RETEST_REPORTS_PATH)),
            screenshots_dir,
            timeouts,
        })
    }

    /// Load settings from `path` (or `emi-smoke.yaml`), then apply
    /// `EMI_SMOKE_*` environment overrides.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let props = match path {
            Some(p) => Properties::load(Path::new(p))?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Properties::load(Path::new(DEFAULT_CONFIG_PATH))?,
            None => Properties::default(),
        };
        Self::from_properties(&props.with_env_overrides(std::env::vars()))
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            calculator_url: self.calculator_url.clone(),
            home_loan_emi_url: self.home_loan_emi_url.clone(),
        }
    }

    /// Driver options for `browser_name` using this config's endpoint and
    /// headless flag.
    pub fn driver_options(&self, browser_name: &str) -> Result<DriverOptions, crate::browser::error::WebDriverError> {
        let browser: BrowserKind = browser_name.parse()?;
        Ok(DriverOptions {
            headless: self.headless,
            webdriver_url: self.webdriver_url.clone(),
            ..DriverOptions::new(browser)
        })
    }
}
