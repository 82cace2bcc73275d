use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::browser::error::WebDriverError;
use crate::browser::session::RemoteSession;
use crate::browser::webdriver::WebDriver;
use crate::cli::config::Settings;

/// Browsers the suite knows how to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
}

impl FromStr for BrowserKind {
    type Err = WebDriverError;

    /// Case-insensitive, accepts the usual aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" | "googlechrome" => Ok(BrowserKind::Chrome),
            "firefox" | "ff" | "gecko" => Ok(BrowserKind::Firefox),
            "edge" | "msedge" | "microsoftedge" => Ok(BrowserKind::Edge),
            _ => Err(WebDriverError::UnsupportedBrowser(s.to_string())),
        }
    }
}

impl BrowserKind {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "MicrosoftEdge",
        }
    }

    /// Where the matching driver listens when started with no flags.
    pub fn default_webdriver_url(&self) -> &'static str {
        match self {
            BrowserKind::Chrome | BrowserKind::Edge => "http://localhost:9515",
            BrowserKind::Firefox => "http://localhost:4444",
        }
    }

    /// W3C `alwaysMatch` capabilities for this browser.
    pub fn capabilities(&self, headless: bool) -> Value {
        match self {
            BrowserKind::Chrome | BrowserKind::Edge => {
                let mut args = vec!["--start-maximized", "--disable-notifications"];
                if headless {
                    args.extend(["--headless=new", "--disable-gpu", "--window-size=1920,1080"]);
                }
                let options_key = if *self == BrowserKind::Chrome {
                    "goog:chromeOptions"
                } else {
                    "ms:edgeOptions"
                };
                json!({
                    "browserName": self.name(),
                    options_key: { "args": args },
                })
            }
            BrowserKind::Firefox => {
                let mut args = vec!["--width=1920", "--height=1080"];
                if headless {
                    args.push("--headless");
                }
                json!({
                    "browserName": self.name(),
                    "moz:firefoxOptions": { "args": args },
                })
            }
        }
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverOptions {
    pub browser: BrowserKind,
    pub headless: bool,
    /// Overrides the browser's default driver URL
    pub webdriver_url: Option<String>,
    /// Bounds both the status check and session creation
    pub connect_timeout: Duration,
}

impl DriverOptions {
    pub fn new(browser: BrowserKind) -> Self {
        DriverOptions {
            browser,
            headless: false,
            webdriver_url: None,
            connect_timeout: Duration::from_secs(60),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.webdriver_url
            .as_deref()
            .unwrap_or_else(|| self.browser.default_webdriver_url())
    }
}

/// Ask the driver's `/status` endpoint whether anything is listening.
pub fn check_driver_status(endpoint: &str, timeout: Duration) -> Result<(), WebDriverError> {
    let unreachable = |source: reqwest::Error| WebDriverError::Unreachable {
        endpoint: endpoint.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(unreachable)?;
    client
        .get(format!("{}/status", endpoint.trim_end_matches('/')))
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(unreachable)?;
    Ok(())
}

/// Open a browser session for the given options.
pub fn create_driver(options: &DriverOptions) -> Result<RemoteSession, WebDriverError> {
    info!(
        browser = options.browser.name(),
        endpoint = options.endpoint(),
        headless = options.headless,
        "starting browser session"
    );
    check_driver_status(options.endpoint(), options.connect_timeout)?;
    RemoteSession::start(
        options.endpoint(),
        &options.browser.capabilities(options.headless),
        options.connect_timeout,
    )
}

type Connect = dyn Fn(&Settings) -> Result<Box<dyn WebDriver>, WebDriverError> + Send + Sync;

/// Where each scenario gets its browser from.
///
/// The default starts a real session from the configured browser; tests
/// hand in a closure that builds an in-memory driver.
#[derive(Clone)]
pub struct DriverSource(Arc<Connect>);

impl DriverSource {
    pub fn new(
        connect: impl Fn(&Settings) -> Result<Box<dyn WebDriver>, WebDriverError> + Send + Sync + 'static,
    ) -> Self {
        DriverSource(Arc::new(connect))
    }

    /// Real browser sessions via `create_driver`.
    pub fn remote() -> Self {
        DriverSource::new(|settings| {
            let options = settings.driver_options(&settings.browser)?;
            Ok(Box::new(create_driver(&options)?))
        })
    }

    pub fn connect(&self, settings: &Settings) -> Result<Box<dyn WebDriver>, WebDriverError> {
        (self.0)(settings)
    }
}

impl fmt::Debug for DriverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DriverSource(..)")
    }
}
