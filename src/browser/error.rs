use std::time::Duration;

use fantoccini::error::{CmdError, ErrorStatus, NewSessionError};
use thiserror::Error;

/// Failures reported by a WebDriver session.
#[derive(Error, Debug)]
pub enum WebDriverError {
    /// Driver process did not answer its status endpoint
    #[error("no WebDriver listening at {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not start a browser session at {endpoint}: {source}")]
    NewSession {
        endpoint: String,
        #[source]
        source: NewSessionError,
    },

    #[error("browser session at {endpoint} did not start within {after:?}")]
    ConnectTimeout { endpoint: String, after: Duration },

    #[error("could not start the WebDriver client runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// No element matched the locator
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Element reference went away (DOM re-rendered or page navigated)
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// Element exists but cannot receive input or clicks right now
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("WebDriver returned an element without a reference")]
    MissingElementId,

    /// Any other command failure
    #[error("WebDriver command '{command}' failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: CmdError,
    },

    /// Browser name in config does not map to a known driver
    #[error("unsupported browser '{0}' (expected chrome, firefox or edge)")]
    UnsupportedBrowser(String),
}

impl WebDriverError {
    /// Sort a fantoccini command error into the cases the waits care about.
    pub fn from_cmd(command: &'static str, error: CmdError) -> Self {
        if error.is_no_such_element() {
            return WebDriverError::NoSuchElement(error.to_string());
        }
        let stale = matches!(
            &error,
            CmdError::Standard(e) if matches!(e.error, ErrorStatus::StaleElementReference)
        );
        let blocked = matches!(
            &error,
            CmdError::Standard(e) if matches!(
                e.error,
                ErrorStatus::ElementNotInteractable | ErrorStatus::ElementClickIntercepted
            )
        );
        if stale {
            WebDriverError::StaleElement(error.to_string())
        } else if blocked {
            WebDriverError::NotInteractable(error.to_string())
        } else {
            WebDriverError::Command { command, source: error }
        }
    }

    /// Timing-related failures that polling loops keep retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WebDriverError::NoSuchElement(_)
                | WebDriverError::StaleElement(_)
                | WebDriverError::NotInteractable(_)
        )
    }
}

/// Screenshot capture failures. Never leave `ElementUtil`; logged there.
#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error(transparent)]
    Driver(#[from] WebDriverError),

    #[error("could not write screenshot: {0}")]
    Io(#[from] std::io::Error),
}
