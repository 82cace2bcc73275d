use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::browser::error::{ScreenshotError, WebDriverError};
use crate::browser::outcome::Outcome;
use crate::browser::webdriver::{ElementRef, Locator, WebDriver};

const READY_STATE_SCRIPT: &str = "return document.readyState;";

const SCROLL_SCRIPT: &str = "const target = arguments[0]; const root = arguments[1]; \
    const rect = target.getBoundingClientRect(); \
    root.scrollTop += rect.top - (root.clientHeight / 2) + (rect.height / 2); \
    target.scrollIntoView({ block: 'center', inline: 'nearest' });";

const HIGHLIGHT_SCRIPT: &str =
    "arguments[0].style.outline = '3px solid red'; arguments[0].style.outlineOffset = '2px';";

const UNHIGHLIGHT_SCRIPT: &str =
    "arguments[0].style.outline = ''; arguments[0].style.outlineOffset = '';";

/// Bounds for every wait the suite performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// `document.readyState == "complete"`
    pub page_load: Duration,
    /// Default visibility wait
    pub element: Duration,
    /// Quick check used for optional elements and after retry clicks
    pub short: Duration,
    /// Sleep between polls
    pub poll: Duration,
    /// Attempts for `click_until_target_appears`
    pub click_retries: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            page_load: Duration::from_secs(30),
            element: Duration::from_secs(10),
            short: Duration::from_secs(1),
            poll: Duration::from_millis(250),
            click_retries: 5,
        }
    }
}

/// Scroll, wait, highlight and screenshot helpers layered over a driver.
///
/// Holds no driver itself; every call borrows one, so a page object can own
/// both the driver and its `ElementUtil`.
#[derive(Debug, Clone)]
pub struct ElementUtil {
    timeouts: Timeouts,
    screenshot_dir: Option<PathBuf>,
}

impl ElementUtil {
    pub fn new(timeouts: Timeouts, screenshot_dir: Option<PathBuf>) -> Self {
        ElementUtil {
            timeouts,
            screenshot_dir,
        }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Poll `check` until it returns true or `timeout` elapses. The check
    /// always runs at least once.
    fn poll<D, F>(&self, driver: &mut D, timeout: Duration, mut check: F) -> Result<bool, WebDriverError>
    where
        D: WebDriver,
        F: FnMut(&mut D) -> Result<bool, WebDriverError>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if check(driver)? {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            thread::sleep(self.timeouts.poll.min(deadline - now));
        }
    }

    /// Block until the document reports `complete`, bounded by the
    /// page-load timeout.
    pub fn wait_until_page_loaded<D: WebDriver>(&self, driver: &mut D) -> Result<Outcome, WebDriverError> {
        let loaded = self.poll(driver, self.timeouts.page_load, |d| {
            let state = d.execute_script(READY_STATE_SCRIPT, vec![])?;
            Ok(state.as_str() == Some("complete"))
        })?;

        if loaded {
            Ok(Outcome::success())
        } else {
            warn!(timeout_ms = self.timeouts.page_load.as_millis() as u64, "page never finished loading");
            Ok(Outcome::timeout("document.readyState == complete", self.timeouts.page_load))
        }
    }

    /// Wait up to `timeout` for `target` to be present and displayed.
    pub fn verify_presence<D: WebDriver>(
        &self,
        driver: &mut D,
        target: &Locator,
        timeout: Duration,
    ) -> Result<Outcome, WebDriverError> {
        let mut matched = false;
        let visible = self.poll(driver, timeout, |d| match d.find_element(target) {
            Ok(element) => {
                matched = true;
                match d.is_displayed(&element) {
                    Ok(displayed) => Ok(displayed),
                    Err(e) if e.is_transient() => Ok(false),
                    Err(e) => Err(e),
                }
            }
            Err(e) if e.is_transient() => Ok(false),
            Err(e) => Err(e),
        })?;

        let outcome = if visible {
            Outcome::success()
        } else if matched {
            Outcome::timeout(target, timeout)
        } else {
            Outcome::not_found(target)
        };
        debug!(%target, %outcome, "verify presence");
        Ok(outcome)
    }

    /// `verify_presence` with the default element timeout.
    pub fn verify<D: WebDriver>(&self, driver: &mut D, target: &Locator) -> Result<Outcome, WebDriverError> {
        self.verify_presence(driver, target, self.timeouts.element)
    }

    /// Scroll `scroll_root` so `target` sits mid-viewport as soon as the
    /// element exists, then wait for it to be visible.
    pub fn scroll_into_view_and_verify<D: WebDriver>(
        &self,
        driver: &mut D,
        target: &Locator,
        scroll_root: &Locator,
    ) -> Result<Outcome, WebDriverError> {
        let mut found = None;
        self.poll(driver, self.timeouts.element, |d| match d.find_element(target) {
            Ok(element) => {
                found = Some(element);
                Ok(true)
            }
            Err(e) if e.is_transient() => Ok(false),
            Err(e) => Err(e),
        })?;
        let Some(element) = found else {
            return Ok(Outcome::not_found(target));
        };

        let root = driver.find_element(scroll_root)?;
        driver.execute_script(SCROLL_SCRIPT, vec![element.to_json(), root.to_json()])?;

        self.verify_presence(driver, target, self.timeouts.element)
    }

    /// Click `trigger` until `target` shows up, within the retry budget.
    /// Covers collapsible menus that ignore clicks while animating.
    pub fn click_until_target_appears<D: WebDriver>(
        &self,
        driver: &mut D,
        trigger: &Locator,
        target: &Locator,
    ) -> Result<Outcome, WebDriverError> {
        let mut last = Outcome::not_found(target);
        for attempt in 1..=self.timeouts.click_retries {
            match driver.find_element(trigger).and_then(|el| driver.click(&el)) {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    debug!(%trigger, attempt, "click did not land: {}", e);
                }
                Err(e) => return Err(e),
            }

            last = self.verify_presence(driver, target, self.timeouts.short)?;
            if last.is_success() {
                debug!(%trigger, %target, attempt, "target appeared");
                return Ok(last);
            }
        }

        warn!(%trigger, %target, retries = self.timeouts.click_retries, "target never appeared");
        Ok(last)
    }

    pub fn highlight<D: WebDriver>(&self, driver: &mut D, element: &ElementRef) {
        self.style(driver, element, HIGHLIGHT_SCRIPT);
    }

    pub fn unhighlight<D: WebDriver>(&self, driver: &mut D, element: &ElementRef) {
        self.style(driver, element, UNHIGHLIGHT_SCRIPT);
    }

    fn style<D: WebDriver>(&self, driver: &mut D, element: &ElementRef, script: &str) {
        if let Err(e) = driver.execute_script(script, vec![element.to_json()]) {
            debug!(element = %element.0, "style change failed: {}", e);
        }
    }

    /// Save a PNG under `<screenshot_dir>/<label>/<tag>_<timestamp>.png`.
    ///
    /// Best effort: failures are logged and reported as `None`.
    pub fn take_screenshot<D: WebDriver>(&self, driver: &mut D, label: &str, tag: &str) -> Option<PathBuf> {
        let dir = self.screenshot_dir.as_ref()?;
        match Self::write_screenshot(driver, dir.join(sanitize_filename(label)), tag) {
            Ok(path) => {
                debug!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(label, tag, "screenshot failed: {}", e);
                None
            }
        }
    }

    fn write_screenshot<D: WebDriver>(driver: &mut D, dir: PathBuf, tag: &str) -> Result<PathBuf, ScreenshotError> {
        let png = driver.screenshot_png()?;
        fs::create_dir_all(&dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        let path = dir.join(format!("{}_{}.png", sanitize_filename(tag), stamp));
        fs::write(&path, png)?;
        Ok(path)
    }
}

/// Sanitize a label into a safe file or directory name.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase()
}
