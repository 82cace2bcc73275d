use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde_json::json;
use tracing::{error, info};

use crate::browser::driver_factory::create_driver;
use crate::browser::webdriver::WebDriver;
use crate::cli::config::Settings;

const OPEN_TAB_SCRIPT: &str = "window.open(arguments[0], '_blank');";

/// `.html` files directly inside `dir`, sorted by name. A missing or
/// unreadable directory yields nothing.
pub fn html_reports(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(dir = %dir.display(), "cannot list reports: {}", e);
            return Vec::new();
        }
    };
    let mut reports: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("html")))
        .collect();
    reports.sort();
    reports
}

/// `file://` URL for a report on disk.
pub fn file_url(path: &Path) -> Option<Url> {
    let absolute = std::fs::canonicalize(path).ok()?;
    Url::from_file_path(absolute).ok()
}

/// Show every HTML report in `driver`'s window.
///
/// Creates both directories if needed and prints `Test Report(s):` followed
/// by each report's absolute path. Primary reports are loaded into the
/// current tab in turn; retest reports open in new tabs. Failures are logged
/// and skipped. Returns the reports that were opened.
pub fn open_reports<D: WebDriver, W: Write>(
    driver: &mut D,
    reports_dir: &Path,
    retest_dir: &Path,
    out: &mut W,
) -> Vec<PathBuf> {
    for dir in [reports_dir, retest_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!(dir = %dir.display(), "cannot create report directory: {}", e);
        }
    }

    let primary = html_reports(reports_dir);
    let retest = html_reports(retest_dir);

    if let Err(e) = writeln!(out, "Test Report(s): ") {
        error!("cannot print report list: {}", e);
    }
    for path in primary.iter().chain(retest.iter()) {
        let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if let Err(e) = writeln!(out, "{}", shown.display()) {
            error!("cannot print report list: {}", e);
        }
    }

    let mut opened = Vec::new();
    for path in &primary {
        let Some(url) = file_url(path) else {
            error!(path = %path.display(), "cannot build file URL for report");
            continue;
        };
        match driver.navigate(url.as_str()) {
            Ok(()) => opened.push(path.clone()),
            Err(e) => error!(%url, "cannot open report: {}", e),
        }
    }
    for path in &retest {
        let Some(url) = file_url(path) else {
            error!(path = %path.display(), "cannot build file URL for report");
            continue;
        };
        match driver.execute_script(OPEN_TAB_SCRIPT, vec![json!(url.as_str())]) {
            Ok(_) => opened.push(path.clone()),
            Err(e) => error!(%url, "cannot open retest report: {}", e),
        }
    }

    info!(count = opened.len(), "reports opened");
    opened
}

/// Open the configured report directories in the preferred report browser.
///
/// Every failure is logged, never returned. The browser is left open for
/// review after this returns.
pub fn view_reports(settings: &Settings) {
    let options = match settings.driver_options(&settings.report_browser) {
        Ok(options) => options,
        Err(e) => {
            error!(browser = %settings.report_browser, "cannot open reports: {}", e);
            return;
        }
    };
    let mut driver = match create_driver(&options) {
        Ok(driver) => driver,
        Err(e) => {
            error!(browser = %settings.report_browser, "cannot start report browser: {}", e);
            return;
        }
    };

    let stdout = std::io::stdout();
    open_reports(
        &mut driver,
        &settings.reports_dir,
        &settings.retest_reports_dir,
        &mut stdout.lock(),
    );
    driver.detach();
}
