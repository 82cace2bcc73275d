use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as _;
use cucumber::gherkin::tagexpr::TagOperation;
use cucumber::tag::Ext as _;
use cucumber::{World as _, WriterExt as _, cli, gherkin, writer};
use futures::FutureExt as _;
use futures::future;
use thiserror::Error;
use tracing::info;

use crate::browser::driver_factory::DriverSource;
use crate::cli::config::Settings;
use crate::report::cucumber_json::parse_report;
use crate::report::html::generate_html_report;
use crate::report::report_model::TestSuiteReport;
use crate::scenario::world::EmiWorld;
use crate::trace::logger::LogContext;

pub const JSON_REPORT_FILE: &str = "CucumberTestReport.json";
pub const HTML_REPORT_FILE: &str = "cucumber-report.html";
pub const DEFAULT_TAGS: &str = "@smoke";

#[derive(Error, Debug)]
pub enum RunError {
    #[error("features path '{}' does not exist", .0.display())]
    MissingFeatures(PathBuf),

    #[error("invalid tag expression '{expr}': {source}")]
    Tags {
        expr: String,
        #[source]
        source: <TagOperation as FromStr>::Err,
    },

    #[error("report file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse cucumber report '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What to run and how to log it.
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// Feature file or directory
    pub features: PathBuf,
    /// Tag expression, `@smoke` by default
    pub tags: String,
    pub log: LogContext,
    /// Browser for each scenario, a real session unless replaced
    pub driver: DriverSource,
}

impl SuiteOptions {
    pub fn new(features: impl Into<PathBuf>) -> Self {
        SuiteOptions {
            features: features.into(),
            tags: DEFAULT_TAGS.to_string(),
            log: LogContext::default(),
            driver: DriverSource::remote(),
        }
    }
}

/// Result of one suite run, with the report files it produced.
#[derive(Debug, Clone)]
pub struct SuiteRun {
    pub report: TestSuiteReport,
    pub json_report: PathBuf,
    pub html_report: PathBuf,
}

/// Run every scenario selected by `options.tags`, one at a time, then turn
/// the cucumber JSON output into `cucumber-report.html` next to it.
///
/// Scenario failures are reported in `SuiteRun::report`; `Err` is reserved
/// for problems that prevent a report from being produced.
pub fn run_suite(settings: &Settings, options: &SuiteOptions) -> Result<SuiteRun, RunError> {
    let tags = parse_tags(&options.tags)?;
    if !options.features.exists() {
        return Err(RunError::MissingFeatures(options.features.clone()));
    }

    fs::create_dir_all(&settings.reports_dir).map_err(|source| RunError::Io {
        path: settings.reports_dir.clone(),
        source,
    })?;
    let json_report = settings.reports_dir.join(JSON_REPORT_FILE);
    let json_file = File::create(&json_report).map_err(|source| RunError::Io {
        path: json_report.clone(),
        source,
    })?;

    let start = Instant::now();
    options.log.scope(|| {
        info!(
            features = %options.features.display(),
            tags = %options.tags,
            browser = %settings.browser,
            "running smoke suite"
        );
        futures::executor::block_on(execute(
            Arc::new(settings.clone()),
            options.driver.clone(),
            &options.features,
            tags,
            json_file,
        ));
    });
    let duration = start.elapsed().as_millis();

    let content = fs::read_to_string(&json_report).map_err(|source| RunError::Io {
        path: json_report.clone(),
        source,
    })?;
    let features = parse_report(&content).map_err(|source| RunError::Json {
        path: json_report.clone(),
        source,
    })?;
    let report = TestSuiteReport::from_features(&format!("emi-smoke ({})", options.tags), &features)
        .with_duration(duration);

    let html_report = settings.reports_dir.join(HTML_REPORT_FILE);
    fs::write(&html_report, generate_html_report(&report)).map_err(|source| RunError::Io {
        path: html_report.clone(),
        source,
    })?;

    Ok(SuiteRun {
        report,
        json_report,
        html_report,
    })
}

/// Parse a cucumber tag expression such as `@smoke and not @wip`.
pub fn parse_tags(expr: &str) -> Result<TagOperation, RunError> {
    expr.parse().map_err(|source| RunError::Tags {
        expr: expr.to_string(),
        source,
    })
}

async fn execute(
    settings: Arc<Settings>,
    driver: DriverSource,
    features: &Path,
    tags: TagOperation,
    json: File,
) {
    EmiWorld::cucumber()
        .max_concurrent_scenarios(1)
        .with_writer(
            writer::Basic::raw(io::stdout(), writer::Coloring::Auto, 0)
                .summarized()
                .tee::<EmiWorld, _>(writer::Json::for_tee(json))
                .normalized(),
        )
        .fail_on_skipped()
        .with_cli(cli::Opts::<_, _, _, cli::Empty>::parse_from(["emi-smoke"]))
        .before(move |feature, _rule, scenario, world| {
            world.begin(settings.clone(), driver.clone(), &feature.name, &scenario.name);
            future::ready(()).boxed_local()
        })
        .after(|_feature, _rule, _scenario, _finished, world| {
            if let Some(world) = world {
                world.close();
            }
            future::ready(()).boxed_local()
        })
        .filter_run(features, move |feature, rule, scenario| {
            tags.eval(effective_tags(feature, rule, scenario))
        })
        .await;
}

/// Feature, rule and scenario tags together.
pub fn effective_tags<'a>(
    feature: &'a gherkin::Feature,
    rule: Option<&'a gherkin::Rule>,
    scenario: &'a gherkin::Scenario,
) -> Vec<&'a str> {
    feature
        .tags
        .iter()
        .chain(rule.into_iter().flat_map(|r| r.tags.iter()))
        .chain(scenario.tags.iter())
        .map(String::as_str)
        .collect()
}
