use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use emi_smoke::browser::driver_factory::BrowserKind;
use emi_smoke::cli::commands::cmd_emi;
use emi_smoke::cli::config::{Cli, Commands, ConfigError, Properties, Settings, env_key, keys};
use emi_smoke::trace::logger::{LogContext, LogFormat};

// ============================================================================
// Helpers
// ============================================================================

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

// ============================================================================
// 1. Argument parsing
// ============================================================================

#[test]
fn run_defaults() {
    let cli = Cli::try_parse_from(["emi-smoke", "run"]).unwrap();
    match cli.command {
        Commands::Run {
            features,
            tags,
            browser,
            headless,
            no_open_reports,
        } => {
            assert_eq!(features, "features");
            assert_eq!(tags, "@smoke");
            assert!(browser.is_none());
            assert!(!headless);
            assert!(!no_open_reports);
        }
        other => panic!("expected Run, got {:?}", other),
    }
    assert_eq!(cli.verbose, 0);
    assert_eq!(cli.log_format, "text");
}

#[test]
fn run_accepts_overrides_and_global_flags() {
    let cli = Cli::try_parse_from([
        "emi-smoke",
        "run",
        "--tags",
        "@smoke and not @nav",
        "--browser",
        "firefox",
        "--headless",
        "--no-open-reports",
        "-vv",
        "--config",
        "ci.yaml",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("ci.yaml"));
    assert!(matches!(
        cli.command,
        Commands::Run { ref tags, browser: Some(ref b), headless: true, no_open_reports: true, .. }
            if tags == "@smoke and not @nav" && b == "firefox"
    ));
}

#[test]
fn open_reports_subcommand() {
    let cli = Cli::try_parse_from(["emi-smoke", "open-reports", "-q"]).unwrap();
    assert!(matches!(cli.command, Commands::OpenReports));
    assert!(cli.quiet);
}

#[test]
fn emi_subcommand_requires_loan_terms() {
    assert!(Cli::try_parse_from(["emi-smoke", "emi", "--amount", "500000"]).is_err());

    let cli = Cli::try_parse_from([
        "emi-smoke", "emi", "--amount", "500000", "--rate", "8.5", "--tenure", "60", "--unit", "month",
    ])
    .unwrap();
    match cli.command {
        Commands::Emi { amount, rate, tenure, unit } => {
            assert_eq!(amount, 500_000);
            assert_eq!(rate, 8.5);
            assert_eq!(tenure, 60);
            assert_eq!(unit, "month");
        }
        other => panic!("expected Emi, got {:?}", other),
    }
}

// ============================================================================
// 2. Properties
// ============================================================================

#[test]
fn properties_flatten_nested_mappings() {
    let props = Properties::from_yaml_str(
        r#"
browser:
  name: firefox
  headless: true
cucumber.reports.path: out/reports
wait:
  element:
    secs: 5
"#,
    )
    .unwrap();
    assert_eq!(props.get(keys::BROWSER), Some("firefox"));
    assert_eq!(props.get(keys::HEADLESS), Some("true"));
    assert_eq!(props.get(keys::REPORTS_PATH), Some("out/reports"));
    assert_eq!(props.get(keys::WAIT_ELEMENT_SECS), Some("5"));
    assert_eq!(props.len(), 4);
}

#[test]
fn properties_empty_file_is_empty() {
    assert!(Properties::from_yaml_str("").unwrap().is_empty());
}

#[test]
fn properties_reject_non_mapping_root() {
    assert!(matches!(
        Properties::from_yaml_str("- a\n- b\n"),
        Err(ConfigError::NotAMapping)
    ));
    assert!(matches!(
        Properties::from_yaml_str("key: [unclosed"),
        Err(ConfigError::Yaml(_))
    ));
}

#[test]
fn properties_load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Properties::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn env_key_upper_snake_cases_with_prefix() {
    assert_eq!(env_key(keys::REPORTS_PATH), "EMI_SMOKE_CUCUMBER_REPORTS_PATH");
    assert_eq!(
        env_key(keys::REPORT_BROWSER),
        "EMI_SMOKE_PREFERRED_BROWSER_FOR_REPORTS_NAME"
    );
}

#[test]
fn env_overrides_replace_and_add_known_keys() {
    let props = Properties::from_yaml_str("browser.name: chrome\ncustom.key: a\n")
        .unwrap()
        .with_env_overrides(vars(&[
            ("EMI_SMOKE_BROWSER_NAME", "edge"),
            ("EMI_SMOKE_BROWSER_HEADLESS", "true"),
            ("EMI_SMOKE_CUSTOM_KEY", "b"),
            ("EMI_SMOKE_NOT_A_KEY", "ignored"),
            ("BROWSER_NAME", "firefox"),
        ]));
    assert_eq!(props.get(keys::BROWSER), Some("edge"));
    assert_eq!(props.get(keys::HEADLESS), Some("true"));
    assert_eq!(props.get("custom.key"), Some("b"));
    assert_eq!(props.len(), 3);
}

// ============================================================================
// 3. Settings
// ============================================================================

#[test]
fn settings_defaults() {
    let settings = Settings::from_properties(&Properties::default()).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.browser, "chrome");
    assert_eq!(settings.report_browser, "chrome");
    assert_eq!(settings.calculator_url, "https://emicalculator.net/");
    assert!(settings.screenshots_dir.is_some());
}

#[test]
fn settings_read_every_key() {
    let mut props = Properties::default();
    props.set(keys::BROWSER, "firefox");
    props.set(keys::HEADLESS, "true");
    props.set(keys::WEBDRIVER_URL, "http://grid:4444");
    props.set(keys::REPORT_BROWSER, "edge");
    props.set(keys::REPORTS_PATH, "out/reports");
    props.set(keys::RETEST_REPORTS_PATH, "out/retest");
    props.set(keys::CALCULATOR_URL, "http://localhost:8080/");
    props.set(keys::HOME_LOAN_EMI_URL, "http://localhost:8080/home-loan/");
    props.set(keys::WAIT_PAGE_LOAD_SECS, "30");
    props.set(keys::WAIT_SHORT_MILLIS, "250");
    props.set(keys::WAIT_CLICK_RETRIES, "5");

    let settings = Settings::from_properties(&props).unwrap();
    assert_eq!(settings.browser, "firefox");
    assert!(settings.headless);
    assert_eq!(settings.webdriver_url.as_deref(), Some("http://grid:4444"));
    assert_eq!(settings.report_browser, "edge");
    assert_eq!(settings.reports_dir, PathBuf::from("out/reports"));
    assert_eq!(settings.retest_reports_dir, PathBuf::from("out/retest"));
    assert_eq!(settings.page_settings().home_loan_emi_url, "http://localhost:8080/home-loan/");
    assert_eq!(settings.timeouts.page_load, Duration::from_secs(30));
    assert_eq!(settings.timeouts.short, Duration::from_millis(250));
    assert_eq!(settings.timeouts.click_retries, 5);
}

#[test]
fn report_browser_follows_browser_when_unset() {
    let mut props = Properties::default();
    props.set(keys::BROWSER, "firefox");
    assert_eq!(Settings::from_properties(&props).unwrap().report_browser, "firefox");
}

#[test]
fn settings_invalid_value_names_key() {
    let mut props = Properties::default();
    props.set(keys::WAIT_ELEMENT_SECS, "soon");
    let err = Settings::from_properties(&props).unwrap_err();
    match err {
        ConfigError::InvalidValue { key, value, .. } => {
            assert_eq!(key, keys::WAIT_ELEMENT_SECS);
            assert_eq!(value, "soon");
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

#[test]
fn empty_screenshots_path_disables_screenshots() {
    let mut props = Properties::default();
    props.set(keys::SCREENSHOTS_PATH, "  ");
    assert!(Settings::from_properties(&props).unwrap().screenshots_dir.is_none());
}

#[test]
fn settings_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("smoke.yaml");
    std::fs::write(&path, "emicalculator:\n  url: http://localhost:9000/\n").unwrap();
    let settings = Settings::load(path.to_str()).unwrap();
    assert_eq!(settings.calculator_url, "http://localhost:9000/");
}

#[test]
fn settings_load_explicit_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.yaml");
    assert!(matches!(Settings::load(path.to_str()), Err(ConfigError::Io { .. })));
}

#[test]
fn driver_options_use_config_endpoint_and_headless() {
    let settings = Settings {
        headless: true,
        webdriver_url: Some("http://grid:4444".into()),
        ..Settings::default()
    };
    let options = settings.driver_options("Edge").unwrap();
    assert_eq!(options.browser, BrowserKind::Edge);
    assert!(options.headless);
    assert_eq!(options.endpoint(), "http://grid:4444");
    assert!(settings.driver_options("netscape").is_err());
}

// ============================================================================
// 4. emi subcommand
// ============================================================================

#[test]
fn cmd_emi_prints_breakdown() {
    let out = cmd_emi(500_000, 8.5, 5, "years").unwrap();
    assert!(out.contains("(60 months)"));
    assert!(out.contains("Monthly EMI:           10258"));
    assert!(out.contains("First month interest:  3542"));
    assert!(out.contains("First month principal: 6716"));
}

#[test]
fn cmd_emi_rejects_bad_input() {
    assert!(cmd_emi(0, 8.5, 5, "year").is_err());
    assert!(cmd_emi(500_000, 8.5, 5, "fortnight").is_err());
}

#[test]
fn cmd_emi_rejects_tenure_that_overflows_months() {
    let err = cmd_emi(100_000, 8.5, 400_000_000, "years").unwrap_err();
    assert!(err.to_string().contains("too long"), "{}", err);
}

// ============================================================================
// 5. Logging context
// ============================================================================

#[test]
fn log_context_from_verbosity() {
    assert_eq!(LogContext::from_verbosity(0, false, LogFormat::Text).level, LevelFilter::INFO);
    assert_eq!(LogContext::from_verbosity(1, false, LogFormat::Text).level, LevelFilter::DEBUG);
    assert_eq!(LogContext::from_verbosity(3, false, LogFormat::Text).level, LevelFilter::TRACE);
    assert_eq!(LogContext::from_verbosity(2, true, LogFormat::Json).level, LevelFilter::ERROR);
    assert_eq!(LogContext::default(), LogContext::from_verbosity(0, false, LogFormat::Text));
}

#[test]
fn log_format_parses() {
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert!("xml".parse::<LogFormat>().is_err());
}

#[test]
fn log_scope_returns_closure_value() {
    let log = LogContext::from_verbosity(0, true, LogFormat::Json);
    let value = log.scope(|| {
        tracing::error!("inside scope");
        42
    });
    assert_eq!(value, 42);
}
