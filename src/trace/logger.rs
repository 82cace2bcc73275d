use std::str::FromStr;

use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Log level and format for one run, handed explicitly to whatever runs
/// the suite. Nothing is installed process-wide; `scope` activates the
/// subscriber for the duration of a closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogContext {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LogContext {
    fn default() -> Self {
        LogContext {
            level: LevelFilter::INFO,
            format: LogFormat::Text,
        }
    }
}

impl LogContext {
    /// `-q` → errors only, none → info, `-v` → debug, `-vv` → trace.
    pub fn from_verbosity(verbose: u8, quiet: bool, format: LogFormat) -> Self {
        let level = if quiet {
            LevelFilter::ERROR
        } else {
            match verbose {
                0 => LevelFilter::INFO,
                1 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            }
        };
        LogContext { level, format }
    }

    /// `RUST_LOG` directives win over the configured level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }

    pub fn dispatch(&self) -> Dispatch {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_target(false)
            .with_writer(std::io::stderr);
        match self.format {
            LogFormat::Text => Dispatch::new(builder.finish()),
            LogFormat::Json => Dispatch::new(builder.json().finish()),
        }
    }

    /// Run `f` with this context's subscriber active on the current thread.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch(), f)
    }
}
