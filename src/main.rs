use clap::Parser;
use emi_smoke::cli::commands::{cmd_emi, cmd_open_reports, cmd_run};
use emi_smoke::cli::config::{Cli, Commands, Settings};
use emi_smoke::trace::logger::{LogContext, LogFormat};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format: LogFormat = cli.log_format.parse()?;
    let log = LogContext::from_verbosity(cli.verbose, cli.quiet, format);

    let all_passed = log.scope(|| run(cli, log))?;
    if !all_passed {
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli, log: LogContext) -> Result<bool, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            features,
            tags,
            browser,
            headless,
            no_open_reports,
        } => {
            if let Some(browser) = browser {
                settings.browser = browser;
            }
            settings.headless |= headless;
            cmd_run(&settings, &features, &tags, !no_open_reports, log)
        }
        Commands::OpenReports => {
            cmd_open_reports(&settings);
            Ok(true)
        }
        Commands::Emi {
            amount,
            rate,
            tenure,
            unit,
        } => {
            print!("{}", cmd_emi(amount, rate, tenure, &unit)?);
            Ok(true)
        }
    }
}
