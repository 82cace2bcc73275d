use std::path::PathBuf;

use crate::cli::config::Settings;
use crate::emi::calculator::expected_breakdown;
use crate::emi::loan::{LoanInput, TenureUnit};
use crate::report::console::format_console_report;
use crate::report::viewer::view_reports;
use crate::scenario::runner::{SuiteOptions, run_suite};
use crate::trace::logger::LogContext;

// ============================================================================
// run subcommand
// ============================================================================

/// Run the smoke scenarios and return whether all passed.
pub fn cmd_run(
    settings: &Settings,
    features: &str,
    tags: &str,
    open_reports: bool,
    log: LogContext,
) -> Result<bool, Box<dyn std::error::Error>> {
    let options = SuiteOptions {
        tags: tags.to_string(),
        log,
        ..SuiteOptions::new(PathBuf::from(features))
    };
    let run = run_suite(settings, &options)?;

    print!("{}", format_console_report(&run.report));
    println!("JSON report: {}", run.json_report.display());
    println!("HTML report: {}", run.html_report.display());

    if open_reports {
        view_reports(settings);
    }

    Ok(run.report.all_passed())
}

// ============================================================================
// open-reports subcommand
// ============================================================================

pub fn cmd_open_reports(settings: &Settings) {
    view_reports(settings);
}

// ============================================================================
// emi subcommand
// ============================================================================

/// Expected figures for a loan, formatted for the terminal.
pub fn cmd_emi(amount: u64, rate: f64, tenure: u32, unit: &str) -> Result<String, Box<dyn std::error::Error>> {
    let unit: TenureUnit = unit.parse()?;
    let input = LoanInput::new(amount, rate, tenure, unit)?;
    let breakdown = expected_breakdown(&input);

    let mut out = String::new();
    out.push_str(&format!(
        "Loan: {} at {}% for {} {}(s) ({} months)\n",
        input.amount,
        input.annual_rate,
        input.tenure,
        input.unit,
        input.tenure_in_months()
    ));
    out.push_str(&format!("Monthly EMI:           {}\n", breakdown.monthly_payment));
    out.push_str(&format!("Total interest:        {}\n", breakdown.total_interest));
    out.push_str(&format!("Total payment:         {}\n", breakdown.total_payment));
    out.push_str(&format!("First month interest:  {}\n", breakdown.first_month_interest));
    out.push_str(&format!("First month principal: {}\n", breakdown.first_month_principal));
    Ok(out)
}
