use crate::report::report_model::{ScenarioResult, TestSuiteReport};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a suite report for terminal output, one block per feature.
///
/// ```text
/// === Test Suite: emi-smoke (@smoke) ===
///
/// Feature: EMI calculator
///   ✓ PASS  Car loan first month split (10/10 steps, 4.2s)
///   ✗ FAIL  Home Loan EMI Calculator from the menu (2/3 steps, 1.1s)
///       at:  When I open the Home Loan EMI Calculator from the menu
///       why: not found: xpath=//a[@title='Calculators']
///
/// === Results: 1 passed, 1 failed (2 total) in 5.3s ===
/// ```
pub fn format_console_report(report: &TestSuiteReport) -> String {
    let mut out = format!("=== Test Suite: {} ===\n\n", report.suite_name);

    let features = report.by_feature();
    if features.is_empty() {
        out.push_str("(no scenarios matched)\n");
    }

    for (feature, results) in features {
        out.push_str(&format!("Feature: {}\n", feature));
        for result in results {
            scenario_line(&mut out, result);
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));
    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {}", seconds(ms)));
    }
    out.push_str(" ===\n");

    out
}

fn scenario_line(out: &mut String, result: &ScenarioResult) {
    let marker = if result.passed { "\u{2713} PASS" } else { "\u{2717} FAIL" };
    out.push_str(&format!(
        "  {}  {} ({}/{} steps, {})\n",
        marker,
        result.name,
        result.steps_run,
        result.total_steps,
        seconds(result.duration_ms)
    ));
    if result.passed {
        return;
    }
    if let Some(step) = &result.failed_step {
        out.push_str(&format!("      at:  {}\n", step));
    }
    // cucumber error messages can carry a backtrace after the first line
    let why = result.error.as_deref().and_then(|e| e.lines().next()).unwrap_or("scenario failed");
    out.push_str(&format!("      why: {}\n", why));
}

fn seconds(ms: u128) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}
