use crate::report::report_model::{ScenarioResult, TestSuiteReport};

// ============================================================================
// HTML reporter: self-contained HTML report
// ============================================================================

const PASS_COLOR: &str = "#4CAF50";
const FAIL_COLOR: &str = "#f44336";

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #fafafa; color: #222; }
header { color: white; padding: 18px 28px; }
header h1 { margin: 0 0 6px 0; font-size: 22px; letter-spacing: 0.5px; }
main { max-width: 960px; margin: 16px auto; padding: 0 16px; }
table.summary { border-collapse: collapse; margin-bottom: 20px; }
table.summary td { padding: 4px 14px 4px 0; }
section.feature h2 { font-size: 18px; border-bottom: 1px solid #ddd; padding-bottom: 4px; }
details { background: white; margin: 8px 0; padding: 10px 14px; border-radius: 4px; box-shadow: 0 1px 2px rgba(0,0,0,0.08); }
details.passed summary::before { content: "\2713  "; color: #4CAF50; }
details.failed summary::before { content: "\2717  "; color: #f44336; }
summary { cursor: pointer; font-weight: 600; }
.meta { color: #666; font-size: 13px; margin: 6px 0; }
.tag { background: #e8eaf6; color: #283593; border-radius: 3px; padding: 0 5px; margin-right: 4px; font-size: 12px; }
.step { color: #b71c1c; font-weight: 600; }
pre { background: #fff3f3; padding: 8px; white-space: pre-wrap; font-size: 12px; }
"#;

/// Generate a single-file HTML report for a suite run.
///
/// Failed scenarios are rendered expanded with the failing step and the
/// full error text; passing ones are collapsed.
pub fn generate_html_report(report: &TestSuiteReport) -> String {
    let (color, headline) = if report.all_passed() {
        (PASS_COLOR, "ALL SCENARIOS PASSED")
    } else {
        (FAIL_COLOR, "SOME SCENARIOS FAILED")
    };
    let suite = escape_html(&report.suite_name);

    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{} - Cucumber Report</title>\n", suite));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    html.push_str(&format!(
        "<header style=\"background: {}\">\n<h1>{}</h1>\n<div>{}</div>\n</header>\n<main>\n",
        color, headline, suite
    ));

    html.push_str("<table class=\"summary\">\n");
    for (label, value) in [
        ("Scenarios", report.total.to_string()),
        ("Passed", report.passed.to_string()),
        ("Failed", report.failed.to_string()),
        (
            "Duration",
            report
                .duration_ms
                .map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ] {
        html.push_str(&format!("<tr><td>{}</td><td><b>{}</b></td></tr>\n", label, value));
    }
    html.push_str("</table>\n");

    for (feature, results) in report.by_feature() {
        html.push_str(&format!(
            "<section class=\"feature\">\n<h2>Feature: {}</h2>\n",
            escape_html(feature)
        ));
        for result in results {
            scenario_block(&mut html, result);
        }
        html.push_str("</section>\n");
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn scenario_block(html: &mut String, result: &ScenarioResult) {
    let (class, open) = if result.passed { ("passed", "") } else { ("failed", " open") };
    html.push_str(&format!(
        "<details class=\"{}\"{}>\n<summary>{}</summary>\n",
        class,
        open,
        escape_html(&result.name)
    ));

    let tags: String = result
        .tags
        .iter()
        .map(|t| format!("<span class=\"tag\">@{}</span>", escape_html(t)))
        .collect();
    html.push_str(&format!(
        "<div class=\"meta\">{} {}/{} steps, {}ms</div>\n",
        tags, result.steps_run, result.total_steps, result.duration_ms
    ));

    if !result.passed {
        if let Some(step) = &result.failed_step {
            html.push_str(&format!("<div class=\"step\">{}</div>\n", escape_html(step)));
        }
        if let Some(error) = &result.error {
            html.push_str(&format!("<pre>{}</pre>\n", escape_html(error)));
        }
    }
    html.push_str("</details>\n");
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
