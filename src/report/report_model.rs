use serde::{Deserialize, Serialize};

use crate::report::cucumber_json::{Element, Feature, StepStatus};

// ============================================================================
// Scenario result: one executed scenario, backgrounds folded in
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub feature: String,

    pub name: String,

    /// Scenario and feature tags, without `@`
    pub tags: Vec<String>,

    pub passed: bool,

    /// Steps that ran to completion, passed or failed
    pub steps_run: usize,

    pub total_steps: usize,

    /// `Keyword text` of the first step that did not pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u128,
}

impl ScenarioResult {
    /// Build from a scenario element and any background elements that ran
    /// before it.
    pub fn from_elements(feature: &Feature, backgrounds: &[&Element], scenario: &Element) -> Self {
        let steps: Vec<_> = backgrounds
            .iter()
            .flat_map(|b| b.steps.iter())
            .chain(scenario.steps.iter())
            .collect();

        let steps_run = steps
            .iter()
            .filter(|s| matches!(s.result.status, StepStatus::Passed | StepStatus::Failed))
            .count();
        let first_bad = steps.iter().find(|s| !s.result.status.is_passed());
        let duration_ns: u64 = steps.iter().filter_map(|s| s.result.duration).sum();

        let mut tags: Vec<String> = feature
            .tags
            .iter()
            .chain(scenario.tags.iter())
            .map(|t| t.name.trim_start_matches('@').to_string())
            .collect();
        tags.sort();
        tags.dedup();

        ScenarioResult {
            feature: feature.name.clone(),
            name: scenario.name.clone(),
            tags,
            passed: !steps.is_empty() && first_bad.is_none(),
            steps_run,
            total_steps: steps.len(),
            failed_step: first_bad.map(|s| format!("{}{}", s.keyword, s.name)),
            error: first_bad.map(|s| {
                s.result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("step {:?}", s.result.status).to_lowercase())
            }),
            duration_ms: u128::from(duration_ns / 1_000_000),
        }
    }
}

// ============================================================================
// Test suite report: aggregates scenario results
// ============================================================================

/// Aggregated report for one suite run.
///
/// Consumed by the console and HTML reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteReport {
    pub suite_name: String,

    pub total: usize,

    pub passed: usize,

    pub failed: usize,

    /// Wall-clock duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub scenario_results: Vec<ScenarioResult>,
}

impl TestSuiteReport {
    /// Computes total, passed, and failed counts.
    pub fn from_results(suite_name: &str, results: Vec<ScenarioResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;
        Self {
            suite_name: suite_name.to_string(),
            total,
            passed,
            failed,
            duration_ms: None,
            scenario_results: results,
        }
    }

    /// One result per scenario in a parsed cucumber JSON report.
    pub fn from_features(suite_name: &str, features: &[Feature]) -> Self {
        let mut results = Vec::new();
        for feature in features {
            let mut backgrounds = Vec::new();
            for element in &feature.elements {
                if element.is_background() {
                    backgrounds.push(element);
                } else {
                    results.push(ScenarioResult::from_elements(feature, &backgrounds, element));
                    backgrounds.clear();
                }
            }
        }
        Self::from_results(suite_name, results)
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Scenario results grouped by feature name, in first-seen order.
    pub fn by_feature(&self) -> Vec<(&str, Vec<&ScenarioResult>)> {
        let mut groups: Vec<(&str, Vec<&ScenarioResult>)> = Vec::new();
        for result in &self.scenario_results {
            match groups.iter_mut().find(|(name, _)| *name == result.feature.as_str()) {
                Some((_, members)) => members.push(result),
                None => groups.push((result.feature.as_str(), vec![result])),
            }
        }
        groups
    }
}
