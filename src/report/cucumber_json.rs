use serde::{Deserialize, Serialize};

// ============================================================================
// Cucumber JSON report format (the array written by the JSON writer)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub keyword: String,

    pub name: String,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Scenarios and backgrounds
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub keyword: String,

    /// `"scenario"` or `"background"`
    #[serde(rename = "type", default)]
    pub kind: String,

    pub name: String,

    #[serde(default)]
    pub line: usize,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Element {
    pub fn is_background(&self) -> bool {
        self.kind.eq_ignore_ascii_case("background")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub keyword: String,

    pub name: String,

    #[serde(default)]
    pub line: usize,

    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,

    /// Nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
    Undefined,
    Pending,
    Ambiguous,
    #[serde(other)]
    Unknown,
}

impl StepStatus {
    pub fn is_passed(self) -> bool {
        self == StepStatus::Passed
    }
}

/// Parse the contents of a cucumber JSON report.
pub fn parse_report(content: &str) -> Result<Vec<Feature>, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content)
}
