/// Identity of the scenario being executed.
///
/// Handed to the page object explicitly so screenshots land in a folder
/// named after the browser and scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    pub browser: String,
    pub feature: String,
    pub scenario: String,
}

impl ScenarioContext {
    pub fn new(browser: impl Into<String>, feature: impl Into<String>, scenario: impl Into<String>) -> Self {
        ScenarioContext {
            browser: browser.into(),
            feature: feature.into(),
            scenario: scenario.into(),
        }
    }

    /// Screenshot folder label, e.g. `chrome_Car loan first month split`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.browser, self.scenario)
    }
}

impl Default for ScenarioContext {
    fn default() -> Self {
        ScenarioContext::new("unknown", "", "unnamed scenario")
    }
}
