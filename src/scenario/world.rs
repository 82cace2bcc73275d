use std::sync::Arc;

use cucumber::World;
use thiserror::Error;

use crate::browser::driver_factory::DriverSource;
use crate::browser::element_util::ElementUtil;
use crate::browser::error::WebDriverError;
use crate::browser::outcome::Outcome;
use crate::browser::webdriver::WebDriver;
use crate::cli::config::Settings;
use crate::emi::calculator::EmiResult;
use crate::emi::loan::{LoanInput, LoanInputError, LoanType, TenureUnit};
use crate::page::emi_calculator_page::EmiCalculatorPage;
use crate::page::error::PageError;
use crate::scenario::context::ScenarioContext;

/// Why a step failed. Returned from step functions; cucumber reports the
/// `Display` text as the failure message.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("the EMI calculator page is not open")]
    NoPage,

    #[error("no EMI result has been read yet")]
    NoResult,

    #[error("{field} has not been entered in this scenario")]
    MissingInput { field: &'static str },

    #[error("{0}")]
    Interaction(String),

    #[error("expected {what} to be {expected}, but it was {actual}")]
    Mismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Driver(#[from] WebDriverError),

    #[error(transparent)]
    Input(#[from] LoanInputError),
}

impl StepError {
    pub fn mismatch(what: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        StepError::Mismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Unwrap a successful interaction or fail the step with its description.
pub fn require<T>(outcome: Outcome<T>) -> Result<T, StepError> {
    outcome
        .into_result::<()>()
        .map_err(|failed| StepError::Interaction(failed.to_string()))
}

/// Values typed into the form during the current scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnteredLoan {
    pub loan_type: Option<LoanType>,
    pub amount: Option<u64>,
    pub annual_rate: Option<f64>,
    pub tenure: Option<(u32, TenureUnit)>,
}

impl EnteredLoan {
    pub fn to_input(&self) -> Result<LoanInput, StepError> {
        let amount = self.amount.ok_or(StepError::MissingInput { field: "loan amount" })?;
        let rate = self.annual_rate.ok_or(StepError::MissingInput { field: "interest rate" })?;
        let (tenure, unit) = self.tenure.ok_or(StepError::MissingInput { field: "loan tenure" })?;
        Ok(LoanInput::new(amount, rate, tenure, unit)?)
    }
}

/// Per-scenario state. A fresh world is built for every scenario; the
/// browser session it owns is released when the world is dropped.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct EmiWorld {
    settings: Arc<Settings>,
    driver: DriverSource,
    context: ScenarioContext,
    page: Option<EmiCalculatorPage<Box<dyn WebDriver>>>,
    pub entered: EnteredLoan,
    pub result: Option<EmiResult>,
}

impl EmiWorld {
    pub fn new() -> Self {
        EmiWorld {
            settings: Arc::new(Settings::default()),
            driver: DriverSource::remote(),
            context: ScenarioContext::default(),
            page: None,
            entered: EnteredLoan::default(),
            result: None,
        }
    }

    /// Attach the suite settings, browser source and scenario identity
    /// before any step runs.
    pub fn begin(&mut self, settings: Arc<Settings>, driver: DriverSource, feature: &str, scenario: &str) {
        self.context = ScenarioContext::new(settings.browser.clone(), feature, scenario);
        self.settings = settings;
        self.driver = driver;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn context(&self) -> &ScenarioContext {
        &self.context
    }

    /// Start a browser and open the calculator.
    pub fn open_page(&mut self) -> Result<(), StepError> {
        tracing::info!(
            feature = %self.context.feature,
            scenario = %self.context.scenario,
            browser = %self.context.browser,
            "opening EMI calculator"
        );
        let driver = self.driver.connect(&self.settings)?;
        let util = ElementUtil::new(self.settings.timeouts, self.settings.screenshots_dir.clone());
        let page = EmiCalculatorPage::open(driver, util, self.settings.page_settings(), self.context.label())?;
        self.page = Some(page);
        Ok(())
    }

    pub fn page(&mut self) -> Result<&mut EmiCalculatorPage<Box<dyn WebDriver>>, StepError> {
        self.page.as_mut().ok_or(StepError::NoPage)
    }

    pub fn last_result(&self) -> Result<&EmiResult, StepError> {
        self.result.as_ref().ok_or(StepError::NoResult)
    }

    /// Quit the browser now instead of waiting for drop.
    pub fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close() {
                tracing::warn!(scenario = %self.context.scenario, error = %e, "failed to close browser");
            }
        }
    }
}

impl Default for EmiWorld {
    fn default() -> Self {
        Self::new()
    }
}
