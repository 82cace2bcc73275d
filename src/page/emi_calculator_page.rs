use tracing::{debug, info};

use crate::browser::element_util::ElementUtil;
use crate::browser::error::WebDriverError;
use crate::browser::outcome::Outcome;
use crate::browser::webdriver::{ElementRef, Locator, WebDriver, replace_value_keys};
use crate::emi::calculator::{EmiResult, strip_separators};
use crate::emi::loan::{LoanType, TenureUnit};
use crate::page::error::PageError;
use crate::page::locators;

/// URLs the page object needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSettings {
    /// Where the calculator lives
    pub calculator_url: String,
    /// Expected target of the "Home Loan EMI Calculator" menu item
    pub home_loan_emi_url: String,
}

/// Case-insensitive comparison of the configured and actual destinations.
pub fn destination_matches(expected: &str, actual: &str) -> bool {
    expected.to_lowercase() == actual.to_lowercase()
}

/// Page object for the EMI calculator.
///
/// Actions return `Ok(Outcome::Success(..))` when they went through,
/// `Ok(Outcome::NotFound | Outcome::Timeout)` when an element was missing
/// or hidden, and `Err` for anything that should abort the scenario.
#[derive(Debug)]
pub struct EmiCalculatorPage<D: WebDriver> {
    driver: D,
    util: ElementUtil,
    settings: PageSettings,
    /// Screenshot folder name, normally browser + scenario
    label: String,
}

impl<D: WebDriver> EmiCalculatorPage<D> {
    /// Navigate to the calculator URL and wait for it to load.
    pub fn open(
        mut driver: D,
        util: ElementUtil,
        settings: PageSettings,
        label: impl Into<String>,
    ) -> Result<Self, PageError> {
        info!(url = %settings.calculator_url, "opening EMI calculator");
        driver.navigate(&settings.calculator_url)?;
        Self::new(driver, util, settings, label)
    }

    /// Wrap a driver already on the page. Fails if the page does not
    /// finish loading.
    pub fn new(
        mut driver: D,
        util: ElementUtil,
        settings: PageSettings,
        label: impl Into<String>,
    ) -> Result<Self, PageError> {
        match util.wait_until_page_loaded(&mut driver)? {
            Outcome::Success(()) => Ok(EmiCalculatorPage {
                driver,
                util,
                settings,
                label: label.into(),
            }),
            stuck => Err(PageError::PageLoad(stuck)),
        }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// scroll, verify, highlight, act, screenshot, unhighlight. The highlight
    /// is removed even when the action fails.
    fn act_highlighted<F>(&mut self, target: &Locator, tag: &str, act: F) -> Result<Outcome, PageError>
    where
        F: FnOnce(&mut D, &ElementRef) -> Result<(), WebDriverError>,
    {
        let scrolled = self
            .util
            .scroll_into_view_and_verify(&mut self.driver, target, &locators::scroll_root())?;
        if let Err(failed) = scrolled.into_result() {
            debug!(%target, %failed, tag, "element not ready");
            return Ok(failed);
        }

        let element = self.driver.find_element(target)?;
        self.util.highlight(&mut self.driver, &element);
        let acted = act(&mut self.driver, &element);
        if acted.is_ok() {
            self.util.take_screenshot(&mut self.driver, &self.label, tag);
        }
        self.util.unhighlight(&mut self.driver, &element);
        acted?;
        Ok(Outcome::success())
    }

    /// Highlighted click on an element that is already verified.
    fn click_highlighted(&mut self, target: &Locator) -> Result<(), PageError> {
        let element = self.driver.find_element(target)?;
        self.util.highlight(&mut self.driver, &element);
        let clicked = self.driver.click(&element);
        self.util.unhighlight(&mut self.driver, &element);
        Ok(clicked?)
    }

    pub fn click_loan_type_tab(&mut self, loan: LoanType) -> Result<Outcome, PageError> {
        self.act_highlighted(&locators::loan_type_tab(loan), "click_loan_type_tab", |d, el| d.click(el))
    }

    pub fn set_loan_amount(&mut self, amount: u64) -> Result<Outcome, PageError> {
        let keys = replace_value_keys(&amount.to_string());
        self.act_highlighted(&Locator::xpath(locators::LOAN_AMOUNT_INPUT), "set_loan_amount", |d, el| {
            d.send_keys(el, &keys)
        })
    }

    pub fn set_interest_rate(&mut self, annual_rate: f64) -> Result<Outcome, PageError> {
        let keys = replace_value_keys(&annual_rate.to_string());
        self.act_highlighted(&Locator::xpath(locators::INTEREST_RATE_INPUT), "set_interest_rate", |d, el| {
            d.send_keys(el, &keys)
        })
    }

    /// Select the tenure unit toggle, then type the tenure.
    pub fn set_tenure(&mut self, tenure: u32, unit: TenureUnit) -> Result<Outcome, PageError> {
        let input = Locator::xpath(locators::TENURE_INPUT);
        let scrolled = self
            .util
            .scroll_into_view_and_verify(&mut self.driver, &input, &locators::scroll_root())?;
        if let Err(failed) = scrolled.into_result() {
            return Ok(failed);
        }
        for toggle in [TenureUnit::Month, TenureUnit::Year] {
            if let Err(failed) = self.util.verify(&mut self.driver, &locators::tenure_toggle(toggle))?.into_result() {
                return Ok(failed);
            }
        }

        self.click_highlighted(&locators::tenure_toggle(unit))?;

        let keys = replace_value_keys(&tenure.to_string());
        self.act_highlighted(&input, "set_tenure", |d, el| d.send_keys(el, &keys))
    }

    /// Highlighted read of an input's `value`, separators stripped.
    fn read_input(&mut self, target: &Locator) -> Result<Outcome<String>, PageError> {
        if let Err(failed) = self.util.verify(&mut self.driver, target)?.into_result() {
            return Ok(failed);
        }
        let element = self.driver.find_element(target)?;
        self.util.highlight(&mut self.driver, &element);
        let value = self.driver.property(&element, "value");
        self.util.unhighlight(&mut self.driver, &element);
        Ok(Outcome::Success(strip_separators(&value?.unwrap_or_default())))
    }

    pub fn read_loan_amount(&mut self) -> Result<Outcome<u64>, PageError> {
        let raw = match self.read_input(&Locator::xpath(locators::LOAN_AMOUNT_INPUT))?.into_result() {
            Ok(raw) => raw,
            Err(failed) => return Ok(failed),
        };
        parse_input("loan amount", &raw).map(Outcome::Success)
    }

    pub fn read_interest_rate(&mut self) -> Result<Outcome<f64>, PageError> {
        let raw = match self.read_input(&Locator::xpath(locators::INTEREST_RATE_INPUT))?.into_result() {
            Ok(raw) => raw,
            Err(failed) => return Ok(failed),
        };
        parse_input("interest rate", &raw).map(Outcome::Success)
    }

    /// Switch the tenure toggle to months and read the converted value.
    pub fn read_tenure_in_months(&mut self) -> Result<Outcome<u32>, PageError> {
        let month_toggle = locators::tenure_toggle(TenureUnit::Month);
        if let Err(failed) = self.util.verify(&mut self.driver, &month_toggle)?.into_result() {
            return Ok(failed);
        }
        self.click_highlighted(&month_toggle)?;

        let raw = match self.read_input(&Locator::xpath(locators::TENURE_INPUT))?.into_result() {
            Ok(raw) => raw,
            Err(failed) => return Ok(failed),
        };
        parse_input("loan tenure", &raw).map(Outcome::Success)
    }

    /// Read the three result figures and derive the first-month split.
    /// Every result element must be visible first.
    pub fn read_emi_result(&mut self) -> Result<Outcome<EmiResult>, PageError> {
        let emi_amount = Locator::xpath(locators::EMI_AMOUNT);
        let total_interest = Locator::xpath(locators::EMI_TOTAL_INTEREST);
        let total_amount = Locator::xpath(locators::EMI_TOTAL_AMOUNT);

        let scrolled = self
            .util
            .scroll_into_view_and_verify(&mut self.driver, &emi_amount, &locators::scroll_root())?;
        if let Err(failed) = scrolled.into_result() {
            return Ok(failed);
        }
        for target in [&total_interest, &total_amount] {
            if let Err(failed) = self.util.verify(&mut self.driver, target)?.into_result() {
                return Ok(failed);
            }
        }

        let rate_raw = self.input_value(locators::INTEREST_RATE_INPUT)?;
        let amount_raw = self.input_value(locators::LOAN_AMOUNT_INPUT)?;
        let annual_rate: f64 = parse_input("interest rate", &rate_raw)?;
        let amount: u64 = parse_input("loan amount", &amount_raw)?;

        let elements = [
            self.driver.find_element(&emi_amount)?,
            self.driver.find_element(&total_interest)?,
            self.driver.find_element(&total_amount)?,
        ];
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            texts.push(self.driver.text(element)?);
        }

        for element in &elements {
            self.util.highlight(&mut self.driver, element);
        }
        self.util.take_screenshot(&mut self.driver, &self.label, "read_emi_result");
        for element in &elements {
            self.util.unhighlight(&mut self.driver, element);
        }

        let result = EmiResult::from_display(amount, annual_rate, &texts[0], &texts[1], &texts[2])?;
        info!(
            monthly = result.monthly_payment,
            total_interest = result.total_interest,
            total_payment = result.total_payment,
            "EMI result read"
        );
        Ok(Outcome::Success(result))
    }

    fn input_value(&mut self, xpath: &str) -> Result<String, PageError> {
        let element = self.driver.find_element(&Locator::xpath(xpath))?;
        let value = self.driver.property(&element, "value")?;
        Ok(strip_separators(&value.unwrap_or_default()))
    }

    /// Open Calculators → Home Loan EMI Calculator from the navbar.
    ///
    /// On narrow layouts the menu sits behind the navbar toggler, which is
    /// only opened when the menu is not directly visible. The item's link
    /// is checked against the configured URL before clicking.
    pub fn navigate_to_calculator_via_menu(&mut self) -> Result<Outcome, PageError> {
        let menu = Locator::xpath(locators::CALCULATORS_MENU);
        let item = Locator::xpath(locators::HOME_LOAN_EMI_MENU_ITEM);
        let toggler = Locator::xpath(locators::NAVBAR_TOGGLER);

        let short = self.util.timeouts().short;
        if !self.util.verify_presence(&mut self.driver, &menu, short)?.is_success() {
            debug!("calculators menu hidden, opening navbar toggler");
            if let Err(failed) = self.util.verify(&mut self.driver, &toggler)?.into_result() {
                return Ok(failed);
            }
            self.util.click_until_target_appears(&mut self.driver, &toggler, &menu)?;
            if let Err(failed) = self.util.verify(&mut self.driver, &menu)?.into_result() {
                return Ok(failed);
            }
        }

        let menu_element = self.driver.find_element(&menu)?;
        self.util.highlight(&mut self.driver, &menu_element);
        let opened = self.util.click_until_target_appears(&mut self.driver, &menu, &item);
        self.util.unhighlight(&mut self.driver, &menu_element);
        if let Err(failed) = opened?.into_result() {
            return Ok(failed);
        }

        let item_element = self.driver.find_element(&item)?;
        self.util.highlight(&mut self.driver, &item_element);
        self.util
            .take_screenshot(&mut self.driver, &self.label, "navigate_to_calculator_via_menu");
        let href = self.driver.property(&item_element, "href");
        self.util.unhighlight(&mut self.driver, &item_element);

        let actual = href?.unwrap_or_default();
        if !destination_matches(&self.settings.home_loan_emi_url, &actual) {
            return Err(PageError::WrongDestination {
                expected: self.settings.home_loan_emi_url.clone(),
                actual,
            });
        }

        self.driver.click(&item_element)?;
        info!(url = %actual, "navigated to home loan EMI calculator");
        Ok(Outcome::success())
    }

    pub fn current_url(&mut self) -> Result<String, PageError> {
        Ok(self.driver.current_url()?)
    }

    /// End the browser session.
    pub fn close(mut self) -> Result<(), PageError> {
        Ok(self.driver.quit()?)
    }
}

fn parse_input<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, PageError> {
    raw.trim().parse().map_err(|_| PageError::InvalidInput {
        field,
        raw: raw.to_string(),
    })
}
