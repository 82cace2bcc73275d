use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};

use emi_smoke::browser::element_util::Timeouts;
use emi_smoke::browser::error::WebDriverError;
use emi_smoke::browser::webdriver::{ElementRef, Locator, WebDriver, keys};
use emi_smoke::emi::loan::{LoanType, TenureUnit};
use emi_smoke::page::emi_calculator_page::PageSettings;
use emi_smoke::page::locators;

pub const CALCULATOR_URL: &str = "https://emicalculator.net/";
pub const HOME_LOAN_URL: &str = "https://emicalculator.net/home-loan-emi-calculator/";

/// Millisecond-scale waits so timeout paths finish quickly.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        page_load: Duration::from_millis(200),
        element: Duration::from_millis(80),
        short: Duration::from_millis(20),
        poll: Duration::from_millis(5),
        click_retries: 3,
    }
}

pub fn page_settings() -> PageSettings {
    PageSettings {
        calculator_url: CALCULATOR_URL.to_string(),
        home_loan_emi_url: HOME_LOAN_URL.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    Find(String),
    Click(String),
    SendKeys(String, String),
    Script(String),
    Screenshot,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub displayed: bool,
    /// `is_displayed` calls answered `false` before the element shows
    pub hidden_polls: u32,
    /// Hidden until a scroll script brings it into the viewport
    pub below_fold: bool,
    pub text: String,
    pub value: Option<String>,
    pub href: Option<String>,
}

impl FakeElement {
    pub fn visible() -> Self {
        FakeElement {
            displayed: true,
            ..Default::default()
        }
    }

    pub fn hidden() -> Self {
        FakeElement::default()
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn below_fold() -> Self {
        FakeElement {
            below_fold: true,
            ..Default::default()
        }
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }
}

/// What clicking an element does to the fake page.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickEffect {
    /// Make another element (by locator value) visible
    Reveal(String),
    /// Switch the tenure toggle, converting the tenure input
    TenureUnit(TenureUnit),
    /// Follow a link
    Navigate(String),
}

/// Scripted in-memory browser keyed by locator value.
///
/// Element handles are the locator values themselves. The calculator
/// preset recomputes the three result figures whenever amount, rate or
/// tenure is typed, the way the live page does.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub elements: HashMap<String, FakeElement>,
    pub effects: HashMap<String, Vec<ClickEffect>>,
    /// Clicks on these locators fail as not-interactable this many times
    pub click_failures: HashMap<String, u32>,
    pub ready_state: String,
    pub url: String,
    pub calls: Vec<Call>,
    pub fail_screenshots: bool,
    pub tenure_unit: Option<TenureUnit>,
    pub quit_called: bool,
}

impl FakeDriver {
    pub fn new() -> Self {
        FakeDriver {
            ready_state: "complete".to_string(),
            ..Default::default()
        }
    }

    pub fn with(mut self, locator: &str, element: FakeElement) -> Self {
        self.elements.insert(locator.to_string(), element);
        self
    }

    pub fn on_click(mut self, locator: &str, effect: ClickEffect) -> Self {
        self.effects.entry(locator.to_string()).or_default().push(effect);
        self
    }

    /// The calculator page with default inputs, a visible navbar menu whose
    /// Home Loan item links to `home_loan_href`.
    pub fn calculator(home_loan_href: &str) -> Self {
        let mut driver = FakeDriver::new()
            .with(locators::SCROLL_ROOT_TAG, FakeElement::visible())
            .with(locators::LOAN_AMOUNT_INPUT, FakeElement::visible().with_value("25,00,000"))
            .with(locators::INTEREST_RATE_INPUT, FakeElement::visible().with_value("10"))
            .with(locators::TENURE_INPUT, FakeElement::visible().with_value("20"))
            .with(locators::TENURE_YEAR_TOGGLE, FakeElement::visible())
            .with(locators::TENURE_MONTH_TOGGLE, FakeElement::visible())
            .with(locators::EMI_AMOUNT, FakeElement::visible())
            .with(locators::EMI_TOTAL_INTEREST, FakeElement::visible())
            .with(locators::EMI_TOTAL_AMOUNT, FakeElement::visible())
            .with(locators::NAVBAR_TOGGLER, FakeElement::hidden())
            .with(locators::CALCULATORS_MENU, FakeElement::visible())
            .with(
                locators::HOME_LOAN_EMI_MENU_ITEM,
                FakeElement::hidden().with_href(home_loan_href),
            )
            .on_click(locators::TENURE_YEAR_TOGGLE, ClickEffect::TenureUnit(TenureUnit::Year))
            .on_click(locators::TENURE_MONTH_TOGGLE, ClickEffect::TenureUnit(TenureUnit::Month))
            .on_click(
                locators::CALCULATORS_MENU,
                ClickEffect::Reveal(locators::HOME_LOAN_EMI_MENU_ITEM.to_string()),
            )
            .on_click(locators::HOME_LOAN_EMI_MENU_ITEM, ClickEffect::Navigate(home_loan_href.to_string()));
        for loan in [LoanType::Home, LoanType::Personal, LoanType::Car] {
            driver = driver.with(&locators::loan_type_tab_xpath(loan), FakeElement::visible());
        }
        driver.tenure_unit = Some(TenureUnit::Year);
        driver.url = CALCULATOR_URL.to_string();
        driver.recompute();
        driver
    }

    /// Narrow layout: the menu is hidden behind the navbar toggler.
    pub fn collapsed_menu(mut self) -> Self {
        self.element_mut(locators::NAVBAR_TOGGLER).displayed = true;
        self.element_mut(locators::CALCULATORS_MENU).displayed = false;
        self.on_click(
            locators::NAVBAR_TOGGLER,
            ClickEffect::Reveal(locators::CALCULATORS_MENU.to_string()),
        )
    }

    pub fn element_mut(&mut self, locator: &str) -> &mut FakeElement {
        self.elements.entry(locator.to_string()).or_default()
    }

    pub fn value_of(&self, locator: &str) -> Option<String> {
        self.elements.get(locator).and_then(|e| e.value.clone())
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Click(target) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Script(script) => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    fn element(&self, handle: &ElementRef) -> Result<&FakeElement, WebDriverError> {
        self.elements
            .get(&handle.0)
            .ok_or_else(|| WebDriverError::StaleElement(handle.0.clone()))
    }

    fn numeric_input(&self, locator: &str) -> Option<f64> {
        self.value_of(locator)?.replace(',', "").trim().parse().ok()
    }

    /// Refresh the result figures from the current inputs.
    fn recompute(&mut self) {
        let (Some(amount), Some(rate), Some(tenure)) = (
            self.numeric_input(locators::LOAN_AMOUNT_INPUT),
            self.numeric_input(locators::INTEREST_RATE_INPUT),
            self.numeric_input(locators::TENURE_INPUT),
        ) else {
            return;
        };
        let months = match self.tenure_unit {
            Some(TenureUnit::Month) => tenure,
            _ => tenure * 12.0,
        };
        let r = rate / 12.0 / 100.0;
        let emi = if r == 0.0 {
            amount / months
        } else {
            let growth = (1.0 + r).powf(months);
            amount * r * growth / (growth - 1.0)
        };
        let total = (emi * months).round();
        self.element_mut(locators::EMI_AMOUNT).text = format!("\u{20b9} {}", indian_grouping(emi.round() as u64));
        self.element_mut(locators::EMI_TOTAL_INTEREST).text = format!("\u{20b9} {}", indian_grouping((total - amount) as u64));
        self.element_mut(locators::EMI_TOTAL_AMOUNT).text = format!("\u{20b9} {}", indian_grouping(total as u64));
    }

    fn switch_tenure_unit(&mut self, unit: TenureUnit) {
        let current = self.tenure_unit.unwrap_or(TenureUnit::Year);
        if current == unit {
            return;
        }
        if let Some(tenure) = self.numeric_input(locators::TENURE_INPUT) {
            let converted = match unit {
                TenureUnit::Month => tenure * 12.0,
                TenureUnit::Year => (tenure / 12.0).round(),
            };
            self.element_mut(locators::TENURE_INPUT).value = Some(format!("{}", converted));
        }
        self.tenure_unit = Some(unit);
    }
}

/// `1234567` → `12,34,567`
pub fn indian_grouping(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Strip the select-all prefix and Enter suffix the page object sends.
fn typed_value(keys_sent: &str) -> String {
    let after_select = keys_sent.rsplit(keys::NULL).next().unwrap_or(keys_sent);
    after_select.trim_end_matches(keys::ENTER).to_string()
}

impl WebDriver for FakeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError> {
        self.calls.push(Call::Navigate(url.to_string()));
        self.url = url.to_string();
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, WebDriverError> {
        Ok(self.url.clone())
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        self.calls.push(Call::Find(locator.value().to_string()));
        if self.elements.contains_key(locator.value()) {
            Ok(ElementRef(locator.value().to_string()))
        } else {
            Err(WebDriverError::NoSuchElement(locator.to_string()))
        }
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError> {
        let el = self
            .elements
            .get_mut(&element.0)
            .ok_or_else(|| WebDriverError::StaleElement(element.0.clone()))?;
        if el.hidden_polls > 0 {
            el.hidden_polls -= 1;
            return Ok(false);
        }
        Ok(el.displayed)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError> {
        self.element(element)?;
        if let Some(remaining) = self.click_failures.get_mut(&element.0) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WebDriverError::NotInteractable(element.0.clone()));
            }
        }
        self.calls.push(Call::Click(element.0.clone()));
        for effect in self.effects.get(&element.0).cloned().unwrap_or_default() {
            match effect {
                ClickEffect::Reveal(target) => self.element_mut(&target).displayed = true,
                ClickEffect::TenureUnit(unit) => self.switch_tenure_unit(unit),
                ClickEffect::Navigate(url) => self.url = url,
            }
        }
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        self.element(element)?;
        self.calls.push(Call::SendKeys(element.0.clone(), text.to_string()));
        self.element_mut(&element.0).value = Some(typed_value(text));
        self.recompute();
        Ok(())
    }

    fn property(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, WebDriverError> {
        let el = self.element(element)?;
        Ok(match name {
            "value" => el.value.clone(),
            "href" => el.href.clone(),
            _ => None,
        })
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, WebDriverError> {
        Ok(self.element(element)?.text.clone())
    }

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError> {
        self.calls.push(Call::Script(script.to_string()));
        if script.contains("document.readyState") {
            return Ok(json!(self.ready_state));
        }
        if script.contains("scrollIntoView") {
            if let Some(target) = args.first().and_then(ElementRef::from_json) {
                let el = self.element_mut(&target.0);
                if el.below_fold {
                    el.displayed = true;
                }
            }
        }
        Ok(Value::Null)
    }

    fn screenshot_png(&mut self) -> Result<Vec<u8>, WebDriverError> {
        self.calls.push(Call::Screenshot);
        if self.fail_screenshots {
            return Err(WebDriverError::StaleElement("window closed".into()));
        }
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    fn quit(&mut self) -> Result<(), WebDriverError> {
        self.calls.push(Call::Quit);
        self.quit_called = true;
        Ok(())
    }
}
