//! Element locators for the EMI calculator page. These xpaths are the
//! contract with the live site; a layout change on their side breaks them.

use crate::browser::webdriver::Locator;
use crate::emi::loan::{LoanType, TenureUnit};

pub const LOAN_AMOUNT_INPUT: &str = "//input[@id='loanamount']";
pub const INTEREST_RATE_INPUT: &str = "//input[@id='loaninterest']";
pub const TENURE_INPUT: &str = "//input[@id='loanterm']";
pub const TENURE_YEAR_TOGGLE: &str = "//div[@class='btn-group btn-group-toggle']//label[text()='Yr ']";
pub const TENURE_MONTH_TOGGLE: &str = "//div[@class='btn-group btn-group-toggle']//label[text()='Mo ']";
pub const EMI_AMOUNT: &str = "//div[@id='emiamount']//span";
pub const EMI_TOTAL_INTEREST: &str = "//div[@id='emitotalinterest']//span";
pub const EMI_TOTAL_AMOUNT: &str = "//div[@id='emitotalamount']//span";
pub const NAVBAR_TOGGLER: &str = "//button[@class='navbar-toggler']";
pub const CALCULATORS_MENU: &str = "//a[@title='Calculators']";
pub const HOME_LOAN_EMI_MENU_ITEM: &str =
    "//a[@title='Calculators']/following-sibling::ul//*[contains(text(),'Home Loan EMI Calculator')]";
pub const SCROLL_ROOT_TAG: &str = "html";

pub fn loan_type_tab(loan: LoanType) -> Locator {
    Locator::xpath(loan_type_tab_xpath(loan))
}

pub fn loan_type_tab_xpath(loan: LoanType) -> String {
    format!("//a[text()='{}']", loan.tab_label())
}

pub fn tenure_toggle(unit: TenureUnit) -> Locator {
    match unit {
        TenureUnit::Month => Locator::xpath(TENURE_MONTH_TOGGLE),
        TenureUnit::Year => Locator::xpath(TENURE_YEAR_TOGGLE),
    }
}

pub fn scroll_root() -> Locator {
    Locator::tag_name(SCROLL_ROOT_TAG)
}
