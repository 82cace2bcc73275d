use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emi::loan::LoanInput;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not read {field} from displayed text '{raw}'")]
pub struct DisplayParseError {
    pub field: &'static str,
    pub raw: String,
}

/// EMI figures as rendered by the page, plus the first-month split derived
/// from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiResult {
    pub monthly_payment: u64,
    pub total_interest: u64,
    pub total_payment: u64,
    pub first_month_interest: u64,
    pub first_month_principal: i64,
}

impl EmiResult {
    /// Build from the three result texts and the loan inputs read back from
    /// the form.
    pub fn from_display(
        amount: u64,
        annual_rate: f64,
        monthly_text: &str,
        interest_text: &str,
        total_text: &str,
    ) -> Result<Self, DisplayParseError> {
        let monthly_payment = parse_field("monthly payment", monthly_text)?;
        let total_interest = parse_field("total interest", interest_text)?;
        let total_payment = parse_field("total payment", total_text)?;

        let first_month_interest = first_month_interest(amount, annual_rate);
        Ok(EmiResult {
            monthly_payment,
            total_interest,
            total_payment,
            first_month_interest,
            first_month_principal: first_month_principal(monthly_payment, first_month_interest),
        })
    }

    /// First-month interest and principal add back up to the instalment.
    pub fn split_is_consistent(&self) -> bool {
        self.first_month_interest as i64 + self.first_month_principal == self.monthly_payment as i64
    }
}

fn parse_field(field: &'static str, raw: &str) -> Result<u64, DisplayParseError> {
    parse_display_amount(raw).ok_or_else(|| DisplayParseError {
        field,
        raw: raw.to_string(),
    })
}

/// Parse a rendered currency value such as "₹ 10,258" or "6,15,496".
///
/// Grouping separators, currency symbols and whitespace are dropped;
/// fractional values are rounded to the nearest unit.
pub fn parse_display_amount(text: &str) -> Option<u64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    Some(value.round() as u64)
}

/// Strip grouping commas from an input's `value`.
pub fn strip_separators(text: &str) -> String {
    text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

/// `round(annual_rate / 12 / 100 * principal)`
pub fn first_month_interest(principal: u64, annual_rate: f64) -> u64 {
    (annual_rate / 12.0 / 100.0 * principal as f64).round() as u64
}

/// Instalment minus first-month interest. Signed: a page bug could make it
/// negative and the assertion should see that.
pub fn first_month_principal(monthly_payment: u64, first_month_interest: u64) -> i64 {
    monthly_payment as i64 - first_month_interest as i64
}

/// Unrounded instalment from the standard reducing-balance formula
/// `P·r·(1+r)^n / ((1+r)^n − 1)`.
pub fn monthly_instalment(input: &LoanInput) -> f64 {
    let principal = input.amount as f64;
    let months = input.tenure_in_months() as f64;
    let r = input.annual_rate / 12.0 / 100.0;
    if r == 0.0 {
        return principal / months;
    }
    let growth = (1.0 + r).powf(months);
    principal * r * growth / (growth - 1.0)
}

/// Figures the page is expected to show for `input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiBreakdown {
    pub monthly_payment: u64,
    pub total_payment: u64,
    pub total_interest: u64,
    pub first_month_interest: u64,
    pub first_month_principal: i64,
}

pub fn expected_breakdown(input: &LoanInput) -> EmiBreakdown {
    let instalment = monthly_instalment(input);
    let monthly_payment = instalment.round() as u64;
    let total_payment = (instalment * input.tenure_in_months() as f64).round() as u64;
    let first_month_interest = first_month_interest(input.amount, input.annual_rate);
    EmiBreakdown {
        monthly_payment,
        total_payment,
        total_interest: total_payment.saturating_sub(input.amount),
        first_month_interest,
        first_month_principal: first_month_principal(monthly_payment, first_month_interest),
    }
}

/// Whether `actual` is within `tolerance` units of `expected`.
pub fn approx_eq(actual: u64, expected: u64, tolerance: u64) -> bool {
    actual.abs_diff(expected) <= tolerance
}
