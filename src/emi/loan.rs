use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanInputError {
    #[error("loan amount must be positive")]
    ZeroAmount,

    #[error("interest rate must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("loan tenure must be positive")]
    ZeroTenure,

    #[error("loan tenure of {tenure} {unit}(s) is too long to count in months")]
    TenureTooLong { tenure: u32, unit: TenureUnit },

    #[error("unknown tenure unit '{0}' (expected month or year)")]
    UnknownUnit(String),

    #[error("unknown loan type '{0}' (expected Home Loan, Personal Loan or Car Loan)")]
    UnknownLoanType(String),
}

/// Unit the tenure input is expressed in. The page toggles between them
/// with the "Yr" / "Mo" buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenureUnit {
    Month,
    Year,
}

impl TenureUnit {
    pub fn months_per_unit(self) -> u32 {
        match self {
            TenureUnit::Month => 1,
            TenureUnit::Year => 12,
        }
    }

    /// `None` when the month count does not fit in a `u32`.
    pub fn to_months(self, tenure: u32) -> Option<u32> {
        tenure.checked_mul(self.months_per_unit())
    }

    /// Inverse of `to_months`; `None` when `months` is not a whole number
    /// of this unit.
    pub fn from_months(self, months: u32) -> Option<u32> {
        let per = self.months_per_unit();
        (months % per == 0).then_some(months / per)
    }
}

impl FromStr for TenureUnit {
    type Err = LoanInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "months" | "mo" => Ok(TenureUnit::Month),
            "year" | "years" | "yr" => Ok(TenureUnit::Year),
            other => Err(LoanInputError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for TenureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenureUnit::Month => write!(f, "month"),
            TenureUnit::Year => write!(f, "year"),
        }
    }
}

/// Calculator tabs on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanType {
    Home,
    Personal,
    Car,
}

impl LoanType {
    /// Visible tab text.
    pub fn tab_label(self) -> &'static str {
        match self {
            LoanType::Home => "Home Loan",
            LoanType::Personal => "Personal Loan",
            LoanType::Car => "Car Loan",
        }
    }
}

impl FromStr for LoanType {
    type Err = LoanInputError;

    /// Accepts "Car", "car loan", "Car Loan".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.trim_end_matches(" loan") {
            "home" => Ok(LoanType::Home),
            "personal" => Ok(LoanType::Personal),
            "car" => Ok(LoanType::Car),
            _ => Err(LoanInputError::UnknownLoanType(s.to_string())),
        }
    }
}

/// Values typed into the calculator for one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub amount: u64,
    /// Annual percentage, e.g. 8.5
    pub annual_rate: f64,
    pub tenure: u32,
    pub unit: TenureUnit,
}

impl LoanInput {
    pub fn new(amount: u64, annual_rate: f64, tenure: u32, unit: TenureUnit) -> Result<Self, LoanInputError> {
        if amount == 0 {
            return Err(LoanInputError::ZeroAmount);
        }
        if !annual_rate.is_finite() || annual_rate <= 0.0 {
            return Err(LoanInputError::InvalidRate(annual_rate));
        }
        if tenure == 0 {
            return Err(LoanInputError::ZeroTenure);
        }
        if unit.to_months(tenure).is_none() {
            return Err(LoanInputError::TenureTooLong { tenure, unit });
        }
        Ok(LoanInput {
            amount,
            annual_rate,
            tenure,
            unit,
        })
    }

    /// Saturates for hand-built inputs that skipped `new`.
    pub fn tenure_in_months(&self) -> u32 {
        self.unit.to_months(self.tenure).unwrap_or(u32::MAX)
    }
}
