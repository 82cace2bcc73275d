use cucumber::{given, then, when};
use tracing::info;

use crate::emi::calculator::{approx_eq, expected_breakdown};
use crate::emi::loan::{LoanType, TenureUnit};
use crate::page::emi_calculator_page::destination_matches;
use crate::scenario::world::{EmiWorld, StepError, require};

/// Allowed difference, in currency units, between a rounded figure on the
/// page and the locally computed one.
pub const ROUNDING_TOLERANCE: u64 = 1;

// ============================================================================
// Given
// ============================================================================

#[given("the EMI calculator page is open")]
fn calculator_is_open(world: &mut EmiWorld) -> Result<(), StepError> {
    world.open_page()
}

// ============================================================================
// When
// ============================================================================

#[when(regex = r#"^I select the "([^"]+)" tab$"#)]
fn select_loan_tab(world: &mut EmiWorld, loan: LoanType) -> Result<(), StepError> {
    require(world.page()?.click_loan_type_tab(loan)?)?;
    world.entered.loan_type = Some(loan);
    Ok(())
}

#[when(regex = r"^I set the loan amount to (\d+)$")]
fn set_loan_amount(world: &mut EmiWorld, amount: u64) -> Result<(), StepError> {
    require(world.page()?.set_loan_amount(amount)?)?;
    world.entered.amount = Some(amount);
    Ok(())
}

#[when(regex = r"^I set the interest rate to (\d+(?:\.\d+)?)%?$")]
fn set_interest_rate(world: &mut EmiWorld, rate: f64) -> Result<(), StepError> {
    require(world.page()?.set_interest_rate(rate)?)?;
    world.entered.annual_rate = Some(rate);
    Ok(())
}

#[when(regex = r"^I set the tenure to (\d+) (years?|months?)$")]
fn set_tenure(world: &mut EmiWorld, tenure: u32, unit: TenureUnit) -> Result<(), StepError> {
    require(world.page()?.set_tenure(tenure, unit)?)?;
    world.entered.tenure = Some((tenure, unit));
    Ok(())
}

#[when("I read the EMI details")]
fn read_emi_details(world: &mut EmiWorld) -> Result<(), StepError> {
    let result = require(world.page()?.read_emi_result()?)?;
    info!(scenario = %world.context().scenario, ?result, "EMI details");
    world.result = Some(result);
    Ok(())
}

#[when("I open the Home Loan EMI Calculator from the menu")]
fn open_home_loan_calculator(world: &mut EmiWorld) -> Result<(), StepError> {
    require(world.page()?.navigate_to_calculator_via_menu()?)
}

// ============================================================================
// Then
// ============================================================================

#[then(regex = r"^the monthly EMI is about (\d+)$")]
fn monthly_emi_is_about(world: &mut EmiWorld, expected: u64) -> Result<(), StepError> {
    let actual = world.last_result()?.monthly_payment;
    if !approx_eq(actual, expected, ROUNDING_TOLERANCE) {
        return Err(StepError::mismatch("monthly EMI", expected, actual));
    }
    Ok(())
}

#[then("the monthly EMI matches the standard formula")]
fn monthly_emi_matches_formula(world: &mut EmiWorld) -> Result<(), StepError> {
    let expected = expected_breakdown(&world.entered.to_input()?);
    let result = world.last_result()?;
    if !approx_eq(result.monthly_payment, expected.monthly_payment, ROUNDING_TOLERANCE) {
        return Err(StepError::mismatch("monthly EMI", expected.monthly_payment, result.monthly_payment));
    }
    Ok(())
}

#[then(regex = r"^the first month interest is (\d+)$")]
fn first_month_interest_is(world: &mut EmiWorld, expected: u64) -> Result<(), StepError> {
    let actual = world.last_result()?.first_month_interest;
    if actual != expected {
        return Err(StepError::mismatch("first month interest", expected, actual));
    }
    Ok(())
}

#[then(regex = r"^the first month principal is about (-?\d+)$")]
fn first_month_principal_is(world: &mut EmiWorld, expected: i64) -> Result<(), StepError> {
    let actual = world.last_result()?.first_month_principal;
    if actual.abs_diff(expected) > ROUNDING_TOLERANCE {
        return Err(StepError::mismatch("first month principal", expected, actual));
    }
    Ok(())
}

#[then("the first month interest and principal add up to the EMI")]
fn split_adds_up(world: &mut EmiWorld) -> Result<(), StepError> {
    let result = world.last_result()?;
    if !result.split_is_consistent() {
        return Err(StepError::mismatch(
            "first month interest + principal",
            result.monthly_payment,
            result.first_month_interest as i64 + result.first_month_principal,
        ));
    }
    Ok(())
}

#[then("the total payment is the loan amount plus the total interest")]
fn total_is_amount_plus_interest(world: &mut EmiWorld) -> Result<(), StepError> {
    let amount = world
        .entered
        .amount
        .ok_or(StepError::MissingInput { field: "loan amount" })?;
    let result = world.last_result()?;
    let expected = amount + result.total_interest;
    if !approx_eq(result.total_payment, expected, ROUNDING_TOLERANCE) {
        return Err(StepError::mismatch("total payment", expected, result.total_payment));
    }
    Ok(())
}

#[then(regex = r"^the form shows a loan amount of (\d+) at (\d+(?:\.\d+)?)%$")]
fn form_shows_inputs(world: &mut EmiWorld, amount: u64, rate: f64) -> Result<(), StepError> {
    let page = world.page()?;
    let shown_amount = require(page.read_loan_amount()?)?;
    if shown_amount != amount {
        return Err(StepError::mismatch("loan amount", amount, shown_amount));
    }
    let shown_rate = require(page.read_interest_rate()?)?;
    if (shown_rate - rate).abs() > f64::EPSILON {
        return Err(StepError::mismatch("interest rate", rate, shown_rate));
    }
    Ok(())
}

#[then(regex = r"^the tenure reads (\d+) months$")]
fn tenure_reads_months(world: &mut EmiWorld, expected: u32) -> Result<(), StepError> {
    let actual = require(world.page()?.read_tenure_in_months()?)?;
    if actual != expected {
        return Err(StepError::mismatch("tenure in months", expected, actual));
    }
    Ok(())
}

#[then("I am on the Home Loan EMI Calculator page")]
fn on_home_loan_calculator(world: &mut EmiWorld) -> Result<(), StepError> {
    let expected = world.settings().home_loan_emi_url.clone();
    let actual = world.page()?.current_url()?;
    if !destination_matches(&expected, &actual) {
        return Err(StepError::mismatch("current page", expected, actual));
    }
    Ok(())
}
