pub mod emi_calculator_page;
pub mod error;
pub mod locators;
