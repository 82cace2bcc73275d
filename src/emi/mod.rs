pub mod calculator;
pub mod loan;
