use thiserror::Error;

use crate::browser::error::WebDriverError;
use crate::browser::outcome::Outcome;
use crate::emi::calculator::DisplayParseError;

/// Failures that abort a scenario. Timing failures are not here; they come
/// back as an `Outcome`.
#[derive(Error, Debug)]
pub enum PageError {
    /// The calculator never finished loading
    #[error("site stuck on loading: {0}")]
    PageLoad(Outcome),

    /// Menu item links somewhere other than the configured calculator URL
    #[error("wrong destination: menu item points to '{actual}', expected '{expected}'")]
    WrongDestination { expected: String, actual: String },

    /// A form input held something that is not a number
    #[error("input {field} holds '{raw}', which is not a number")]
    InvalidInput { field: &'static str, raw: String },

    #[error(transparent)]
    Display(#[from] DisplayParseError),

    #[error(transparent)]
    Driver(#[from] WebDriverError),
}
