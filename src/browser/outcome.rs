use std::fmt;
use std::time::Duration;

/// Result of a UI interaction that can fail for timing reasons.
///
/// `NotFound` means nothing ever matched the locator; `Timeout` means it
/// matched but never became visible. Protocol and setup failures are
/// reported as `Err` alongside, never folded in here.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = ()> {
    Success(T),
    NotFound { what: String },
    Timeout { what: String, after: Duration },
}

impl Outcome<()> {
    pub fn success() -> Self {
        Outcome::Success(())
    }
}

impl<T> Outcome<T> {
    pub fn not_found(what: impl fmt::Display) -> Self {
        Outcome::NotFound {
            what: what.to_string(),
        }
    }

    pub fn timeout(what: impl fmt::Display, after: Duration) -> Self {
        Outcome::Timeout {
            what: what.to_string(),
            after,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::NotFound { what } => Outcome::NotFound { what },
            Outcome::Timeout { what, after } => Outcome::Timeout { what, after },
        }
    }

    /// Split into the success value or the failure, retyped so it can be
    /// returned from an operation with a different success type.
    pub fn into_result<U>(self) -> Result<T, Outcome<U>> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::NotFound { what } => Err(Outcome::NotFound { what }),
            Outcome::Timeout { what, after } => Err(Outcome::Timeout { what, after }),
        }
    }

    pub fn success_value(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(_) => write!(f, "success"),
            Outcome::NotFound { what } => write!(f, "not found: {}", what),
            Outcome::Timeout { what, after } => {
                write!(f, "timed out after {}ms waiting for {}", after.as_millis(), what)
            }
        }
    }
}
