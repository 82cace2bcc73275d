pub mod driver_factory;
pub mod element_util;
pub mod error;
pub mod outcome;
pub mod session;
pub mod webdriver;
