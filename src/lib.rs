pub mod browser;
pub mod cli;
pub mod emi;
pub mod page;
pub mod report;
pub mod scenario;
pub mod trace;
