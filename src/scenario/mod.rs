pub mod context;
pub mod runner;
pub mod steps;
pub mod world;
