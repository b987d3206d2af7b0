pub mod config;
pub mod report;
pub mod results_core;
pub mod sqlite_pragma;
