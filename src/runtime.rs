//! Runtime glue that wires job configuration, telemetry, and the Ctrl-C runner.

pub mod config;
pub mod runner;
pub mod telemetry;
