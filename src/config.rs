//! Read a run configuration file into a [run_config::RunConfig]

/// Option names and the parsed configuration mapping
pub mod run_config;

/// Parse `NAME=value` lines with simple variable interpolation
pub mod load;
