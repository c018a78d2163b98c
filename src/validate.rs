//! Fail-fast validation of a run configuration before anything is submitted

/// Parsers for structured option values (walltime, notification flag, process count)
pub mod values;

/// The ordered list of validation checks and the runner that applies them
pub mod checks;
