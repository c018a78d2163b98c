//! Render PBS job scripts and submit them with qsub

/// The scheduler collaborator and its qsub/qstat implementation
pub mod scheduler;

/// Render the job script template with configuration values
pub mod job;

/// Write the rendered script to a temporary file and submit it
pub mod submit;
