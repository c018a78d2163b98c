use std::io;
use std::path::PathBuf;

use crate::config::run_config::OptionName;

/// Everything that can stop a run before (or during) submission
///
/// All variants are terminal: the process reports the error and exits 1.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("can't read configuration file {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration line {line} is not a NAME=value assignment: {text}")]
    ConfigSyntax { line: usize, text: String },

    #[error("required variable {0} is missing or empty")]
    MissingVariable(OptionName),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("{path} is missing {mode} permission")]
    PermissionDenied { path: PathBuf, mode: &'static str },

    #[error("{name} has an invalid format: {value}")]
    InvalidFormat { name: &'static str, value: String },

    #[error("{name} is out of range: {value}")]
    InvalidRange { name: &'static str, value: String },

    #[error("queue {0} is not known to the scheduler")]
    QueueNotFound(String),

    #[error("can't resolve the directory of {0}")]
    PathResolution(PathBuf),

    #[error("can't render job script: {0}")]
    Render(#[from] tinytemplate::error::Error),

    #[error("can't write job script: {0}")]
    ScriptWrite(#[source] io::Error),

    #[error("can't run scheduler command {command}: {source}")]
    SchedulerUnavailable {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("job submission failed (exit code {}): {stderr}", display_code(.code))]
    SubmissionFailed { code: Option<i32>, stderr: String },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}
