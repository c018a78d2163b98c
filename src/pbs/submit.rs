use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::info;

use crate::error::SubmitError;
use crate::paths::ResolvedPaths;
use crate::pbs::job::JobScript;
use crate::pbs::scheduler::Scheduler;

/// What a successful submission hands back to the user
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub job_id: String,
    pub log: PathBuf,
    pub submitted_at: DateTime<Local>,
}

impl JobScript {
    /// Write the script to a private temporary file and submit it from the working directory
    ///
    /// The temporary file is removed once the scheduler has returned.
    pub fn submit(
        &self,
        paths: &ResolvedPaths,
        scheduler: &dyn Scheduler,
    ) -> Result<SubmissionResult, SubmitError> {
        let mut file = tempfile::Builder::new()
            .prefix("qlaunch-")
            .suffix(".pbs")
            .tempfile()
            .map_err(SubmitError::ScriptWrite)?;
        file.write_all(self.as_str().as_bytes())
            .and_then(|_| file.flush())
            .map_err(SubmitError::ScriptWrite)?;
        info!("Wrote job script to {}", file.path().display());

        let stdout = scheduler.submit(file.path(), &paths.working_dir)?;
        let job_id = stdout.trim();
        if job_id.is_empty() {
            return Err(SubmitError::SubmissionFailed {
                code: Some(0),
                stderr: "scheduler returned no job identifier".to_string(),
            });
        }

        let result = SubmissionResult {
            job_id: job_id.to_string(),
            log: paths.log.clone(),
            submitted_at: Local::now(),
        };
        info!("PBS job id: {} (submitted {})", result.job_id, result.submitted_at.to_rfc3339());
        Ok(result)
    }
}
