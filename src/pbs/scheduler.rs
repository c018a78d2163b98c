use std::path::Path;
use std::process::Command;

use log::info;

use crate::error::SubmitError;

/// The batch scheduler, seen as a black box
pub trait Scheduler {
    /// Ask the scheduler whether `queue` exists
    fn queue_exists(&self, queue: &str) -> Result<bool, SubmitError>;

    /// Submit the job script at `script` from `working_dir` and return the scheduler's stdout
    fn submit(&self, script: &Path, working_dir: &Path) -> Result<String, SubmitError>;
}

/// PBS Pro, driven through `qstat` and `qsub`
pub struct Pbs {
    pub qsub: String,
    pub qstat: String,
}

impl Default for Pbs {
    fn default() -> Self {
        Pbs { qsub: "qsub".to_string(), qstat: "qstat".to_string() }
    }
}

impl Scheduler for Pbs {
    fn queue_exists(&self, queue: &str) -> Result<bool, SubmitError> {
        let mut qstat = Command::new(&self.qstat);
        let cmd = qstat.args(["-Q", queue]);
        info!("Checking queue with {:?}", &cmd);

        let output = cmd.output().map_err(|source| SubmitError::SchedulerUnavailable {
            command: self.qstat.clone(),
            source,
        })?;
        Ok(output.status.success())
    }

    fn submit(&self, script: &Path, working_dir: &Path) -> Result<String, SubmitError> {
        let mut qsub = Command::new(&self.qsub);
        let cmd = qsub.arg(script).current_dir(working_dir);
        info!("Running qsub process");
        info!("{:?}", &cmd);

        let output = cmd.output().map_err(|source| SubmitError::SchedulerUnavailable {
            command: self.qsub.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(SubmitError::SubmissionFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
