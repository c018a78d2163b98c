use std::path::Path;

use log::info;

use crate::config::load::load_config;
use crate::error::SubmitError;
use crate::filesystem::FileSystem;
use crate::paths::ResolvedPaths;
use crate::pbs::job::JobScript;
use crate::pbs::scheduler::Scheduler;
use crate::pbs::submit::SubmissionResult;
use crate::validate::checks::{validate, ValidationContext};

pub struct LaunchOptions {
    /// Render the script but don't submit it
    pub dry_run: bool,
    pub allow_unknown_queue: bool,
}

pub enum Launch {
    Submitted(SubmissionResult),
    DryRun(JobScript),
}

/// Load, validate, resolve, render and (unless dry run) submit
///
/// Submission is the only step with side effects and runs last, so an invalid configuration
/// never reaches the scheduler.
pub fn launch(
    config_path: &Path,
    fs: &dyn FileSystem,
    scheduler: &dyn Scheduler,
    options: &LaunchOptions,
) -> Result<Launch, SubmitError> {
    let mut config = load_config(config_path, fs)?;

    let ctx = ValidationContext { fs, scheduler, allow_unknown_queue: options.allow_unknown_queue };
    validate(&config, &ctx)?;

    let paths = ResolvedPaths::resolve(&mut config, fs)?;
    let script = JobScript::render(&config, &paths)?;

    match options.dry_run {
        true => {
            info!("--dry-run set, not submitting");
            Ok(Launch::DryRun(script))
        }
        false => Ok(Launch::Submitted(script.submit(&paths, scheduler)?)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use super::*;
    use crate::filesystem::LocalFs;

    struct FakeScheduler {
        job_id: &'static str,
        submitted: RefCell<Vec<String>>,
    }

    impl FakeScheduler {
        fn new(job_id: &'static str) -> Self {
            FakeScheduler { job_id, submitted: RefCell::new(Vec::new()) }
        }
    }

    impl Scheduler for FakeScheduler {
        fn queue_exists(&self, queue: &str) -> Result<bool, SubmitError> {
            Ok(queue == "normal")
        }

        fn submit(&self, script: &Path, _working_dir: &Path) -> Result<String, SubmitError> {
            self.submitted.borrow_mut().push(fs::read_to_string(script).expect("script"));
            Ok(format!("{}\n", self.job_id))
        }
    }

    const CONFIG: &str = "\
BINARY=./run
NAMELIST=./in/ED2IN
NPROCESS=4
WALLTIME=01:00:00
MEMORY=8GB
QUEUE=normal
PROJECT=abc1
EMAIL=a@b.com
EMAIL_NOTIFICATIONS=1
JOB_NAME=test
";

    fn run_dir(config: &str) -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        let binary = temp.path().join("run");
        fs::write(&binary, "#!/bin/sh\n").expect("write binary");
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).expect("chmod");
        fs::create_dir(temp.path().join("in")).expect("mkdir");
        fs::write(temp.path().join("in/ED2IN"), "$ED_NL\n$END\n").expect("write namelist");
        fs::write(temp.path().join("run.cfg"), config).expect("write config");
        temp
    }

    fn options(dry_run: bool) -> LaunchOptions {
        LaunchOptions { dry_run, allow_unknown_queue: false }
    }

    #[test]
    fn submits_a_valid_run() {
        let dir = run_dir(CONFIG);
        let local = LocalFs::rooted(dir.path());
        let scheduler = FakeScheduler::new("12345.server");

        let launched = launch(Path::new("run.cfg"), &local, &scheduler, &options(false)).expect("launched");
        let result = match launched {
            Launch::Submitted(result) => result,
            Launch::DryRun(_) => panic!("expected a submission"),
        };
        assert_eq!(result.job_id, "12345.server");
        assert_eq!(result.log, dir.path().join("in/test.log"));

        let submitted = scheduler.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        let binary = dir.path().join("run");
        let launch_line = submitted[0].lines().last().expect("launch line");
        assert!(launch_line.contains("-np 4"));
        assert!(launch_line.contains(&binary.display().to_string()));
        assert!(submitted[0].contains("#PBS -m abe\n"));
    }

    #[test]
    fn dry_run_renders_without_submitting() {
        let dir = run_dir(CONFIG);
        let local = LocalFs::rooted(dir.path());
        let scheduler = FakeScheduler::new("12345.server");

        match launch(Path::new("run.cfg"), &local, &scheduler, &options(true)).expect("launched") {
            Launch::DryRun(script) => assert!(script.as_str().contains("#PBS -N test\n")),
            Launch::Submitted(_) => panic!("dry run submitted"),
        }
        assert!(scheduler.submitted.borrow().is_empty());
    }

    #[test]
    fn invalid_configuration_is_never_submitted() {
        let dir = run_dir(&CONFIG.replace("EMAIL_NOTIFICATIONS=1", "EMAIL_NOTIFICATIONS=2"));
        let local = LocalFs::rooted(dir.path());
        let scheduler = FakeScheduler::new("12345.server");

        let err = launch(Path::new("run.cfg"), &local, &scheduler, &options(false))
            .err()
            .expect("rejected");
        assert!(matches!(err, SubmitError::InvalidRange { name: "EMAIL_NOTIFICATIONS", .. }));
        assert!(scheduler.submitted.borrow().is_empty());
    }

    #[test]
    fn missing_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = LocalFs::rooted(dir.path());
        let scheduler = FakeScheduler::new("12345.server");

        let err = launch(&PathBuf::from("run.cfg"), &local, &scheduler, &options(false))
            .err()
            .expect("rejected");
        assert!(matches!(err, SubmitError::ConfigNotFound(_)));
    }
}
