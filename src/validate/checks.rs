use std::path::Path;

use log::{info, warn};

use crate::config::run_config::{OptionName, RunConfig};
use crate::error::SubmitError;
use crate::filesystem::FileSystem;
use crate::pbs::scheduler::Scheduler;
use crate::validate::values::{parse_nprocess, NotificationMode, Walltime};

/// Collaborators the checks may query. Nothing here is mutated.
pub struct ValidationContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub scheduler: &'a dyn Scheduler,
    /// Log an unknown queue instead of failing
    pub allow_unknown_queue: bool,
}

/// A named predicate over the configuration and its environment
pub struct ValidationCheck {
    pub name: &'static str,
    pub run: fn(&RunConfig, &ValidationContext) -> Result<(), SubmitError>,
}

/// Checks in the order they run. Later checks rely on earlier ones having passed.
pub static CHECKS: [ValidationCheck; 9] = [
    ValidationCheck { name: "required variables are set", run: required_variables },
    ValidationCheck { name: "BINARY exists", run: binary_exists },
    ValidationCheck { name: "NAMELIST exists", run: namelist_exists },
    ValidationCheck { name: "BINARY is executable", run: binary_executable },
    ValidationCheck { name: "NAMELIST is readable", run: namelist_readable },
    ValidationCheck { name: "WALLTIME is HH:MM:SS", run: walltime_format },
    ValidationCheck { name: "NPROCESS is a positive integer", run: nprocess_format },
    ValidationCheck { name: "QUEUE exists", run: queue_exists },
    ValidationCheck { name: "EMAIL_NOTIFICATIONS is 0 or 1", run: email_notifications },
];

/// Run every check in [CHECKS], stopping at the first failure
pub fn validate(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    run_checks(&CHECKS, config, ctx)
}

pub fn run_checks(
    checks: &[ValidationCheck],
    config: &RunConfig,
    ctx: &ValidationContext,
) -> Result<(), SubmitError> {
    for check in checks {
        info!("Checking {}", check.name);
        (check.run)(config, ctx).map_err(|err| {
            warn!("Configuration fails validation: {}", check.name);
            err
        })?;
    }
    info!("Configuration is valid");
    Ok(())
}

fn required_variables(config: &RunConfig, _: &ValidationContext) -> Result<(), SubmitError> {
    for name in OptionName::REQUIRED {
        config.require(name)?;
    }
    Ok(())
}

fn file_exists(config: &RunConfig, ctx: &ValidationContext, name: OptionName) -> Result<(), SubmitError> {
    let path = Path::new(config.require(name)?);
    // a directory is not a usable binary or namelist
    match ctx.fs.is_file(path) {
        true => Ok(()),
        false => Err(SubmitError::FileNotFound(path.to_path_buf())),
    }
}

fn binary_exists(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    file_exists(config, ctx, OptionName::Binary)
}

fn namelist_exists(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    file_exists(config, ctx, OptionName::Namelist)
}

fn binary_executable(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    let path = Path::new(config.require(OptionName::Binary)?);
    match ctx.fs.is_executable(path) {
        true => Ok(()),
        false => Err(SubmitError::PermissionDenied { path: path.to_path_buf(), mode: "execute" }),
    }
}

fn namelist_readable(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    let path = Path::new(config.require(OptionName::Namelist)?);
    match ctx.fs.is_readable(path) {
        true => Ok(()),
        false => Err(SubmitError::PermissionDenied { path: path.to_path_buf(), mode: "read" }),
    }
}

fn walltime_format(config: &RunConfig, _: &ValidationContext) -> Result<(), SubmitError> {
    Walltime::parse(config.require(OptionName::Walltime)?).map(|_| ())
}

fn nprocess_format(config: &RunConfig, _: &ValidationContext) -> Result<(), SubmitError> {
    parse_nprocess(config.require(OptionName::Nprocess)?).map(|_| ())
}

fn queue_exists(config: &RunConfig, ctx: &ValidationContext) -> Result<(), SubmitError> {
    let queue = config.require(OptionName::Queue)?;
    match (ctx.scheduler.queue_exists(queue)?, ctx.allow_unknown_queue) {
        (true, _) => Ok(()),
        (false, true) => {
            warn!("Queue {queue} is not known to the scheduler, continuing anyway");
            Ok(())
        }
        (false, false) => Err(SubmitError::QueueNotFound(queue.to_string())),
    }
}

fn email_notifications(config: &RunConfig, _: &ValidationContext) -> Result<(), SubmitError> {
    NotificationMode::from_flag(config.require(OptionName::EmailNotifications)?).map(|_| ())
}
