use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::config::run_config::{OptionName, RunConfig};
use crate::error::SubmitError;
use crate::paths::ResolvedPaths;
use crate::validate::values::{parse_nprocess, NotificationMode, Walltime};

/// A rendered PBS job script, ready to hand to qsub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    content: String,
}

impl JobScript {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Render the job script from a validated configuration and its resolved paths
    ///
    /// Rendering does no I/O: the same inputs always give the same text.
    pub fn render(config: &RunConfig, paths: &ResolvedPaths) -> Result<JobScript, SubmitError> {
        let ncpus = parse_nprocess(config.require(OptionName::Nprocess)?)?;
        let header = render_header(config, paths, ncpus)?;
        let modules = read_modules();
        let launch = render_launch(paths, ncpus)?;
        let job = JobTemplate { header, modules, launch };
        Ok(job.assemble())
    }
}

/// All rendered sections of a job script
struct JobTemplate {
    header: Header,
    modules: Modules,
    launch: Launch,
}

impl JobTemplate {
    fn assemble(self) -> JobScript {
        // order is important: PBS stops reading directives at the first command
        let contents = [self.header.content, self.modules.content, self.launch.content];
        JobScript { content: contents.concat() }
    }
}

/// Rendered `#PBS` directives and shell preamble
///
/// Resource requests (cpus, memory, walltime, scratch storage), queue and project, mail
/// settings, the combined output log and the job name. `-l wd` starts the job in the directory
/// qsub was run from, which is the namelist's directory.
struct Header {
    content: String,
}

/// Environment module loads, everything is static
struct Modules {
    content: String,
}

/// Rendered launch command: the binary under mpirun with the namelist passed by `-f`
struct Launch {
    content: String,
}

/// Rendering context for header
#[derive(Serialize)]
struct HeaderContext {
    job_name: String,
    project: String,
    queue: String,
    ncpus: u32,
    memory: String,
    walltime: String,
    log: String,
    mail_events: &'static str,
    email: String,
}

/// Rendering context for launch, paths already shell-quoted
#[derive(Serialize)]
struct LaunchContext {
    working_dir: String,
    ncpus: u32,
    binary: String,
    namelist: String,
}

fn template_engine<'a>(name: &'a str, text: &'a str) -> Result<TinyTemplate<'a>, SubmitError> {
    let mut tt = TinyTemplate::new();
    // job scripts are shell, not HTML
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template(name, text)?;
    Ok(tt)
}

/// Render the PBS header using TinyTemplate
fn render_header(config: &RunConfig, paths: &ResolvedPaths, ncpus: u32) -> Result<Header, SubmitError> {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let tt = template_engine("header", HEADER)?;

    let notifications = NotificationMode::from_flag(config.require(OptionName::EmailNotifications)?)?;
    let context = HeaderContext {
        job_name: config.require(OptionName::JobName)?.to_string(),
        project: config.require(OptionName::Project)?.to_string(),
        queue: config.require(OptionName::Queue)?.to_string(),
        ncpus,
        memory: config.require(OptionName::Memory)?.to_string(),
        walltime: Walltime::parse(config.require(OptionName::Walltime)?)?.to_string(),
        log: paths.log.display().to_string(),
        mail_events: notifications.pbs_events(),
        email: config.require(OptionName::Email)?.to_string(),
    };

    Ok(Header { content: tt.render("header", &context)? })
}

/// Read module loads from template
fn read_modules() -> Modules {
    /// included module template, everything is static
    static MODULES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/modules.txt"));
    Modules { content: MODULES.to_string() }
}

/// Render the launch command using TinyTemplate
fn render_launch(paths: &ResolvedPaths, ncpus: u32) -> Result<Launch, SubmitError> {
    /// included launch template
    static LAUNCH: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/launch.txt"));
    let tt = template_engine("launch", LAUNCH)?;

    let context = LaunchContext {
        working_dir: shell_quote(&paths.working_dir.display().to_string()),
        ncpus,
        binary: shell_quote(&paths.binary.display().to_string()),
        namelist: shell_quote(&paths.namelist.display().to_string()),
    };

    Ok(Launch { content: tt.render("launch", &context)? })
}

/// Wrap `value` in single quotes so the shell takes it literally
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
