use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use crate::filesystem::LocalFs;
use crate::launch::{launch, Launch, LaunchOptions};
use crate::pbs::scheduler::Pbs;

mod config;
mod error;
mod filesystem;
mod launch;
mod paths;
mod pbs;
mod validate;

#[derive(Parser, Debug)]
#[command(name = "qlaunch")]
#[command(version = "0.1.0")]
#[command(about = "Validate a run configuration and submit it as a PBS job")]
#[command(long_about = "qlaunch reads a NAME=value run configuration, checks it, renders a PBS \
job script that launches the model binary under mpirun and submits it with qsub. Nothing is \
submitted unless every check passes.")]
struct Args {
    /// Path to the run configuration file
    #[arg(short, long)]
    config: PathBuf,
    /// Print the rendered job script instead of submitting it
    #[arg(long)]
    dry_run: bool,
    /// Warn instead of failing when QUEUE is unknown to the scheduler
    #[arg(long)]
    allow_unknown_queue: bool,
    /// Command used to submit jobs
    #[arg(long, default_value = "qsub")]
    qsub: String,
    /// Command used to look up queues
    #[arg(long, default_value = "qstat")]
    qstat: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    info!("qlaunch {}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(&args) {
        error!("Run not submitted");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let cwd = env::current_dir().context("can't read the current directory")?;
    let fs = LocalFs::rooted(&cwd);
    let scheduler = Pbs { qsub: args.qsub.clone(), qstat: args.qstat.clone() };
    let options = LaunchOptions { dry_run: args.dry_run, allow_unknown_queue: args.allow_unknown_queue };

    let launched = launch(&args.config, &fs, &scheduler, &options)
        .with_context(|| format!("run configuration {}", args.config.display()))?;

    match launched {
        Launch::Submitted(result) => {
            println!("{}", result.job_id);
            println!("{}", result.log.display());
        }
        Launch::DryRun(script) => print!("{}", script.as_str()),
    }
    Ok(())
}
