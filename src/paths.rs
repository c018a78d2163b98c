use std::path::{Component, Path, PathBuf};

use log::info;

use crate::config::run_config::{OptionName, RunConfig};
use crate::error::SubmitError;
use crate::filesystem::FileSystem;

/// Absolute locations derived from a validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub binary: PathBuf,
    pub namelist: PathBuf,
    /// Directory containing the namelist. The job runs here.
    pub working_dir: PathBuf,
    /// `<working_dir>/<JOB_NAME>.log`, combined stdout and stderr
    pub log: PathBuf,
}

impl ResolvedPaths {
    /// Make BINARY and NAMELIST absolute, rewriting them in `config`, and derive the rest
    pub fn resolve(config: &mut RunConfig, fs: &dyn FileSystem) -> Result<ResolvedPaths, SubmitError> {
        let binary = absolute(Path::new(config.require(OptionName::Binary)?), fs)?;
        let namelist = absolute(Path::new(config.require(OptionName::Namelist)?), fs)?;
        let working_dir = namelist
            .parent()
            .ok_or_else(|| SubmitError::PathResolution(namelist.clone()))?
            .to_path_buf();
        let log = working_dir.join(format!("{}.log", config.require(OptionName::JobName)?));

        config.set(OptionName::Binary, binary.display().to_string());
        config.set(OptionName::Namelist, namelist.display().to_string());

        info!("Binary: {}", binary.display());
        info!("Namelist: {}", namelist.display());
        info!("Working directory: {}", working_dir.display());
        info!("Output log: {}", log.display());

        Ok(ResolvedPaths { binary, namelist, working_dir, log })
    }
}

/// Join a relative path onto the current directory without following symlinks
///
/// The directory part is resolved and must exist; the file name is appended as-is.
pub fn absolute(path: &Path, fs: &dyn FileSystem) -> Result<PathBuf, SubmitError> {
    let unresolved = || SubmitError::PathResolution(path.to_path_buf());
    let file_name = path.file_name().ok_or_else(unresolved)?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let dir = if parent.is_absolute() {
        normalize(parent)
    } else {
        let cwd = fs.current_dir().map_err(|_| unresolved())?;
        normalize(&cwd.join(parent))
    };

    if !fs.is_dir(&dir) {
        return Err(unresolved());
    }
    Ok(dir.join(file_name))
}

/// Drop `.` components and fold `..` into its parent, lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
