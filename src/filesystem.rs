use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only filesystem queries used by validation and path resolution
///
/// Relative paths are interpreted against [FileSystem::current_dir].
pub trait FileSystem {
    fn current_dir(&self) -> io::Result<PathBuf>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_readable(&self, path: &Path) -> bool;
    fn is_executable(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The local filesystem, seen from a fixed working directory
pub struct LocalFs {
    cwd: PathBuf,
}

impl LocalFs {
    /// Resolve relative paths against `root`
    pub fn rooted(root: &Path) -> Self {
        LocalFs { cwd: root.to_path_buf() }
    }

    fn full(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }
}

impl FileSystem for LocalFs {
    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn exists(&self, path: &Path) -> bool {
        self.full(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.full(path).is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.full(path).is_file()
    }

    fn is_readable(&self, path: &Path) -> bool {
        fs::File::open(self.full(path)).is_ok()
    }

    #[cfg(unix)]
    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        match fs::metadata(self.full(path)) {
            Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    fn is_executable(&self, path: &Path) -> bool {
        self.full(path).is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.full(path))
    }
}
