use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base classgraph config directory (~/.config/classgraph/ on Unix-like systems)
pub fn classgraph() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("classgraph"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("classgraph"))
    }
}

/// Global classgraph.json config file path
pub fn classgraph_json() -> Result<PathBuf> {
    Ok(classgraph()?.join("classgraph.json"))
}

/// Unique per-run scratch directory path under the system temp dir.
/// The directory is not created here.
pub fn scratch_dir() -> PathBuf {
    env::temp_dir().join(format!(".classgraph-{}", uuid::Uuid::new_v4()))
}

/// Expand `~` and anchor relative paths at the current working directory.
pub fn absolutize(path: &str) -> Result<PathBuf> {
    let expanded = PathBuf::from(shellexpand::tilde(path).to_string());
    if expanded.is_absolute() {
        return Ok(expanded);
    }

    let cwd = env::current_dir().map_err(|e| {
        Error::internal_io(e.to_string(), Some("resolve current directory".to_string()))
    })?;
    Ok(cwd.join(expanded))
}

/// Expand `~` without anchoring; relative paths stay relative to the invoker.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

pub fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
