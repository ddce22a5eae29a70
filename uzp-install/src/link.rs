use crate::error::InstallError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Exposes the installed binary in the package manager's global bin directory.
#[derive(Debug, Clone, Default)]
pub struct PathLinker {
    bin_dir: Option<PathBuf>,
}

impl PathLinker {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    pub fn bin_dir(&self) -> Result<PathBuf, InstallError> {
        if let Some(dir) = &self.bin_dir {
            return Ok(dir.clone());
        }

        // npm exports its prefix to lifecycle scripts; outside of npm, ask it.
        let prefix = match std::env::var("npm_config_prefix") {
            Ok(prefix) if !prefix.trim().is_empty() => PathBuf::from(prefix.trim()),
            _ => npm_global_prefix()?,
        };
        Ok(bin_dir_for_prefix(&prefix))
    }

    /// Replaces `<bin_dir>/<name>` with a symlink to `binary_path`.
    pub fn link(&self, binary_path: &Path, name: &str) -> Result<PathBuf, InstallError> {
        let dir = self.bin_dir()?;
        let link_path = dir.join(name);
        let failure = |reason: String| InstallError::LinkFailure {
            link: link_path.clone(),
            reason,
        };

        if same_file(binary_path, &link_path) {
            tracing::debug!(
                path = %link_path.display(),
                "binary already lives in the bin directory"
            );
            return Ok(link_path);
        }

        fs::create_dir_all(&dir).map_err(|err| failure(err.to_string()))?;

        // symlink_metadata also sees dangling links, which exists() does not.
        if fs::symlink_metadata(&link_path).is_ok() {
            fs::remove_file(&link_path).map_err(|err| failure(err.to_string()))?;
        }

        create_symlink(binary_path, &link_path).map_err(|err| failure(err.to_string()))?;
        tracing::debug!(
            link = %link_path.display(),
            target = %binary_path.display(),
            "created symlink"
        );
        Ok(link_path)
    }
}

fn npm_global_prefix() -> Result<PathBuf, InstallError> {
    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    let failure = |reason: String| InstallError::LinkFailure {
        link: PathBuf::from(npm),
        reason,
    };

    let output = Command::new(npm)
        .args(["prefix", "-g"])
        .output()
        .map_err(|err| failure(format!("failed to run `npm prefix -g`: {err}")))?;

    if !output.status.success() {
        return Err(failure(format!(
            "`npm prefix -g` exited with {}",
            output.status
        )));
    }

    let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if prefix.is_empty() {
        return Err(failure("`npm prefix -g` printed nothing".to_string()));
    }
    Ok(PathBuf::from(prefix))
}

fn bin_dir_for_prefix(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.to_path_buf()
    } else {
        prefix.join("bin")
    }
}

/// True when `link` is not a symlink but the binary file itself.
fn same_file(binary: &Path, link: &Path) -> bool {
    let plain_file = fs::symlink_metadata(link).is_ok_and(|meta| !meta.file_type().is_symlink());
    plain_file
        && matches!(
            (fs::canonicalize(binary), fs::canonicalize(link)),
            (Ok(left), Ok(right)) if left == right
        )
}

fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)?;
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(target, link)?;
    }

    #[cfg(not(any(unix, windows)))]
    {
        fs::copy(target, link)?;
    }

    Ok(())
}
