//! Project context for a hook invocation: working directory, git repository
//! detection, and the bypass switch.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::domain::HookEvent;

/// Where the host was running when it fired the hook
#[derive(Debug, Clone)]
pub struct ProjectContext {
    cwd: PathBuf,
}

impl ProjectContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Use the event's `cwd`, falling back to the process working directory
    pub fn from_event(event: &HookEvent) -> Self {
        let cwd = event
            .cwd
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self::new(cwd)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Check if the working directory is inside a git repository
    pub fn is_git_repo(&self) -> bool {
        match self.git(&["rev-parse", "--git-dir"]) {
            Some(_) => true,
            None => {
                debug!("{} is not inside a git repository", self.cwd.display());
                false
            }
        }
    }

    /// Top level of the enclosing git repository, if any
    pub fn git_root(&self) -> Option<PathBuf> {
        self.git(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    /// Project name: the git root's directory name, else the cwd's
    pub fn project_name(&self) -> String {
        let root = self.git_root().unwrap_or_else(|| self.cwd.clone());
        root.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string())
    }

    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git").args(args).current_dir(&self.cwd).output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Check if hooks are disabled through `env_var`
pub fn is_bypassed(env_var: &str) -> bool {
    std::env::var(env_var).map(|v| is_truthy(&v)).unwrap_or(false)
}

/// `1`, `true` and `yes`, case-insensitively
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
