//! Bash guard - redirects shell commands to Serena tools or npm scripts.

mod command;
mod messages;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

pub use command::{CommandCategory, NpmInvocation, Verdict, classify, command_name, parse_npm_command};

use crate::config::{Config, GuardConfig};
use crate::domain::{Decision, HookEvent, HookEventName};
use crate::project::{ProjectContext, is_bypassed};

/// Tool name the host uses for shell commands
pub const BASH_TOOL: &str = "Bash";

/// Guard for PreToolUse events on the Bash tool
#[derive(Debug, Clone)]
pub struct BashGuard {
    config: GuardConfig,
    bypass_env: String,
    project_dir: Option<PathBuf>,
}

impl BashGuard {
    pub fn new(config: GuardConfig, bypass_env: impl Into<String>) -> Self {
        Self {
            config,
            bypass_env: bypass_env.into(),
            project_dir: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.guard.clone(), config.bypass_env.clone())
    }

    /// Read package.json from `dir` instead of the environment/event
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Handle one hook event
    pub fn handle(&self, event: &HookEvent) -> Decision {
        if is_bypassed(&self.bypass_env) {
            return Decision::allow();
        }
        if event.hook_event_name != HookEventName::PreToolUse || event.tool_name != BASH_TOOL {
            return Decision::allow();
        }

        let command = event.input_str("command").unwrap_or_default().trim();
        if command.is_empty() {
            return Decision::allow();
        }

        let project = ProjectContext::from_event(event);
        if self.config.require_git_repo && !project.is_git_repo() {
            return Decision::allow();
        }

        let project_dir = self.project_dir(&project);
        let decision = verdict_to_decision(classify(command, || load_package_scripts(&project_dir)));
        if decision.is_block() {
            info!("Blocked bash command: {}", command);
        }
        decision
    }

    fn project_dir(&self, project: &ProjectContext) -> PathBuf {
        if let Some(dir) = &self.project_dir {
            return dir.clone();
        }
        std::env::var(&self.config.project_dir_env)
            .map(PathBuf::from)
            .unwrap_or_else(|_| project.cwd().to_path_buf())
    }
}

/// Turn a command verdict into a hook decision
pub fn verdict_to_decision(verdict: Verdict) -> Decision {
    match verdict {
        Verdict::Allow => Decision::allow(),
        Verdict::UseSerena { command, category } => Decision::block(
            format!("Command '{}' should use Serena tools instead", command),
            messages::serena_message(&command, category),
        ),
        Verdict::UseNpmScript { command, equivalent } => Decision::block(
            format!("Use npm scripts instead of direct '{}' invocation", command),
            messages::npm_script_message(&command, equivalent),
        ),
        Verdict::UnknownScript { script, available } => Decision::block(
            format!("Script '{}' not found in package.json", script),
            messages::unknown_script_message(&script, &available),
        ),
    }
}

/// Script names from `<dir>/package.json`; empty when missing or unparsable
pub fn load_package_scripts(dir: &Path) -> BTreeSet<String> {
    let path = dir.join("package.json");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No package.json at {}: {}", path.display(), e);
            return BTreeSet::new();
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => value
            .get("scripts")
            .and_then(Value::as_object)
            .map(|scripts| scripts.keys().cloned().collect())
            .unwrap_or_default(),
        Err(e) => {
            debug!("Unparsable package.json at {}: {}", path.display(), e);
            BTreeSet::new()
        }
    }
}
