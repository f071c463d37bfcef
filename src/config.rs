use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::InitStep;

/// Default marker directory, independent of `$TMPDIR`
pub const DEFAULT_MARKER_DIR: &str = "/tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment variable that disables every hook when set to 1/true/yes
    pub bypass_env: String,
    pub marker: MarkerConfig,
    pub gate: GateConfig,
    pub guard: GuardConfig,
    pub reminder: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub dir: PathBuf,
    pub prefix: String,
    pub lock_retry_ms: u64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MARKER_DIR),
            prefix: ".serena-session-".to_string(),
            lock_retry_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub tool_prefix: String,
    pub critical_memory: String,
    pub required_steps: Vec<InitStep>,
    /// Tools allowed before initialization, on top of the Serena init tools
    pub always_allowed: Vec<String>,
    pub require_git_repo: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tool_prefix: "mcp__plugin_serena_serena__".to_string(),
            critical_memory: "critical_behaviors".to_string(),
            required_steps: InitStep::ALL.to_vec(),
            always_allowed: vec!["ToolSearch".to_string()],
            require_git_repo: true,
        }
    }
}

impl GateConfig {
    /// Fully qualified name of a Serena tool
    pub fn tool(&self, name: &str) -> String {
        format!("{}{}", self.tool_prefix, name)
    }

    pub fn activation_tool(&self) -> String {
        self.tool("activate_project")
    }

    pub fn instructions_tool(&self) -> String {
        self.tool("initial_instructions")
    }

    pub fn onboarding_tool(&self) -> String {
        self.tool("onboarding")
    }

    pub fn read_memory_tool(&self) -> String {
        self.tool("read_memory")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub require_git_repo: bool,
    /// Environment variable naming the project root that holds package.json
    pub project_dir_env: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            require_git_repo: true,
            project_dir_env: "CLAUDE_PROJECT_DIR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub edit_tools: Vec<String>,
    pub extensions: Vec<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            edit_tools: vec!["Edit".to_string(), "Write".to_string(), "MultiEdit".to_string()],
            extensions: vec![".ts".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bypass_env: "SKIP_SERENA".to_string(),
            marker: MarkerConfig::default(),
            gate: GateConfig::default(),
            guard: GuardConfig::default(),
            reminder: ReminderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
