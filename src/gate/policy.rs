//! Pure decision logic for the initialization gate.
//!
//! Nothing here touches the filesystem, environment, or git: the adapter in
//! `gate::Gate` loads the record and passes it in.

use crate::config::GateConfig;
use crate::domain::{ActivationRecord, Decision, HookEvent, HookEventName, InitStep};

/// Shown when the marker could not be read or the event could not be parsed
pub const UNVERIFIED_NOTICE: &str = "Could not verify Serena initialization, blocking.";

pub const FULLY_INITIALIZED: &str = "✓ Serena fully initialized. All tools unlocked.";

/// Decides allow/block for tool calls based on an activation record
#[derive(Debug, Clone)]
pub struct GatePolicy {
    config: GateConfig,
}

impl GatePolicy {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn required_steps(&self) -> &[InitStep] {
        &self.config.required_steps
    }

    /// Initialization step a tool call performs, if any.
    ///
    /// `read_memory` only counts for the configured critical memory, named
    /// through either `memory_file_name` or `memory_name`.
    pub fn step_for_event(&self, event: &HookEvent) -> Option<InitStep> {
        let tool = event.tool_name.as_str();
        if tool == self.config.activation_tool() {
            return Some(InitStep::ActivateProject);
        }
        if tool == self.config.instructions_tool() {
            return Some(InitStep::InitialInstructions);
        }
        if tool == self.config.read_memory_tool() {
            let memory = event
                .input_str("memory_file_name")
                .filter(|name| !name.is_empty())
                .or_else(|| event.input_str("memory_name"))
                .unwrap_or_default();
            if memory == self.config.critical_memory {
                return Some(InitStep::CriticalBehaviors);
            }
        }
        None
    }

    /// Tools that may run before initialization
    pub fn is_always_allowed(&self, tool_name: &str) -> bool {
        tool_name == self.config.activation_tool()
            || tool_name == self.config.instructions_tool()
            || tool_name == self.config.onboarding_tool()
            || tool_name == self.config.read_memory_tool()
            || self.config.always_allowed.iter().any(|t| t == tool_name)
    }

    /// Decide a PreToolUse event against the current record
    pub fn evaluate(&self, event: &HookEvent, record: &ActivationRecord, project: &str) -> Decision {
        if event.hook_event_name != HookEventName::PreToolUse {
            return Decision::allow();
        }
        if self.step_for_event(event).is_some() || self.is_always_allowed(&event.tool_name) {
            return Decision::allow();
        }

        let missing = record.missing(self.required_steps());
        if missing.is_empty() {
            return Decision::allow();
        }

        let message = self.blocked_message(&missing, project);
        Decision::block(message.clone(), message)
    }

    /// Block decision used when the record could not be verified
    pub fn unverified(&self) -> Decision {
        Decision::block(UNVERIFIED_NOTICE, UNVERIFIED_NOTICE)
    }

    /// Instruction listing the calls still required
    pub fn blocked_message(&self, missing: &[InitStep], project: &str) -> String {
        let calls: Vec<String> = missing.iter().map(|step| self.call_for(*step, project)).collect();
        format!("Tool blocked. Still need to call: {}", calls.join(" AND "))
    }

    /// Message after a step's tool call completed.
    ///
    /// Returns `None` when the step did not complete successfully.
    pub fn progress_message(&self, step: InitStep, record: &ActivationRecord) -> Option<String> {
        let required = self.required_steps();
        if record.is_complete(required) {
            return Some(FULLY_INITIALIZED.to_string());
        }
        if !record.get(step).is_done() {
            return None;
        }

        let remaining: Vec<String> = required
            .iter()
            .filter(|other| **other != step && !record.get(**other).is_satisfied())
            .map(|other| self.short_call_for(*other))
            .collect();

        if remaining.is_empty() {
            Some(format!("✓ {}. Waiting for other steps to complete.", step.label()))
        } else {
            Some(format!("✓ {}. Still need: {}", step.label(), remaining.join(", ")))
        }
    }

    fn call_for(&self, step: InitStep, project: &str) -> String {
        match step {
            InitStep::ActivateProject => format!("{}(project='{}')", self.config.activation_tool(), project),
            InitStep::InitialInstructions => format!("{}()", self.config.instructions_tool()),
            InitStep::CriticalBehaviors => format!(
                "{}(memory_file_name='{}')",
                self.config.read_memory_tool(),
                self.config.critical_memory
            ),
        }
    }

    fn short_call_for(&self, step: InitStep) -> String {
        match step {
            InitStep::ActivateProject => "activate_project()".to_string(),
            InitStep::InitialInstructions => "initial_instructions()".to_string(),
            InitStep::CriticalBehaviors => format!("read_memory(memory_name='{}')", self.config.critical_memory),
        }
    }
}
