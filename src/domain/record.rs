//! Activation record persisted per session
//!
//! Serena counts as activated once every required initialization step has
//! at least been invoked. The record tracks each step separately so the gate
//! can tell the assistant exactly what is still missing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the initialization actions that together make up activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStep {
    /// `activate_project` for the current repository
    ActivateProject,
    /// `initial_instructions`
    InitialInstructions,
    /// `read_memory` of the critical-behaviors memory
    CriticalBehaviors,
}

impl InitStep {
    /// All steps in the order they are reported
    pub const ALL: [InitStep; 3] = [
        InitStep::ActivateProject,
        InitStep::InitialInstructions,
        InitStep::CriticalBehaviors,
    ];

    /// Short human label used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            InitStep::ActivateProject => "Serena activated",
            InitStep::InitialInstructions => "Instructions read",
            InitStep::CriticalBehaviors => "critical_behaviors read",
        }
    }
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitStep::ActivateProject => "activate_project",
            InitStep::InitialInstructions => "initial_instructions",
            InitStep::CriticalBehaviors => "critical_behaviors",
        };
        write!(f, "{}", name)
    }
}

/// Progress of a single initialization step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    #[default]
    NotStarted,
    /// Tool call seen, result not yet reported
    Pending,
    /// Tool call completed successfully
    Done,
    /// Tool call reported an error
    Failed,
}

impl StepState {
    /// Whether the step counts toward activation
    pub fn is_satisfied(&self) -> bool {
        matches!(self, StepState::Pending | StepState::Done)
    }

    /// Whether the step finished successfully
    pub fn is_done(&self) -> bool {
        matches!(self, StepState::Done)
    }
}

/// Persisted activation status for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationRecord {
    pub activate_project: StepState,
    pub initial_instructions: StepState,
    pub critical_behaviors: StepState,
    /// Project name reported when activation completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// First time every required step was done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl ActivationRecord {
    /// A record with every step done, as written by a manual activation
    pub fn fully_activated() -> Self {
        let mut record = Self::default();
        for step in InitStep::ALL {
            record.set(step, StepState::Done);
        }
        record.stamp_if_complete(&InitStep::ALL);
        record
    }

    /// State of a step
    pub fn get(&self, step: InitStep) -> StepState {
        match step {
            InitStep::ActivateProject => self.activate_project,
            InitStep::InitialInstructions => self.initial_instructions,
            InitStep::CriticalBehaviors => self.critical_behaviors,
        }
    }

    /// Set the state of a step
    pub fn set(&mut self, step: InitStep, state: StepState) {
        match step {
            InitStep::ActivateProject => self.activate_project = state,
            InitStep::InitialInstructions => self.initial_instructions = state,
            InitStep::CriticalBehaviors => self.critical_behaviors = state,
        }
    }

    /// Record `activated_at` the first time every required step is done
    pub fn stamp_if_complete(&mut self, required: &[InitStep]) -> bool {
        if self.activated_at.is_none() && self.is_complete(required) {
            self.activated_at = Some(Utc::now());
            return true;
        }
        false
    }

    /// Whether every required step has been invoked or completed
    pub fn is_activated(&self, required: &[InitStep]) -> bool {
        required.iter().all(|step| self.get(*step).is_satisfied())
    }

    /// Required steps that still block tool use
    pub fn missing(&self, required: &[InitStep]) -> Vec<InitStep> {
        required
            .iter()
            .copied()
            .filter(|step| !self.get(*step).is_satisfied())
            .collect()
    }

    /// Whether every required step has completed successfully
    pub fn is_complete(&self, required: &[InitStep]) -> bool {
        required.iter().all(|step| self.get(*step).is_done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_activated() {
        let record = ActivationRecord::default();
        assert!(!record.is_activated(&InitStep::ALL));
        assert_eq!(record.missing(&InitStep::ALL), InitStep::ALL.to_vec());
        assert!(record.activated_at.is_none());
    }

    #[test]
    fn test_pending_counts_toward_activation() {
        let mut record = ActivationRecord::default();
        for step in InitStep::ALL {
            record.set(step, StepState::Pending);
        }
        assert!(record.is_activated(&InitStep::ALL));
        assert!(!record.is_complete(&InitStep::ALL));
        assert!(!record.stamp_if_complete(&InitStep::ALL));
        assert!(record.activated_at.is_none());
    }

    #[test]
    fn test_failed_step_blocks() {
        let mut record = ActivationRecord::fully_activated();
        record.set(InitStep::InitialInstructions, StepState::Failed);
        assert!(!record.is_activated(&InitStep::ALL));
        assert_eq!(record.missing(&InitStep::ALL), vec![InitStep::InitialInstructions]);
    }

    #[test]
    fn test_required_subset() {
        let mut record = ActivationRecord::default();
        record.set(InitStep::ActivateProject, StepState::Done);
        assert!(record.is_activated(&[InitStep::ActivateProject]));
        assert!(!record.is_activated(&InitStep::ALL));
    }

    #[test]
    fn test_activated_at_stamped_once() {
        let mut record = ActivationRecord::fully_activated();
        let first = record.activated_at.expect("stamped on completion");
        record.set(InitStep::ActivateProject, StepState::Done);
        assert!(!record.stamp_if_complete(&InitStep::ALL));
        assert_eq!(record.activated_at, Some(first));
    }

    #[test]
    fn test_stamp_respects_required_steps() {
        let mut record = ActivationRecord::default();
        record.set(InitStep::ActivateProject, StepState::Done);
        assert!(!record.stamp_if_complete(&InitStep::ALL));
        assert!(record.stamp_if_complete(&[InitStep::ActivateProject]));
        assert!(record.activated_at.is_some());
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = ActivationRecord::default();
        record.set(InitStep::ActivateProject, StepState::Pending);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["activate_project"], "pending");
        assert_eq!(json["initial_instructions"], "not_started");
        assert!(json.get("project").is_none());
    }

    #[test]
    fn test_partial_json_defaults_missing_steps() {
        let record: ActivationRecord = serde_json::from_str(r#"{"activate_project": "done"}"#).unwrap();
        assert_eq!(record.get(InitStep::ActivateProject), StepState::Done);
        assert_eq!(record.get(InitStep::CriticalBehaviors), StepState::NotStarted);
    }

    #[test]
    fn test_step_display() {
        assert_eq!(InitStep::ActivateProject.to_string(), "activate_project");
        assert_eq!(InitStep::CriticalBehaviors.to_string(), "critical_behaviors");
    }
}
