//! Initialization gate - blocks tool use until Serena is initialized for the session.
//!
//! `GatePolicy` holds the decision logic; `Gate` wires it to the marker store,
//! the bypass switch, and git detection.

mod policy;

use log::{debug, info, warn};

pub use policy::{FULLY_INITIALIZED, GatePolicy, UNVERIFIED_NOTICE};

use crate::config::Config;
use crate::domain::{ActivationRecord, Decision, HookEvent, HookEventName, InitStep, StepState};
use crate::error::Result;
use crate::project::{ProjectContext, is_bypassed};
use crate::storage::MarkerStore;

/// Initialization gate bound to a marker store
#[derive(Debug, Clone)]
pub struct Gate {
    policy: GatePolicy,
    store: MarkerStore,
    bypass_env: String,
}

impl Gate {
    pub fn new(policy: GatePolicy, store: MarkerStore, bypass_env: impl Into<String>) -> Self {
        Self {
            policy,
            store,
            bypass_env: bypass_env.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GatePolicy::new(config.gate.clone()),
            MarkerStore::from_config(&config.marker),
            config.bypass_env.clone(),
        )
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    /// Handle one hook event. Every path resolves to a decision.
    pub fn handle(&self, event: &HookEvent) -> Decision {
        if is_bypassed(&self.bypass_env) {
            debug!("Gate bypassed via {}", self.bypass_env);
            return Decision::allow();
        }

        let project = ProjectContext::from_event(event);
        if self.policy.config().require_git_repo && !project.is_git_repo() {
            return Decision::allow();
        }

        match event.hook_event_name {
            HookEventName::PreToolUse => self.pre_tool_use(event, &project),
            HookEventName::PostToolUse => self.post_tool_use(event, &project),
            HookEventName::Other => Decision::allow(),
        }
    }

    fn pre_tool_use(&self, event: &HookEvent, project: &ProjectContext) -> Decision {
        if let Some(step) = self.policy.step_for_event(event) {
            if let Err(e) = self.record_step(event, step, StepState::Pending, project) {
                warn!("Failed to record {} as pending: {}", step, e);
            }
            return Decision::allow();
        }
        if self.policy.is_always_allowed(&event.tool_name) {
            return Decision::allow();
        }

        let record = match self.load(event) {
            Ok(record) => record,
            Err(e) => {
                warn!("Blocking {}: {}", event.tool_name, e);
                return self.policy.unverified();
            }
        };

        if record.is_activated(self.policy.required_steps()) {
            return Decision::allow();
        }

        let decision = self.policy.evaluate(event, &record, &project.project_name());
        if decision.is_block() {
            info!("Blocked {} for session {:?}", event.tool_name, event.session_id);
        }
        decision
    }

    fn post_tool_use(&self, event: &HookEvent, project: &ProjectContext) -> Decision {
        let Some(step) = self.policy.step_for_event(event) else {
            return Decision::allow();
        };

        let state = if event.has_tool_error() {
            StepState::Failed
        } else {
            StepState::Done
        };

        match self.record_step(event, step, state, project) {
            Ok(Some(record)) => match self.policy.progress_message(step, &record) {
                Some(message) => Decision::allow_with(message),
                None => Decision::allow(),
            },
            Ok(None) => Decision::allow(),
            Err(e) => {
                warn!("Failed to record {} as {:?}: {}", step, state, e);
                Decision::allow()
            }
        }
    }

    /// Load the session's record; no session id means nothing was ever activated
    fn load(&self, event: &HookEvent) -> Result<ActivationRecord> {
        match event.session() {
            Some(session_id) => self.store.load(session_id),
            None => {
                debug!("Event has no session_id, treating as not activated");
                Ok(ActivationRecord::default())
            }
        }
    }

    /// Persist a step transition. Returns `None` without a usable session id.
    fn record_step(
        &self,
        event: &HookEvent,
        step: InitStep,
        state: StepState,
        project: &ProjectContext,
    ) -> Result<Option<ActivationRecord>> {
        let Some(session_id) = event.session() else {
            return Ok(None);
        };

        let project_name = (step == InitStep::ActivateProject && state == StepState::Done)
            .then(|| project.project_name());
        let required = self.policy.required_steps();

        let record = self.store.update(session_id, |record| {
            // A repeated invocation never downgrades a completed step
            if !(state == StepState::Pending && record.get(step).is_done()) {
                record.set(step, state);
            }
            if let Some(name) = project_name {
                record.project = Some(name);
            }
            if record.stamp_if_complete(required) {
                info!("Serena fully initialized for session {}", session_id);
            }
        })?;
        debug!("Recorded {} as {:?} for session {}", step, state, session_id);
        Ok(Some(record))
    }
}
