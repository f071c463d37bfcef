//! Hook event payloads
//!
//! The host pipes one JSON object per tool invocation. Only the fields the
//! hooks look at are modeled; everything else is ignored.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{HookError, Result};

/// Lifecycle point the host invoked the hook at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum HookEventName {
    /// Before a tool runs; the only point where blocking is meaningful
    PreToolUse,
    /// After a tool finished (successfully or not)
    PostToolUse,
    /// Any lifecycle point we do not handle
    #[default]
    #[serde(other)]
    Other,
}

impl HookEventName {
    /// Wire name used in `hookSpecificOutput.hookEventName`
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::Other => "Other",
        }
    }
}

/// A single tool-invocation event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookEvent {
    pub hook_event_name: HookEventName,
    pub tool_name: String,
    pub tool_input: Value,
    pub tool_error: Option<Value>,
    pub session_id: Option<String>,
    pub cwd: Option<PathBuf>,
}

impl HookEvent {
    /// Parse an event from the raw stdin payload.
    ///
    /// Anything that is not a JSON object is rejected as malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| HookError::MalformedEvent(e.to_string()))?;
        if !value.is_object() {
            return Err(HookError::MalformedEvent("payload is not a JSON object".to_string()));
        }
        serde_json::from_value(value).map_err(|e| HookError::MalformedEvent(e.to_string()))
    }

    /// Create a PreToolUse event for a tool
    pub fn pre_tool_use(tool_name: impl Into<String>) -> Self {
        Self {
            hook_event_name: HookEventName::PreToolUse,
            tool_name: tool_name.into(),
            tool_input: Value::Object(Default::default()),
            ..Default::default()
        }
    }

    /// Create a PostToolUse event for a tool
    pub fn post_tool_use(tool_name: impl Into<String>) -> Self {
        Self {
            hook_event_name: HookEventName::PostToolUse,
            ..Self::pre_tool_use(tool_name)
        }
    }

    /// Attach a session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach the tool input payload
    pub fn with_input(mut self, input: Value) -> Self {
        self.tool_input = input;
        self
    }

    /// Mark the tool as having failed
    pub fn with_error(mut self, error: Value) -> Self {
        self.tool_error = Some(error);
        self
    }

    /// Attach the working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Session id, if the host sent a non-empty one
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Look up a string field in `tool_input`
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }

    /// Whether the host reported a tool failure.
    ///
    /// `null`, `false` and empty strings count as no error.
    pub fn has_tool_error(&self) -> bool {
        match &self.tool_error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}
