//! Allow/block decisions and the JSON response the host reads back

use serde::Serialize;

use super::event::HookEventName;

/// Exit code the host interprets as "block this action"
pub const BLOCK_EXIT_CODE: u8 = 2;

/// Exit code for every non-blocking outcome
pub const ALLOW_EXIT_CODE: u8 = 0;

/// Outcome of running a hook against one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the tool call proceed, optionally showing a message
    Allow { message: Option<String> },
    /// Reject the tool call
    Block {
        /// Short reason recorded by the host
        reason: String,
        /// Instruction shown to the assistant
        message: String,
    },
}

impl Decision {
    /// Allow silently
    pub fn allow() -> Self {
        Decision::Allow { message: None }
    }

    /// Allow with a message for the assistant
    pub fn allow_with(message: impl Into<String>) -> Self {
        Decision::Allow {
            message: Some(message.into()),
        }
    }

    /// Block with a reason and an instructional message
    pub fn block(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Decision::Block {
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Check if this decision blocks the tool call
    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block { .. })
    }

    /// Message shown to the assistant, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Decision::Allow { message } => message.as_deref(),
            Decision::Block { message, .. } => Some(message),
        }
    }

    /// Process exit code for this decision
    pub fn exit_code(&self) -> u8 {
        if self.is_block() { BLOCK_EXIT_CODE } else { ALLOW_EXIT_CODE }
    }

    /// Build the stdout payload for the host
    pub fn to_response(&self, event_name: HookEventName) -> HookResponse {
        match self {
            Decision::Allow { message } => HookResponse {
                hook_specific_output: None,
                system_message: message.clone(),
            },
            Decision::Block { reason, message } => HookResponse {
                hook_specific_output: Some(HookSpecificOutput {
                    hook_event_name: event_name.as_str().to_string(),
                    permission_decision: "deny".to_string(),
                    permission_decision_reason: reason.clone(),
                }),
                system_message: Some(message.clone()),
            },
        }
    }
}

/// JSON written to stdout; an allow without a message serializes to `{}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub permission_decision: String,
    pub permission_decision_reason: String,
}
