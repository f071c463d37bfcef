//! Domain types for serena-hooks
//!
//! - HookEvent: the tool-invocation payload the host pipes to stdin
//! - ActivationRecord: per-session initialization progress
//! - Decision: allow/block outcome and its JSON response

pub mod decision;
pub mod event;
pub mod record;

pub use decision::{ALLOW_EXIT_CODE, BLOCK_EXIT_CODE, Decision, HookResponse, HookSpecificOutput};
pub use event::{HookEvent, HookEventName};
pub use record::{ActivationRecord, InitStep, StepState};
