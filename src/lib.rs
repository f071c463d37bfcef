//! serena-hooks - assistant hooks around the Serena semantic code tools
//!
//! The host invokes one hook per tool call with a JSON event on stdin. The
//! initialization gate blocks tool use until Serena has been activated for the
//! session; the Bash guard and test reminder steer how the assistant works.

pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod guard;
pub mod hooks;
pub mod project;
pub mod reminder;
pub mod storage;

pub use error::{HookError, Result};
