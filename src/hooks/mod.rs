//! Hook runtime - reads one event from stdin, decides, writes the response.
//!
//! # Contract
//!
//! - **Never crash the host.** Handlers run under `catch_unwind`; every path
//!   yields a decision and an exit code.
//! - **JSON on stdout only.** Diagnostics go to the log file.
//! - **Fail closed in the gate.** A malformed event or a panic blocks;
//!   the advisory hooks allow instead.

use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, warn};

use crate::config::Config;
use crate::domain::{Decision, HookEvent, HookEventName};
use crate::gate::{Gate, GatePolicy};
use crate::guard::BashGuard;
use crate::reminder;

/// Which hook the host invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Gate,
    BashGuard,
    TestReminder,
}

impl HookKind {
    /// Whether failures should block rather than allow
    pub fn fails_closed(&self) -> bool {
        matches!(self, HookKind::Gate)
    }

    fn name(&self) -> &'static str {
        match self {
            HookKind::Gate => "gate",
            HookKind::BashGuard => "bash-guard",
            HookKind::TestReminder => "test-reminder",
        }
    }
}

/// Run a hook over `input`, writing the response to `output`.
///
/// Returns the process exit code for the host.
pub fn run<R: Read, W: Write>(kind: HookKind, config: &Config, mut input: R, mut output: W) -> u8 {
    let mut raw = String::new();
    if let Err(e) = input.read_to_string(&mut raw) {
        warn!("{}: failed to read stdin: {}", kind.name(), e);
    }

    let (event_name, decision) = match HookEvent::parse(&raw) {
        Ok(event) => {
            debug!(
                "{}: {:?} tool={} session={:?}",
                kind.name(),
                event.hook_event_name,
                event.tool_name,
                event.session_id
            );
            (event.hook_event_name, dispatch(kind, config, &event))
        }
        Err(e) => {
            warn!("{}: {}", kind.name(), e);
            (HookEventName::PreToolUse, fallback(kind, config))
        }
    };

    let response = decision.to_response(event_name);
    let json = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
    debug!("{}: responding {}", kind.name(), json);
    if let Err(e) = writeln!(output, "{}", json).and_then(|_| output.flush()) {
        error!("{}: failed to write response: {}", kind.name(), e);
    }

    decision.exit_code()
}

fn dispatch(kind: HookKind, config: &Config, event: &HookEvent) -> Decision {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match kind {
        HookKind::Gate => Gate::from_config(config).handle(event),
        HookKind::BashGuard => BashGuard::from_config(config).handle(event),
        HookKind::TestReminder => reminder::evaluate(event, &config.reminder),
    }));

    result.unwrap_or_else(|_| {
        error!("{}: caught panic", kind.name());
        fallback(kind, config)
    })
}

fn fallback(kind: HookKind, config: &Config) -> Decision {
    if kind.fails_closed() {
        GatePolicy::new(config.gate.clone()).unverified()
    } else {
        Decision::allow()
    }
}
