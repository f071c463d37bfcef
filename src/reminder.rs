//! Test reminder - nudges the assistant to run tests after editing source files.
//!
//! Purely advisory: never blocks.

use log::debug;

use crate::config::ReminderConfig;
use crate::domain::{Decision, HookEvent, HookEventName};

pub const TEST_REMINDER: &str = "🧪 **Reminder: run tests after editing source files**

You modified a source file. Verify the change with tests before moving on.

**If you edited a test file** (e.g. `*.test.ts`):
```bash
npm test -- --testPathPattern=<filename>
```

**If you edited a source file:**
```bash
npm test --watchAll=false
```

- ✅ Run tests after every significant change
- ✅ Make sure tests pass before committing
- ✅ Add or update tests when behavior changes";

/// Decide whether an event deserves a reminder
pub fn evaluate(event: &HookEvent, config: &ReminderConfig) -> Decision {
    if event.hook_event_name != HookEventName::PostToolUse {
        return Decision::allow();
    }
    if !config.edit_tools.iter().any(|tool| *tool == event.tool_name) {
        return Decision::allow();
    }
    if event.has_tool_error() {
        debug!("Skipping test reminder, {} failed", event.tool_name);
        return Decision::allow();
    }

    let file_path = event.input_str("file_path").unwrap_or_default();
    if !config.extensions.iter().any(|ext| file_path.ends_with(ext.as_str())) {
        return Decision::allow();
    }

    debug!("Reminding to run tests after editing {}", file_path);
    Decision::allow_with(TEST_REMINDER)
}
