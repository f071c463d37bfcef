//! Shell command classification for the Bash guard.

use std::collections::BTreeSet;

/// Commands that read files
const FILE_READING: &[&str] = &["cat", "head", "tail", "less", "more"];

/// Commands that search code
const CODE_SEARCH: &[&str] = &["grep", "rg", "ag", "ack"];

/// Commands that find or list files
const FILE_FINDING: &[&str] = &["find", "fd", "ls", "tree"];

/// Commands that process text in place of proper edits
const TEXT_PROCESSING: &[&str] = &["sed", "awk", "cut", "sort", "uniq"];

/// Tools that must be run through package.json scripts
const NPM_SCRIPT_TOOLS: &[&str] = &[
    "vitest", "jest", "mocha", "ava", // testing
    "eslint", "prettier", "tsc", // linting and type checking
    "vite", "webpack", "rollup", "esbuild", // bundlers
    "wrangler", "vercel", "netlify", // deployment
    "drizzle-kit", "prisma", "typeorm", // ORMs
    "tsx", "ts-node", // TypeScript runners
];

/// `npm <cmd>` shorthands for package.json scripts
const NPM_SCRIPT_SHORTHANDS: &[&str] = &["test", "start", "build", "dev"];

/// npm built-ins that never need a script
const NPM_LIFECYCLE: &[&str] = &[
    "install", "ci", "update", "uninstall", "init", "audit", "fund", "doctor", "version",
];

/// Why a command should go through Serena instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    FileReading,
    CodeSearch,
    FileFinding,
    TextProcessing,
}

impl CommandCategory {
    /// Category of a command name, if it is one Serena replaces
    pub fn of(name: &str) -> Option<Self> {
        if FILE_READING.contains(&name) {
            Some(CommandCategory::FileReading)
        } else if CODE_SEARCH.contains(&name) {
            Some(CommandCategory::CodeSearch)
        } else if FILE_FINDING.contains(&name) {
            Some(CommandCategory::FileFinding)
        } else if TEXT_PROCESSING.contains(&name) {
            Some(CommandCategory::TextProcessing)
        } else {
            None
        }
    }
}

/// What an `npm ...` command invokes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpmInvocation {
    /// A package.json script, explicit (`npm run x`) or shorthand (`npm test`)
    Script(String),
    /// A built-in such as `npm install`
    Lifecycle,
}

/// Classification of a Bash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    UseSerena { command: String, category: CommandCategory },
    UseNpmScript { command: String, equivalent: &'static str },
    UnknownScript { script: String, available: Vec<String> },
}

/// Base command of a shell line: first word of the first pipeline stage.
///
/// `npx <tool>` resolves to `<tool>`.
pub fn command_name(command: &str) -> Option<&str> {
    let first_stage = command.trim().split('|').next()?.trim();
    let mut words = first_stage.split_whitespace();
    let first = words.next()?;
    if first == "npx" {
        if let Some(tool) = words.next() {
            return Some(tool);
        }
    }
    Some(first)
}

/// Parse the script or built-in an `npm` command runs
pub fn parse_npm_command(command: &str) -> Option<NpmInvocation> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let sub = *parts.get(1)?;

    if sub == "run" {
        return parts.get(2).map(|script| NpmInvocation::Script(script.to_string()));
    }
    if NPM_SCRIPT_SHORTHANDS.contains(&sub) {
        return Some(NpmInvocation::Script(sub.to_string()));
    }
    if NPM_LIFECYCLE.contains(&sub) {
        return Some(NpmInvocation::Lifecycle);
    }
    None
}

/// npm script to suggest instead of running a tool directly
pub fn npm_equivalent(tool: &str) -> &'static str {
    match tool {
        "vitest" => "npm test or npm run test:watch",
        "eslint" => "npm run lint or npm run lint:fix",
        "vite" => "npm run dev or npm run build",
        "wrangler" => "npm run deploy or npm run db:migrate:local",
        "drizzle-kit" => "npm run db:studio",
        _ => "npm run <script-name>",
    }
}

/// Classify a command.
///
/// `scripts` is only called for npm script invocations, so package.json is
/// read lazily.
pub fn classify<F>(command: &str, scripts: F) -> Verdict
where
    F: FnOnce() -> BTreeSet<String>,
{
    let Some(name) = command_name(command) else {
        return Verdict::Allow;
    };

    if let Some(category) = CommandCategory::of(name) {
        return Verdict::UseSerena {
            command: name.to_string(),
            category,
        };
    }

    if NPM_SCRIPT_TOOLS.contains(&name) {
        return Verdict::UseNpmScript {
            command: name.to_string(),
            equivalent: npm_equivalent(name),
        };
    }

    if name == "npm" {
        if let Some(NpmInvocation::Script(script)) = parse_npm_command(command) {
            let available = scripts();
            if !available.contains(&script) {
                return Verdict::UnknownScript {
                    script,
                    available: available.into_iter().collect(),
                };
            }
        }
    }

    Verdict::Allow
}
