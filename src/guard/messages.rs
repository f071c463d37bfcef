//! Messages shown to the assistant when the Bash guard blocks a command.

use super::command::CommandCategory;

pub fn serena_message(command: &str, category: CommandCategory) -> String {
    let body = match category {
        CommandCategory::FileReading => format!(
            "The command `{command}` reads files. Use Serena's semantic code tools instead.\n\n\
             **For non-code files:**\n\
             - ✅ `Read` tool\n\n\
             **For code files:**\n\
             - ✅ `mcp__plugin_serena_serena__get_symbols_overview` - structure of a file\n\
             - ✅ `mcp__plugin_serena_serena__find_symbol` with `include_body=true` - read specific symbols"
        ),
        CommandCategory::CodeSearch => format!(
            "The command `{command}` searches code. Use Serena's semantic search instead.\n\n\
             **Pattern search:**\n\
             - ✅ `mcp__plugin_serena_serena__search_for_pattern`\n\n\
             **Symbol search:**\n\
             - ✅ `mcp__plugin_serena_serena__find_symbol` - classes, methods, functions by name\n\
             - ✅ `mcp__plugin_serena_serena__find_referencing_symbols` - where a symbol is used"
        ),
        CommandCategory::FileFinding => format!(
            "The command `{command}` finds or lists files. Use Serena's file tools instead; they respect .gitignore.\n\n\
             - ✅ `mcp__plugin_serena_serena__find_file` - find files by mask (e.g. \"*.ts\")\n\
             - ✅ `mcp__plugin_serena_serena__list_dir` - list a directory, optionally recursive"
        ),
        CommandCategory::TextProcessing => format!(
            "The command `{command}` processes text. Use the editing tools instead.\n\n\
             - ✅ `Edit` tool - line-based edits\n\
             - ✅ `mcp__plugin_serena_serena__replace_symbol_body` - replace whole symbols\n\
             - ✅ `Read` tool, then process the content yourself"
        ),
    };
    format!("🚫 **Use Serena tools instead of `{command}`**\n\n{body}")
}

pub fn npm_script_message(command: &str, equivalent: &str) -> String {
    format!(
        "🚫 **Use npm scripts instead of `{command}`**\n\n\
         Direct tool invocations go through the scripts in package.json so every \
         environment runs the same configured version.\n\n\
         **Use instead:**\n\
         - ✅ {equivalent}\n\n\
         Run `npm run` to see all available scripts."
    )
}

pub fn unknown_script_message(script: &str, available: &[String]) -> String {
    let listing = if available.is_empty() {
        "  (none)".to_string()
    } else {
        available
            .iter()
            .map(|s| format!("  - npm run {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "🚫 **Script '{script}' not found in package.json**\n\n\
         **Available scripts:**\n{listing}\n\n\
         Check package.json for the correct script name."
    )
}
