// src/cli/registry.rs

use crate::{
    cli::handlers,
    core::resolver::{CommandEntry, CommandRegistry},
    system::phases::{CONFIGURATION, FULL, LAUNCHER, LOGIN, ROOT},
};

/// The commands the `ascend` binary ships with.
pub static BUILTIN_COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "version",
        aliases: &[],
        bootstrap: LAUNCHER,
        available_from: LAUNCHER,
        description: "Show the engine version.",
        handler: handlers::version::handle,
    },
    CommandEntry {
        name: "help",
        aliases: &[],
        bootstrap: LAUNCHER,
        available_from: LAUNCHER,
        description: "List the built-in commands and the phase each one needs.",
        handler: handlers::help::handle,
    },
    CommandEntry {
        name: "status",
        aliases: &["st"],
        bootstrap: ROOT,
        available_from: LAUNCHER,
        description: "Show the workspace root, site and reached phase.",
        handler: handlers::status::handle,
    },
    CommandEntry {
        name: "site-info",
        aliases: &["si"],
        bootstrap: CONFIGURATION,
        available_from: LAUNCHER,
        description: "Show the configuration of the addressed site.",
        handler: handlers::site_info::handle,
    },
    CommandEntry {
        name: "extensions",
        aliases: &["ext"],
        bootstrap: FULL,
        available_from: LAUNCHER,
        description: "List the extensions loaded for the site.",
        handler: handlers::extensions::handle,
    },
    CommandEntry {
        name: "whoami",
        aliases: &[],
        bootstrap: LOGIN,
        available_from: LAUNCHER,
        description: "Show the logged-in account.",
        handler: handlers::whoami::handle,
    },
];

/// Builds the registry of built-in commands.
pub fn builtin_registry() -> CommandRegistry {
    CommandRegistry::new(BUILTIN_COMMANDS.iter().cloned())
}

/// Finds a built-in command by its name or alias.
pub fn find_builtin(name: &str) -> Option<&'static CommandEntry> {
    BUILTIN_COMMANDS.iter().find(|cmd| cmd.matches(name))
}
