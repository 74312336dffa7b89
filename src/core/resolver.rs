// src/core/resolver.rs

use crate::{
    core::phases::PhaseCatalog,
    models::{CommandDefinition, Handler, PhaseRank},
    state::ExecutionContext,
};

/// Finds the command the invocation names, as seen from the phase just reached.
pub trait CommandResolver {
    /// Returns `None` when no command matches. A match whose required phase is
    /// above `reached` carries the validation failures of the phases in
    /// between as its `bootstrap_errors`.
    fn resolve(
        &self,
        ctx: &ExecutionContext,
        reached: PhaseRank,
        phases: &PhaseCatalog,
    ) -> Option<CommandDefinition>;
}

/// Declares a command, its aliases, the phase it requires and its handler.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// The phase the handler needs before it can run.
    pub bootstrap: PhaseRank,
    /// The phase from which the command can be discovered at all.
    pub available_from: PhaseRank,
    pub description: &'static str,
    pub handler: Handler,
}

impl CommandEntry {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// A name-to-definition registry built once at startup.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new(entries: impl IntoIterator<Item = CommandEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.register(entry);
        }
        registry
    }

    /// Adds a command. A command can never run below the phase it becomes
    /// discoverable at, so its requirement is raised to that phase if needed.
    pub fn register(&mut self, mut entry: CommandEntry) {
        if entry.bootstrap < entry.available_from {
            log::debug!(
                "Command '{}' is discovered at phase {}; raising its requirement from {}.",
                entry.name,
                entry.available_from,
                entry.bootstrap
            );
            entry.bootstrap = entry.available_from;
        }
        self.entries.push(entry);
    }

    /// Finds a command by name or alias among those discoverable at `reached`.
    pub fn find_available(&self, name: &str, reached: PhaseRank) -> Option<&CommandEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.available_from <= reached)
            .find(|entry| entry.matches(name))
    }
}

impl CommandResolver for CommandRegistry {
    fn resolve(
        &self,
        ctx: &ExecutionContext,
        reached: PhaseRank,
        phases: &PhaseCatalog,
    ) -> Option<CommandDefinition> {
        let name = ctx.command_name()?;
        let entry = self.find_available(name, reached)?;

        let bootstrap_errors = if entry.bootstrap > reached {
            phases.validate_between(ctx, reached, entry.bootstrap)
        } else {
            Vec::new()
        };

        log::trace!(
            "Resolved '{}' to '{}' at phase {} (requires {}, {} deferred error(s)).",
            name,
            entry.name,
            reached,
            entry.bootstrap,
            bootstrap_errors.len()
        );

        Some(CommandDefinition {
            name: entry.name.to_string(),
            bootstrap: entry.bootstrap,
            handler: entry.handler,
            arguments: ctx.args().iter().skip(1).cloned().collect(),
            bootstrap_errors,
        })
    }
}
