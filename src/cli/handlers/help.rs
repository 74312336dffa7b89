// src/cli/handlers/help.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;
use serde_json::{Value, json};

use crate::{
    cli::registry::{self, BUILTIN_COMMANDS},
    core::resolver::CommandEntry,
    state::ExecutionContext,
    system::phases,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the built-in commands.")]
struct HelpArgs {
    /// Show only this command.
    command: Option<String>,
}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let help_args = HelpArgs::try_parse_from(args)?;
    let catalog = phases::standard_catalog()?;

    let entries: Vec<&CommandEntry> = match help_args.command {
        Some(name) => vec![
            registry::find_builtin(&name)
                .ok_or_else(|| anyhow!(t!("help.error.unknown_command"), command = name))?,
        ],
        None => BUILTIN_COMMANDS.iter().collect(),
    };

    ctx.print(t!("help.header").bold().to_string());
    let mut listing = Vec::with_capacity(entries.len());
    for entry in entries {
        let phase = catalog.name_of(entry.bootstrap);
        ctx.print(format!(
            "  {:<12} {:<15} {}",
            entry.name.cyan(),
            format!("[{}]", phase).dimmed(),
            entry.description
        ));
        if !entry.aliases.is_empty() {
            ctx.print(format!(
                "  {:<12} {} {}",
                "",
                t!("help.label.aliases").dimmed(),
                entry.aliases.join(", ")
            ));
        }
        ctx.print_pipe(entry.name);
        listing.push(json!({
            "name": entry.name,
            "aliases": entry.aliases,
            "bootstrap": phase,
            "description": entry.description,
        }));
    }

    Ok(Value::Array(listing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OutputModes;

    #[test]
    fn test_help_for_one_command() {
        let mut ctx = ExecutionContext::new("ascend", vec![], OutputModes::default());

        let value = handle(&mut ctx, &["st".to_string()]).unwrap();

        assert_eq!(value[0]["name"], json!("status"));
        assert_eq!(value[0]["bootstrap"], json!("root"));
        assert_eq!(ctx.pipe_output(), "status\n");
    }

    #[test]
    fn test_help_for_unknown_command_fails() {
        let mut ctx = ExecutionContext::new("ascend", vec![], OutputModes::default());
        assert!(handle(&mut ctx, &["bogus".to_string()]).is_err());
    }
}
