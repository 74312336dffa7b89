// src/cli/handlers/extensions.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use serde_json::Value;

use crate::{constants::SETTING_EXTENSIONS, state::ExecutionContext};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the extensions loaded for the site.")]
struct ExtensionsArgs {}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let _extensions_args = ExtensionsArgs::try_parse_from(args)?;

    let extensions: Vec<String> = ctx
        .setting(SETTING_EXTENSIONS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if extensions.is_empty() {
        ctx.print(t!("extensions.none").dimmed().to_string());
    }
    for extension in &extensions {
        ctx.print(format!("  - {}", extension.cyan()));
        ctx.print_pipe(extension);
    }

    Ok(Value::from(extensions))
}
