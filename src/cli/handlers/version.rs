// src/cli/handlers/version.rs

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};

use crate::state::ExecutionContext;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows the engine version.")]
struct VersionArgs {}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let _version_args = VersionArgs::try_parse_from(args)?;
    let version = env!("CARGO_PKG_VERSION");

    ctx.print(format!(t!("version.output"), version = version));
    ctx.print_pipe(version);

    Ok(json!({ "version": version }))
}
