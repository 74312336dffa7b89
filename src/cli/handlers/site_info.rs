// src/cli/handlers/site_info.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;
use serde_json::Value;

use crate::{
    constants::{SETTING_SITE, SETTING_SITE_CONFIG, SETTING_SITE_PATH},
    state::ExecutionContext,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows the configuration of the addressed site.")]
struct SiteInfoArgs {}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let _site_info_args = SiteInfoArgs::try_parse_from(args)?;

    let config = ctx
        .setting(SETTING_SITE_CONFIG)
        .cloned()
        .ok_or_else(|| anyhow!(t!("site_info.error.not_loaded")))?;
    let site = ctx.setting_str(SETTING_SITE).unwrap_or_default().to_string();
    let path = ctx.setting_str(SETTING_SITE_PATH).unwrap_or_default().to_string();

    ctx.print(format!(
        "\n--- {} '{}' ---",
        t!("site_info.header"),
        site.yellow()
    ));
    ctx.print(format!("  {:<15} {}", t!("site_info.label.path").blue(), path));

    if let Value::Object(entries) = &config {
        for (key, value) in entries {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ctx.print(format!("  {:<15} {}", key.blue(), rendered));
        }
    }

    ctx.print_pipe(serde_json::to_string(&config)?);
    Ok(config)
}
