// src/system/phases.rs

use crate::{
    constants::{
        DEFAULT_SITE, SETTING_ACCOUNT, SETTING_CWD, SETTING_EXTENSIONS, SETTING_ROOT,
        SETTING_SITE, SETTING_SITE_CONFIG, SETTING_SITE_PATH, SETTING_USER, SETTING_VERSION,
        SITE_CONFIG_FILENAME,
    },
    core::{
        paths,
        phases::{CatalogError, Elevate, PhaseCatalog, PhaseDescriptor},
    },
    models::{ErrorCode, ErrorRecord, LogCategory, PhaseRank},
    state::ExecutionContext,
};
use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::{env, fs, path::PathBuf};

pub const LAUNCHER: PhaseRank = PhaseRank(0);
pub const ROOT: PhaseRank = PhaseRank(1);
pub const SITE: PhaseRank = PhaseRank(2);
pub const CONFIGURATION: PhaseRank = PhaseRank(3);
pub const FULL: PhaseRank = PhaseRank(4);
pub const LOGIN: PhaseRank = PhaseRank(5);

/// Builds the catalog the `ascend` binary climbs through.
pub fn standard_catalog() -> Result<PhaseCatalog, CatalogError> {
    PhaseCatalog::new(vec![
        PhaseDescriptor::new(LAUNCHER, "launcher", LauncherPhase),
        PhaseDescriptor::new(ROOT, "root", RootPhase),
        PhaseDescriptor::new(SITE, "site", SitePhase),
        PhaseDescriptor::new(CONFIGURATION, "configuration", ConfigurationPhase),
        PhaseDescriptor::new(FULL, "full", FullPhase),
        PhaseDescriptor::new(LOGIN, "login", LoginPhase),
    ])
}

// --- Shared lookups (pure, so validation can use them too) ---

fn locate_root(ctx: &ExecutionContext) -> Result<PathBuf, ErrorRecord> {
    if let Some(requested) = ctx.setting_str(SETTING_ROOT) {
        let requested = PathBuf::from(requested);
        return if paths::is_workspace_root(&requested) {
            Ok(dunce::simplified(&requested).to_path_buf())
        } else {
            Err(ErrorRecord::new(
                ErrorCode::framework("NO_ROOT"),
                format!(t!("phase.root.not_a_workspace"), path = requested.display()),
            ))
        };
    }

    ctx.setting_str(SETTING_CWD)
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .as_deref()
        .and_then(paths::find_workspace_root)
        .ok_or_else(|| ErrorRecord::new(ErrorCode::framework("NO_ROOT"), t!("phase.root.not_found")))
}

fn locate_site(ctx: &ExecutionContext) -> Result<(String, PathBuf), ErrorRecord> {
    let root = locate_root(ctx)?;
    let site = ctx.setting_str(SETTING_SITE).unwrap_or(DEFAULT_SITE).to_string();
    let dir = paths::site_dir(&root, &site);
    if dir.is_dir() {
        Ok((site, dir))
    } else {
        Err(ErrorRecord::new(
            ErrorCode::framework("SITE_NOT_FOUND"),
            format!(t!("phase.site.not_found"), site = site, root = root.display()),
        ))
    }
}

fn site_config_path(ctx: &ExecutionContext) -> Result<PathBuf, ErrorRecord> {
    let (site, dir) = locate_site(ctx)?;
    let path = dir.join(SITE_CONFIG_FILENAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ErrorRecord::new(
            ErrorCode::framework("SITE_CONFIG_MISSING"),
            format!(t!("phase.configuration.missing"), site = site, path = path.display()),
        ))
    }
}

fn site_config<'a>(ctx: &'a ExecutionContext, key: &str) -> Option<&'a Value> {
    ctx.setting(SETTING_SITE_CONFIG).and_then(|config| config.get(key))
}

// --- Phases ---

/// Rank 0: the engine itself. Nothing outside the process is required.
#[derive(Debug)]
pub struct LauncherPhase;

impl Elevate for LauncherPhase {
    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        ctx.set_setting(SETTING_VERSION, env!("CARGO_PKG_VERSION"));
        Ok(())
    }
}

/// Rank 1: a workspace root (a directory holding `.ascend/`).
#[derive(Debug)]
pub struct RootPhase;

impl Elevate for RootPhase {
    fn validate(&self, ctx: &ExecutionContext) -> Vec<ErrorRecord> {
        locate_root(ctx).err().into_iter().collect()
    }

    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let root = locate_root(ctx).map_err(|e| anyhow!(e.message))?;
        ctx.log(
            format!(t!("phase.root.found"), path = root.display()),
            LogCategory::Bootstrap,
        );
        ctx.set_setting(SETTING_ROOT, root.display().to_string());
        Ok(())
    }
}

/// Rank 2: the addressed site exists inside the workspace.
#[derive(Debug)]
pub struct SitePhase;

impl Elevate for SitePhase {
    fn validate(&self, ctx: &ExecutionContext) -> Vec<ErrorRecord> {
        locate_site(ctx).err().into_iter().collect()
    }

    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let (site, dir) = locate_site(ctx).map_err(|e| anyhow!(e.message))?;
        ctx.set_setting(SETTING_SITE, site);
        ctx.set_setting(SETTING_SITE_PATH, dir.display().to_string());
        Ok(())
    }
}

/// Rank 3: the site's `site.toml` is loaded.
#[derive(Debug)]
pub struct ConfigurationPhase;

impl Elevate for ConfigurationPhase {
    fn validate(&self, ctx: &ExecutionContext) -> Vec<ErrorRecord> {
        site_config_path(ctx).err().into_iter().collect()
    }

    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let path = site_config_path(ctx).map_err(|e| anyhow!(e.message))?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read '{}'", path.display()))?;
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        ctx.set_setting(SETTING_SITE_CONFIG, serde_json::to_value(table)?);
        Ok(())
    }

    fn abort(&self, ctx: &mut ExecutionContext) {
        ctx.remove_setting(SETTING_SITE_CONFIG);
    }
}

/// Rank 4: the site's extensions are loaded.
#[derive(Debug)]
pub struct FullPhase;

impl Elevate for FullPhase {
    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let extensions: Vec<String> = match site_config(ctx, "extensions") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow!(t!("phase.full.invalid_extension")))
                })
                .collect::<Result<_>>()?,
            Some(_) => return Err(anyhow!(t!("phase.full.invalid_extension"))),
        };

        for extension in &extensions {
            ctx.log(
                format!(t!("phase.full.loaded"), extension = extension),
                LogCategory::Bootstrap,
            );
        }
        ctx.set_setting(SETTING_EXTENSIONS, extensions);
        Ok(())
    }

    fn abort(&self, ctx: &mut ExecutionContext) {
        ctx.remove_setting(SETTING_EXTENSIONS);
    }
}

/// Rank 5: the requested user, if any, is logged in.
#[derive(Debug)]
pub struct LoginPhase;

impl LoginPhase {
    fn find_account(ctx: &ExecutionContext, requested: &str) -> Option<Value> {
        let users = site_config(ctx, "users")?.as_array()?;
        let by_id = requested.parse::<i64>().ok();
        users
            .iter()
            .find(|user| match by_id {
                Some(id) => user.get("id").and_then(Value::as_i64) == Some(id),
                None => user.get("name").and_then(Value::as_str) == Some(requested),
            })
            .cloned()
    }
}

impl Elevate for LoginPhase {
    fn elevate(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let Some(requested) = ctx.setting_str(SETTING_USER).map(str::to_string) else {
            log::debug!("No user requested; continuing anonymously.");
            return Ok(());
        };

        match Self::find_account(ctx, &requested) {
            Some(account) => {
                ctx.log(
                    format!(t!("phase.login.success"), user = requested),
                    LogCategory::Success,
                );
                ctx.set_setting(SETTING_ACCOUNT, account);
                Ok(())
            }
            None => {
                let message = if requested.parse::<i64>().is_ok() {
                    format!(t!("phase.login.failed_id"), user = requested)
                } else {
                    format!(t!("phase.login.failed_name"), user = requested)
                };
                ctx.set_error(ErrorCode::framework("USER_LOGIN_FAILED"), message.clone());
                Err(anyhow!(message))
            }
        }
    }
}
