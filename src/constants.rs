// src/constants.rs

/// Exit status when no error was recorded during the run.
pub const SUCCESS: i32 = 0;

/// Exit status whenever at least one error was recorded.
pub const FRAMEWORK_ERROR: i32 = 1;

/// The name of the directory that marks a workspace root.
pub const WORKSPACE_DIR: &str = ".ascend";

/// The name of the directory (inside `.ascend/`) holding addressable sites.
pub const SITES_DIR: &str = "sites";

/// The name of a site's configuration file (inside `.ascend/sites/<site>/`).
pub const SITE_CONFIG_FILENAME: &str = "site.toml";

/// The site used when none is addressed explicitly.
pub const DEFAULT_SITE: &str = "default";

/// The name of the runtime configuration file (in `~/.config/ascend/`).
pub const RUNTIME_CONFIG_FILENAME: &str = "ascend.toml";

/// Prefix for environment variables that override the runtime configuration.
pub const ENV_PREFIX: &str = "ASCEND_";

/// Frames the structured payload emitted in backend mode.
pub const BACKEND_OUTPUT_START: &str = "ASCEND_BACKEND_OUTPUT_START>>>";
/// Closes the structured payload emitted in backend mode.
pub const BACKEND_OUTPUT_END: &str = "<<<ASCEND_BACKEND_OUTPUT_END";

// --- Named settings kept in the execution context ---

/// Directory the invocation started from.
pub const SETTING_CWD: &str = "cwd";
/// Workspace root; requested by configuration, then resolved by the root phase.
pub const SETTING_ROOT: &str = "root";
/// Addressed site name.
pub const SETTING_SITE: &str = "site";
/// Directory of the selected site.
pub const SETTING_SITE_PATH: &str = "site_path";
/// Parsed `site.toml` of the selected site.
pub const SETTING_SITE_CONFIG: &str = "site.config";
/// Extensions loaded by the full phase.
pub const SETTING_EXTENSIONS: &str = "extensions";
/// Requested user account.
pub const SETTING_USER: &str = "user";
/// The account logged in by the login phase.
pub const SETTING_ACCOUNT: &str = "account";
/// Engine version, recorded by the launcher phase.
pub const SETTING_VERSION: &str = "engine.version";
