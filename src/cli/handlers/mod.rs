// src/cli/handlers/mod.rs

// One module per built-in command; each exposes a `handle` function.

pub mod extensions;
pub mod help;
pub mod site_info;
pub mod status;
pub mod version;
pub mod whoami;
