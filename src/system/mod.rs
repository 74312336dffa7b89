//! # System Interaction Layer
//!
//! The concrete bootstrap phases `ascend` climbs through. Each phase touches
//! the outside world (the filesystem, the workspace layout, a site's
//! `site.toml`) and publishes what it finds as settings on the execution
//! context.
//!
//! ## Modules
//!
//! - **`phases`**: The standard phase catalog, from the launcher up to user
//!   login, along with the lookups each phase shares with its validation.

pub mod phases;
