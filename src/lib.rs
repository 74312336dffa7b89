//! `ascend`: a staged bootstrap-and-dispatch engine.
//!
//! The engine elevates a process through an ordered catalog of readiness
//! phases, resolves the invoked command after every elevation, dispatches it
//! at the earliest phase that satisfies its requirement, and always finishes
//! with a single finalization step that decides the output and exit status.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
