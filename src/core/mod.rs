// src/core/mod.rs

pub mod config_loader;
pub mod dispatcher;
pub mod finalizer;
pub mod paths;
pub mod phases;
pub mod resolver;
pub mod sequencer;
