//! Command-line front end for the context engine.
//!
//! Exposes the pieces `main` wires together so they can be tested without
//! spawning the binary:
//! - [`config`]: file, environment and flag layering into an `EngineConfig`
//! - [`input`]: reading context and webhook JSON from disk
//! - [`commands`]: the `prompt`, `render` and `validate` operations

pub mod commands;
pub mod config;
pub mod input;
