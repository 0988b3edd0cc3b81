//! Heat stopwatch CLI library.
//!
//! This crate provides the command-line front end for the timing core:
//! configuration, roster files, the interactive session loop and rendering.

mod cli;
pub mod commands;
mod config;
pub mod driver;
pub mod render;
pub mod roster_file;

pub use cli::{Cli, Commands, RunArgs};
pub use config::Config;
