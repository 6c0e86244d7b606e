//! Data structures shared by the pipeline and the CLI.

pub mod config;
pub mod diagnostic;
pub mod record;
