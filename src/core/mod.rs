//! Export pipeline and its supporting pieces.

pub mod cancel;
pub mod config;
pub mod decrypt;
pub mod entry;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod walker;
pub mod writer;
