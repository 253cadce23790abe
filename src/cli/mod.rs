//! Command-line interface for the `bronze-loader` binary

pub mod commands;
pub mod error;
pub mod logging;
