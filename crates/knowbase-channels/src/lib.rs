//! Channel implementations for the knowbase assistant.

pub mod cli;

pub use cli::CliChannel;
