//! CLI command handlers

pub mod commands;

pub use commands::{init, labels, new_document, set, show};
