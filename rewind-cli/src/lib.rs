//! Rewind CLI - Command-line interface for the Rewind migration engine.
//!
//! This crate provides the `rewind` binary: reconcile a SQLite database with
//! a migrations directory, inspect what would change, and create new
//! migration files.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
