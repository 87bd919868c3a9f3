//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod ask;
pub mod ingest;
pub mod init;
pub mod memory;
pub mod search;
