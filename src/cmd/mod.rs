//! Subcommand modules for the `criscan` binary.

pub mod search;
