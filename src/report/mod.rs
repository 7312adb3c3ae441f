//! End-of-run summary renderers.
//!
//! - [`terminal`]: colored summary box and a table of modules that needed action;
//!   respects `--verbose` / `--quiet`. JSON output is a plain `serde_json` dump
//!   of the outcomes and lives in `main`.

pub mod terminal;
