//! CLI command implementations
//!
//! - `check`: analyze sources and report findings
//! - `fix`: apply fixes and write the changed sources
//! - `info`: rule list, JSON schemas, syntax tree dump
//! - `util`: argument parsing and loading shared by the commands

pub mod check;
pub mod fix;
pub mod info;
pub mod util;

pub use check::cmd_check;
pub use fix::cmd_fix;
pub use info::{cmd_rules, cmd_schema, cmd_sexp};
