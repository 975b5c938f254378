//! CLI domain: parse, route and output only.
//! The commands drive the library hooks against a sled-backed host store.

mod output;
mod parse;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
