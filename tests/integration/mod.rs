//! Integration tests for the screenshot capture hooks

mod bootstrap_hook;
mod create_node_hook;
