//! Property-based tests for digest and id determinism
