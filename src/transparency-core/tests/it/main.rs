//! Consolidated integration tests for transparency-core.
//!
//! One test binary keeps proptest suites from running as parallel
//! processes. See: https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod alfen;
mod engine;
mod fixtures;
mod mennekes;
mod ocmf;
mod properties;
mod sml;
