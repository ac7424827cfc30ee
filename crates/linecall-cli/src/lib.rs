//! # linecall-cli
//!
//! Command-line front end for the linecall pipeline.
//!
//! ## Subcommands
//!
//! - `compile`: compile a line schema and print its artifacts
//! - `convert`: apply a format path to a JSON document
//! - `routes`: register a route manifest and list its descriptors
//! - `call`: execute one manifest route over HTTP or a service mesh
//!
//! Argument parsing lives in `main.rs`; the handlers here return a process
//! exit code and delegate the real work to the library crates.

pub mod call;
pub mod compile;
pub mod manifest;
pub mod routes;
