//! Campus navigation CLI library.
//!
//! This crate provides the graph loading and output formatting used by the
//! `campusnav-cli` binary.

pub mod loader;
pub mod output;
