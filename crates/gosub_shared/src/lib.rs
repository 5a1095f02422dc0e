//! Shared functionality
//!
//! This crate supplies the functionality shared between the css crates: source spans and
//! the common error and result types.
//!

pub mod errors;
pub mod span;
pub mod types;
