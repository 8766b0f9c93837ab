//! # CLI Command Implementations
//!
//! Each subcommand of `packmap` lives in its own file with an `Args` struct
//! derived with `clap` and an `execute` function that calls into the
//! `packmap` library.

pub mod apply;
pub mod validate;
