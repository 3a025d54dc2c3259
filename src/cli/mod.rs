//! Command-line interface module.

mod args;
pub mod compare;
pub mod compress;
pub mod lazy;
pub mod probe;

pub use args::{Cli, CompareAction, Commands};
