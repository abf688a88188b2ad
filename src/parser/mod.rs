//! Parsing for eis
//!
//! Produces the untyped AST and, through imports, populates the module
//! registry.

pub mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use parser::{Parser, Precedence};
