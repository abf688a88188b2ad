//! eisc - front end of the eis compiler
//!
//! This crate turns eis source text into a typed abstract syntax tree:
//! scanner -> parser (with recursive module loading) -> type resolver, with
//! all phases reporting through a shared diagnostics engine.

pub mod analysis;
pub mod errors;
pub mod lexer;
pub mod module;
pub mod parser;

use std::path::PathBuf;

// Re-export commonly used types
pub use analysis::{ExprTypeInfo, TypeResolver};
pub use errors::{Diagnostics, EisError, EisResult, SourceSpan};
pub use lexer::{Scanner, Token, TokenKind};
pub use module::{Module, ModuleRegistry};
pub use parser::Parser;

/// Run the whole front end over one module's source
///
/// Imported modules end up in the registry, fully resolved; the returned
/// module is the one the source belongs to. Check
/// [`Diagnostics::had_error`] afterwards for overall success.
pub fn compile(
    source: &str,
    name: &str,
    directory: PathBuf,
    registry: &mut ModuleRegistry,
    diagnostics: &mut Diagnostics,
) -> Module {
    diagnostics.set_source(source);
    diagnostics.set_module_name(name);
    registry.begin_loading(name);

    let tokens = Scanner::new(source, diagnostics).scan();
    let module = Module::new(name, directory);
    let mut module = Parser::new(tokens, module, 0, registry, diagnostics).parse();
    TypeResolver::new(&mut module, registry, diagnostics).check();

    registry.finish_loading(name);
    module
}
