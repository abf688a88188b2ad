//! Semantic analysis for eis
//!
//! The type resolver walks the AST once, resolving names and annotating
//! every expression with its resolved type.

mod resolver;
mod types;

pub use resolver::TypeResolver;
pub use types::{ExprTypeInfo, QualifiedTypeInfo, ResolvedTarget, ResolvedType, TypeKind};
