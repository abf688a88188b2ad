//! Modules and the module registry
//!
//! A module is one parsed source file. The registry is the ordered,
//! append-only list of imported modules; imports reference each other by
//! index, so the indices stay stable as the registry grows. The depth of a
//! registry entry is the longest import chain by which the module was
//! reached, used downstream to order initialization.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::parser::ast::{Stmt, TypeExpr, Visibility};

/// Signature of a function or method as declared in the source
///
/// Signatures are recorded by the parser as declarations are recognized.
/// They are clones of the parse-time type syntax, so the resolver can look
/// them up without borrowing into the statement tree.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<(String, TypeExpr)>,
    pub return_type: TypeExpr,
}

/// A class member as declared in the source
#[derive(Debug, Clone)]
pub struct MemberSig {
    pub name: String,
    pub visibility: Visibility,
    /// Declared with the `const` keyword
    pub is_const: bool,
    /// Absent when the type is inferred from the initializer
    pub declared_type: Option<TypeExpr>,
}

/// A method with its visibility
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: String,
    pub visibility: Visibility,
    pub sig: FunctionSig,
}

/// Signature of a class: members and methods with their visibility
#[derive(Debug, Clone)]
pub struct ClassSig {
    pub name: String,
    pub members: Vec<MemberSig>,
    pub methods: Vec<MethodSig>,
    pub has_ctor: bool,
    pub has_dtor: bool,
}

impl ClassSig {
    pub fn member(&self, name: &str) -> Option<&MemberSig> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The constructor's signature, if one was declared
    pub fn ctor(&self) -> Option<&FunctionSig> {
        if !self.has_ctor {
            return None;
        }
        self.method(&self.name).map(|m| &m.sig)
    }
}

/// One parsed source file
#[derive(Debug)]
pub struct Module {
    /// The file's basename, unique within the registry
    pub name: String,
    /// Resolution root for this module's relative imports
    pub directory: PathBuf,
    pub statements: Vec<Stmt>,
    /// Registry indices of the modules this one imports
    pub imported: Vec<usize>,
    pub classes: HashMap<String, ClassSig>,
    pub functions: HashMap<String, FunctionSig>,
    /// `type Name = ...` aliases, recorded by the resolver
    pub type_aliases: HashMap<String, TypeExpr>,
}

impl Module {
    pub fn new(name: impl Into<String>, directory: PathBuf) -> Self {
        Self {
            name: name.into(),
            directory,
            statements: Vec::new(),
            imported: Vec::new(),
            classes: HashMap::new(),
            functions: HashMap::new(),
            type_aliases: HashMap::new(),
        }
    }

    /// The module name without its file extension (`m.eis` -> `m`), the
    /// form usable as a `::` scope name
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => &self.name,
        }
    }
}

/// The ordered list of imported modules with their import depths
///
/// Also tracks the names of modules whose parse is still in progress, so a
/// cyclic import is caught on the second entry instead of recursing.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<(Module, usize)>,
    loading: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            loading: Vec::new(),
        }
    }

    /// Mark a module as currently being parsed
    pub fn begin_loading(&mut self, name: &str) {
        self.loading.push(name.to_string());
    }

    pub fn finish_loading(&mut self, name: &str) {
        if let Some(position) = self.loading.iter().rposition(|n| n == name) {
            self.loading.remove(position);
        }
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, index: usize) -> &Module {
        &self.modules[index].0
    }

    pub fn depth(&self, index: usize) -> usize {
        self.modules[index].1
    }

    /// Find a module by its full name (`m.eis`)
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|(m, _)| m.name == name)
    }

    /// Find a module by its stem (`m`), the form used in scope access
    pub fn find_by_stem(&self, stem: &str) -> Option<usize> {
        self.modules.iter().position(|(m, _)| m.stem() == stem)
    }

    /// Append a module, returning its stable index
    pub fn push(&mut self, module: Module, depth: usize) -> usize {
        self.modules.push((module, depth));
        self.modules.len() - 1
    }

    /// Raise a module's depth and, transitively, its imports' depths
    ///
    /// Recursion only happens when a depth strictly increases, so cyclic
    /// imports terminate.
    pub fn raise_depth(&mut self, index: usize, depth: usize) {
        if self.modules[index].1 >= depth {
            return;
        }
        self.modules[index].1 = depth;
        let imported = self.modules[index].0.imported.clone();
        for import in imported {
            self.raise_depth(import, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, imported: Vec<usize>) -> Module {
        let mut m = Module::new(name, PathBuf::new());
        m.imported = imported;
        m
    }

    #[test]
    fn test_stem() {
        assert_eq!(module("m.eis", vec![]).stem(), "m");
        assert_eq!(module("noext", vec![]).stem(), "noext");
    }

    #[test]
    fn test_raise_depth_is_transitive() {
        let mut registry = ModuleRegistry::new();
        registry.push(module("a.eis", vec![]), 1);
        registry.push(module("b.eis", vec![0]), 1);

        registry.raise_depth(1, 3);
        assert_eq!(registry.depth(1), 3);
        assert_eq!(registry.depth(0), 4);
    }

    #[test]
    fn test_raise_depth_never_lowers() {
        let mut registry = ModuleRegistry::new();
        registry.push(module("a.eis", vec![]), 5);
        registry.raise_depth(0, 2);
        assert_eq!(registry.depth(0), 5);
    }

    #[test]
    fn test_raise_depth_terminates_on_cycles() {
        let mut registry = ModuleRegistry::new();
        registry.push(module("a.eis", vec![1]), 1);
        registry.push(module("b.eis", vec![0]), 2);

        // a <-> b import each other; the monotone guard stops the walk
        registry.raise_depth(0, 3);
        assert_eq!(registry.depth(0), 3);
        assert_eq!(registry.depth(1), 4);
    }
}
