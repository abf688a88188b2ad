//! Resolved-type representation for semantic analysis
//!
//! These values are what the resolver writes into the AST's resolved-type
//! slots. They are separate from the syntactic type expressions the parser
//! builds; several AST nodes may share one resolved instance through the
//! `Rc` handle.

use std::fmt;
use std::rc::Rc;

use crate::parser::ast::NumericConversionType;

/// Shared handle to a resolved type
pub type QualifiedTypeInfo = Rc<ResolvedType>;

/// A fully resolved type with its qualifiers
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub kind: TypeKind,
    pub is_const: bool,
    pub is_ref: bool,
}

/// The kind of a resolved type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Int,
    Float,
    String,
    Null,
    /// A class instance type, identified by class name
    Class(String),
    /// A list with its element type
    List(QualifiedTypeInfo),
    /// A tuple with its element types
    Tuple(Vec<QualifiedTypeInfo>),
    /// A function or method value
    Function {
        params: Vec<QualifiedTypeInfo>,
        ret: QualifiedTypeInfo,
    },
    /// An integer range produced by `..` / `..=`
    Range,
    /// Sentinel used for error recovery; compatible with everything
    Error,
}

impl ResolvedType {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            is_const: false,
            is_ref: false,
        }
    }

    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    pub fn int() -> Self {
        Self::new(TypeKind::Int)
    }

    pub fn float() -> Self {
        Self::new(TypeKind::Float)
    }

    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class(name.into()))
    }

    pub fn list(element: QualifiedTypeInfo) -> Self {
        Self::new(TypeKind::List(element))
    }

    pub fn tuple(elements: Vec<QualifiedTypeInfo>) -> Self {
        Self::new(TypeKind::Tuple(elements))
    }

    pub fn function(params: Vec<QualifiedTypeInfo>, ret: QualifiedTypeInfo) -> Self {
        Self::new(TypeKind::Function { params, ret })
    }

    pub fn range() -> Self {
        Self::new(TypeKind::Range)
    }

    /// The recovery sentinel
    pub fn error() -> Self {
        Self::new(TypeKind::Error)
    }

    pub fn with_qualifiers(mut self, is_const: bool, is_ref: bool) -> Self {
        self.is_const = is_const;
        self.is_ref = is_ref;
        self
    }

    /// Wrap into the shared handle
    pub fn shared(self) -> QualifiedTypeInfo {
        Rc::new(self)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TypeKind::Bool | TypeKind::Error)
    }

    pub fn is_int(&self) -> bool {
        matches!(self.kind, TypeKind::Int | TypeKind::Error)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, TypeKind::Float)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TypeKind::Int | TypeKind::Float | TypeKind::Error)
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, TypeKind::String)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, TypeKind::Null)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, TypeKind::List(_) | TypeKind::Error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Class(name) => Some(name),
            _ => None,
        }
    }

    /// The element type if this is a list
    pub fn element_type(&self) -> Option<&QualifiedTypeInfo> {
        match &self.kind {
            TypeKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// Structural equality that ignores `const`/`ref` qualifiers; the
    /// error sentinel matches anything
    pub fn same_base(&self, other: &ResolvedType) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Error, _) | (_, TypeKind::Error) => true,
            (TypeKind::Bool, TypeKind::Bool)
            | (TypeKind::Int, TypeKind::Int)
            | (TypeKind::Float, TypeKind::Float)
            | (TypeKind::String, TypeKind::String)
            | (TypeKind::Null, TypeKind::Null)
            | (TypeKind::Range, TypeKind::Range) => true,
            (TypeKind::Class(a), TypeKind::Class(b)) => a == b,
            (TypeKind::List(a), TypeKind::List(b)) => a.same_base(b),
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_base(y))
            }
            (
                TypeKind::Function { params: ap, ret: ar },
                TypeKind::Function { params: bp, ret: br },
            ) => {
                ap.len() == bp.len()
                    && ap.iter().zip(bp).all(|(x, y)| x.same_base(y))
                    && ar.same_base(br)
            }
            _ => false,
        }
    }

    /// Check whether a value of this type can be bound to `target`
    ///
    /// Returns the numeric conversion to record on the assignment slot, or
    /// `None` when the assignment is ill-typed. `int` widens to `float`;
    /// `null` binds to class-typed and `ref` targets; the error sentinel
    /// binds anywhere so recovery does not cascade.
    pub fn assignable_to(&self, target: &ResolvedType) -> Option<NumericConversionType> {
        if self.is_error() || target.is_error() {
            return Some(NumericConversionType::None);
        }
        if self.same_base(target) {
            return Some(NumericConversionType::None);
        }
        if matches!(self.kind, TypeKind::Int) && matches!(target.kind, TypeKind::Float) {
            return Some(NumericConversionType::IntToFloat);
        }
        if self.is_null() && (target.is_class() || target.is_ref) {
            return Some(NumericConversionType::None);
        }
        None
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        if self.is_ref {
            write!(f, "ref ")?;
        }
        match &self.kind {
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Int => write!(f, "int"),
            TypeKind::Float => write!(f, "float"),
            TypeKind::String => write!(f, "string"),
            TypeKind::Null => write!(f, "null"),
            TypeKind::Class(name) => write!(f, "{}", name),
            TypeKind::List(element) => write!(f, "[{}]", element),
            TypeKind::Tuple(elements) => {
                write!(f, "{{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "}}")
            }
            TypeKind::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)
            }
            TypeKind::Range => write!(f, "range"),
            TypeKind::Error => write!(f, "<error>"),
        }
    }
}

/// What a resolved expression refers to
///
/// Most expressions are plain values; variables can also name module-level
/// functions and classes, and `::` scope names resolve to whole modules.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    Value,
    Function(String),
    Method { class: String, name: String },
    Class(String),
    Module(usize),
}

/// The annotation the resolver writes into every expression node
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTypeInfo {
    pub ty: QualifiedTypeInfo,
    pub target: ResolvedTarget,
}

impl ExprTypeInfo {
    pub fn value(ty: QualifiedTypeInfo) -> Self {
        Self {
            ty,
            target: ResolvedTarget::Value,
        }
    }

    pub fn function(name: impl Into<String>, ty: QualifiedTypeInfo) -> Self {
        Self {
            ty,
            target: ResolvedTarget::Function(name.into()),
        }
    }

    pub fn class(name: impl Into<String>, ty: QualifiedTypeInfo) -> Self {
        Self {
            ty,
            target: ResolvedTarget::Class(name.into()),
        }
    }

    pub fn module(index: usize, ty: QualifiedTypeInfo) -> Self {
        Self {
            ty,
            target: ResolvedTarget::Module(index),
        }
    }

    /// The recovery annotation
    pub fn error() -> Self {
        Self::value(ResolvedType::error().shared())
    }
}
