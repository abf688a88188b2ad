//! The type resolver
//!
//! A single pass over a parsed module that resolves names, checks types,
//! enforces visibility and scoping rules, and annotates every expression
//! node with its resolved type. Failures are reported through diagnostics
//! and resolution continues; recovered slots hold the error sentinel so
//! one mistake does not cascade.

use std::collections::HashMap;
use std::rc::Rc;

use super::types::{ExprTypeInfo, QualifiedTypeInfo, ResolvedTarget, ResolvedType, TypeKind};
use crate::errors::{Diagnostics, SourceSpan};
use crate::lexer::{Token, TokenKind};
use crate::module::{ClassSig, FunctionSig, Module, ModuleRegistry};
use crate::parser::ast::*;

/// One in-scope binding: a local, parameter, or class member
struct Value {
    lexeme: String,
    ty: QualifiedTypeInfo,
    scope_depth: usize,
    mutable: bool,
}

/// Resolved member info for one class
struct MemberInfo {
    name: String,
    visibility: Visibility,
    is_const: bool,
    ty: QualifiedTypeInfo,
}

/// Resolved method info: `ty` is the method's function type
struct MethodInfo {
    name: String,
    visibility: Visibility,
    ty: QualifiedTypeInfo,
}

struct ClassInfo {
    members: Vec<MemberInfo>,
    methods: Vec<MethodInfo>,
}

/// What a class access resolved to
enum ClassEntry {
    Member {
        visibility: Visibility,
        is_const: bool,
        ty: QualifiedTypeInfo,
    },
    Method {
        visibility: Visibility,
        ty: QualifiedTypeInfo,
    },
}

/// Resolves one module in place
pub struct TypeResolver<'a> {
    module: &'a mut Module,
    registry: &'a ModuleRegistry,
    diagnostics: &'a mut Diagnostics,
    values: Vec<Value>,
    /// Resolved member/method types for the classes visible here
    class_info: HashMap<String, ClassInfo>,
    in_ctor: bool,
    in_dtor: bool,
    in_class: bool,
    in_function: bool,
    in_loop: bool,
    in_switch: bool,
    current_class: Option<String>,
    current_return_type: Option<QualifiedTypeInfo>,
    scope_depth: usize,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        module: &'a mut Module,
        registry: &'a ModuleRegistry,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            module,
            registry,
            diagnostics,
            values: Vec::new(),
            class_info: HashMap::new(),
            in_ctor: false,
            in_dtor: false,
            in_class: false,
            in_function: false,
            in_loop: false,
            in_switch: false,
            current_class: None,
            current_return_type: None,
            scope_depth: 0,
        }
    }

    /// Resolve the whole module
    pub fn check(&mut self) {
        // The statements are taken out for the duration of the pass so the
        // module's signature tables stay readable while the tree is
        // annotated in place.
        let mut statements = std::mem::take(&mut self.module.statements);
        self.collect_signatures();
        for stmt in &mut statements {
            self.resolve_stmt(stmt);
        }
        self.module.statements = statements;
    }

    // ==================== Scopes and context ====================

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        while self
            .values
            .last()
            .is_some_and(|v| v.scope_depth == self.scope_depth)
        {
            self.values.pop();
        }
        self.scope_depth -= 1;
    }

    /// Run `body` with a boolean context flag set, restoring the previous
    /// value on every exit path
    fn with_flag<T>(
        &mut self,
        flag: fn(&mut Self) -> &mut bool,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = std::mem::replace(flag(self), true);
        let result = body(self);
        *flag(self) = previous;
        result
    }

    fn error(&mut self, message: &str, span: SourceSpan) -> ExprTypeInfo {
        self.diagnostics.error(message, span);
        ExprTypeInfo::error()
    }

    // ==================== Lookup ====================

    /// Find a class signature in this module, then in directly imported
    /// modules in import order
    fn find_class(&self, name: &str) -> Option<&ClassSig> {
        if let Some(sig) = self.module.classes.get(name) {
            return Some(sig);
        }
        for &import in &self.module.imported {
            if let Some(sig) = self.registry.module(import).classes.get(name) {
                return Some(sig);
            }
        }
        None
    }

    /// Find a function signature in this module, then in directly imported
    /// modules in import order
    fn find_function(&self, name: &str) -> Option<&FunctionSig> {
        if let Some(sig) = self.module.functions.get(name) {
            return Some(sig);
        }
        for &import in &self.module.imported {
            if let Some(sig) = self.registry.module(import).functions.get(name) {
                return Some(sig);
            }
        }
        None
    }

    fn lookup_class_entry(&self, class_name: &str, member: &str) -> Option<ClassEntry> {
        let info = self.class_info.get(class_name)?;
        if let Some(m) = info.members.iter().find(|m| m.name == member) {
            return Some(ClassEntry::Member {
                visibility: m.visibility,
                is_const: m.is_const,
                ty: Rc::clone(&m.ty),
            });
        }
        info.methods
            .iter()
            .find(|m| m.name == member)
            .map(|m| ClassEntry::Method {
                visibility: m.visibility,
                ty: Rc::clone(&m.ty),
            })
    }

    /// Enforce visibility on a class access: public from anywhere,
    /// protected and private only from within the class itself (there is
    /// no inheritance, so protected adds nothing outside)
    fn check_visibility(
        &mut self,
        visibility: Visibility,
        class_name: &str,
        member: &str,
        span: SourceSpan,
    ) {
        let inside = self.current_class.as_deref() == Some(class_name);
        if visibility != Visibility::Public && !inside {
            self.diagnostics.error(
                &format!(
                    "Cannot access {} member '{}' of class '{}'",
                    visibility.name(),
                    member,
                    class_name
                ),
                span,
            );
        }
    }

    // ==================== Signatures ====================

    /// Resolve the declared member and method types of every visible class
    /// up front, so accesses can be checked regardless of statement order.
    /// Members without a declared type are filled in when the class body
    /// itself resolves.
    fn collect_signatures(&mut self) {
        let mut sigs: Vec<ClassSig> = self.module.classes.values().cloned().collect();
        for &import in &self.module.imported.clone() {
            sigs.extend(self.registry.module(import).classes.values().cloned());
        }
        // Table iteration order must not leak into diagnostic order
        sigs.sort_by(|a, b| a.name.cmp(&b.name));

        for sig in sigs {
            let members = sig
                .members
                .iter()
                .map(|m| MemberInfo {
                    name: m.name.clone(),
                    visibility: m.visibility,
                    is_const: m.is_const,
                    ty: match &m.declared_type {
                        Some(ty) => self.resolve_type_value(ty),
                        None => ResolvedType::error().shared(),
                    },
                })
                .collect();
            let methods = sig
                .methods
                .iter()
                .map(|m| MethodInfo {
                    name: m.name.clone(),
                    visibility: m.visibility,
                    ty: self.resolve_signature(&m.sig),
                })
                .collect();
            self.class_info
                .insert(sig.name.clone(), ClassInfo { members, methods });
        }
    }

    /// The function type of a signature
    fn resolve_signature(&mut self, sig: &FunctionSig) -> QualifiedTypeInfo {
        let params = sig
            .params
            .iter()
            .map(|(_, ty)| self.resolve_type_value(ty))
            .collect();
        let ret = self.resolve_type_value(&sig.return_type);
        ResolvedType::function(params, ret).shared()
    }

    // ==================== Types ====================

    /// Resolve a type expression held outside the statement tree
    fn resolve_type_value(&mut self, ty: &TypeExpr) -> QualifiedTypeInfo {
        let mut ty = ty.clone();
        self.resolve_type(&mut ty)
    }

    /// Resolve a type expression, expanding aliases and `typeof`
    fn resolve_type(&mut self, ty: &mut TypeExpr) -> QualifiedTypeInfo {
        let is_const = ty.is_const;
        let is_ref = ty.is_ref;
        let resolved = match &mut ty.kind {
            TypeExprKind::Primitive(kind) => match kind {
                PrimitiveKind::Bool => ResolvedType::bool(),
                PrimitiveKind::Int => ResolvedType::int(),
                PrimitiveKind::Float => ResolvedType::float(),
                PrimitiveKind::String => ResolvedType::string(),
                PrimitiveKind::Null => ResolvedType::null(),
            },
            TypeExprKind::UserDefined(name) => {
                let lexeme = name.lexeme.clone();
                if let Some(aliased) = self.module.type_aliases.get(&lexeme).cloned() {
                    let inner = self.resolve_type_value(&aliased);
                    // the use site's qualifiers are added on top of the
                    // alias's own
                    ResolvedType {
                        kind: inner.kind.clone(),
                        is_const: is_const || inner.is_const,
                        is_ref: is_ref || inner.is_ref,
                    }
                } else if self.find_class(&lexeme).is_some() {
                    ResolvedType::class(lexeme)
                } else {
                    self.diagnostics
                        .error(&format!("Undefined type '{}'", lexeme), name.span);
                    ResolvedType::error()
                }
            }
            TypeExprKind::List { element, size } => {
                let element_ty = self.resolve_type(element);
                if let Some(size) = size {
                    let info = self.resolve_expr(size);
                    if !info.ty.is_int() {
                        self.diagnostics
                            .error("List size expression must have type int", size.token.span);
                    }
                }
                ResolvedType::list(element_ty)
            }
            TypeExprKind::Tuple(elements) => {
                let mut element_types = Vec::new();
                for element in elements.iter_mut() {
                    element_types.push(self.resolve_type(element));
                }
                ResolvedType::tuple(element_types)
            }
            TypeExprKind::Typeof(expr) => {
                let info = self.resolve_expr(expr);
                ResolvedType {
                    kind: info.ty.kind.clone(),
                    is_const: is_const || info.ty.is_const,
                    is_ref: is_ref || info.ty.is_ref,
                }
            }
        };
        // aliases and typeof already folded their own qualifiers in; the
        // use site's are applied on top either way
        ResolvedType {
            is_const: is_const || resolved.is_const,
            is_ref: is_ref || resolved.is_ref,
            kind: resolved.kind,
        }
        .shared()
    }

    // ==================== Expressions ====================

    /// Resolve an expression and fill its resolved-type slot
    pub fn resolve_expr(&mut self, expr: &mut Expr) -> ExprTypeInfo {
        let info = self.resolve_expr_kind(expr);
        expr.resolved = Some(info.clone());
        info
    }

    fn resolve_expr_kind(&mut self, expr: &mut Expr) -> ExprTypeInfo {
        let token = expr.token.clone();
        match &mut expr.kind {
            ExprKind::Literal { value } => {
                let ty = match value {
                    LiteralValue::Int(_) => ResolvedType::int(),
                    LiteralValue::Float(_) => ResolvedType::float(),
                    LiteralValue::String(_) => ResolvedType::string(),
                    LiteralValue::Bool(_) => ResolvedType::bool(),
                    LiteralValue::Null => ResolvedType::null(),
                };
                ExprTypeInfo::value(ty.shared())
            }

            ExprKind::Variable { name } => {
                let lexeme = name.lexeme.clone();
                if let Some(value) = self.values.iter().rev().find(|v| v.lexeme == lexeme) {
                    ExprTypeInfo::value(Rc::clone(&value.ty))
                } else if let Some(sig) = self.find_function(&lexeme) {
                    let sig = sig.clone();
                    let ty = self.resolve_signature(&sig);
                    ExprTypeInfo::function(lexeme, ty)
                } else if self.find_class(&lexeme).is_some() {
                    let ty = ResolvedType::class(lexeme.clone()).shared();
                    ExprTypeInfo::class(lexeme, ty)
                } else {
                    self.error(&format!("Undefined name '{}'", lexeme), name.span)
                }
            }

            ExprKind::Assign {
                target,
                value,
                conversion,
            } => {
                let value_info = self.resolve_expr(value);
                let lexeme = target.lexeme.clone();
                let binding = self
                    .values
                    .iter()
                    .rev()
                    .find(|v| v.lexeme == lexeme)
                    .map(|v| (Rc::clone(&v.ty), v.mutable));
                match binding {
                    Some((ty, mutable)) => {
                        if !mutable {
                            self.diagnostics.error(
                                &format!("Cannot assign to constant '{}'", lexeme),
                                token.span,
                            );
                        }
                        if token.kind != TokenKind::Eq {
                            self.check_compound_operands(&token, &ty, &value_info.ty);
                        }
                        match value_info.ty.assignable_to(&ty) {
                            Some(conv) => *conversion = conv,
                            None => self.diagnostics.error(
                                &format!(
                                    "Cannot assign value of type '{}' to variable of type '{}'",
                                    value_info.ty, ty
                                ),
                                token.span,
                            ),
                        }
                        ExprTypeInfo::value(ty)
                    }
                    None => self.error(&format!("Undefined name '{}'", lexeme), target.span),
                }
            }

            ExprKind::Binary {
                left,
                right,
                conversion,
            } => {
                let left_ty = self.resolve_expr(left).ty;
                let right_ty = self.resolve_expr(right).ty;
                self.resolve_binary(&token, left_ty, right_ty, conversion)
            }

            ExprKind::Logical { left, right } => {
                let left_ty = self.resolve_expr(left).ty;
                let right_ty = self.resolve_expr(right).ty;
                if !left_ty.is_bool() || !right_ty.is_bool() {
                    self.diagnostics.error(
                        &format!("Operands of '{}' must be booleans", token.lexeme),
                        token.span,
                    );
                }
                ExprTypeInfo::value(ResolvedType::bool().shared())
            }

            ExprKind::Unary { operand } => {
                let info = self.resolve_expr(operand);
                match token.kind {
                    TokenKind::Minus | TokenKind::Plus => {
                        if !info.ty.is_numeric() {
                            return self.error(
                                &format!("Operand of unary '{}' must be numeric", token.lexeme),
                                token.span,
                            );
                        }
                        ExprTypeInfo::value(info.ty)
                    }
                    TokenKind::Not => {
                        if !info.ty.is_bool() {
                            return self
                                .error("Operand of 'not' must be a boolean", token.span);
                        }
                        ExprTypeInfo::value(ResolvedType::bool().shared())
                    }
                    TokenKind::Tilde => {
                        if !info.ty.is_int() {
                            return self.error("Operand of '~' must be an integer", token.span);
                        }
                        ExprTypeInfo::value(ResolvedType::int().shared())
                    }
                    // Prefix increment and decrement need a mutable numeric
                    // place to store into
                    TokenKind::PlusPlus | TokenKind::MinusMinus => {
                        let is_place = matches!(
                            operand.kind,
                            ExprKind::Variable { .. } | ExprKind::Get { .. } | ExprKind::Index { .. }
                        );
                        let mutable = match &operand.kind {
                            ExprKind::Variable { name } => self
                                .values
                                .iter()
                                .rev()
                                .find(|v| v.lexeme == name.lexeme)
                                .map(|v| v.mutable)
                                .unwrap_or(true),
                            _ => !info.ty.is_const,
                        };
                        if !(is_place && mutable && info.ty.is_numeric()) {
                            return self.error(
                                &format!(
                                    "Operand of '{}' must be a mutable numeric value",
                                    token.lexeme
                                ),
                                token.span,
                            );
                        }
                        ExprTypeInfo::value(info.ty)
                    }
                    _ => self.error("Invalid unary operator", token.span),
                }
            }

            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition_ty = self.resolve_expr(condition).ty;
                if !condition_ty.is_bool() {
                    self.diagnostics
                        .error("Ternary condition must have type bool", condition.token.span);
                }
                let then_ty = self.resolve_expr(then_expr).ty;
                let else_ty = self.resolve_expr(else_expr).ty;
                if then_ty.same_base(&else_ty) {
                    ExprTypeInfo::value(then_ty)
                } else if then_ty.is_null() && (else_ty.is_class() || else_ty.is_ref) {
                    ExprTypeInfo::value(else_ty)
                } else if else_ty.is_null() && (then_ty.is_class() || then_ty.is_ref) {
                    ExprTypeInfo::value(then_ty)
                } else {
                    self.error(
                        &format!(
                            "Branches of ternary expression have incompatible types '{}' and '{}'",
                            then_ty, else_ty
                        ),
                        token.span,
                    )
                }
            }

            ExprKind::Grouping { expr } => {
                let info = self.resolve_expr(expr);
                ExprTypeInfo::value(info.ty)
            }

            ExprKind::Call { callee, args } => {
                let callee_info = self.resolve_expr(callee);
                if let ResolvedTarget::Class(class_name) = &callee_info.target {
                    let class_name = class_name.clone();
                    let ctor = self
                        .find_class(&class_name)
                        .and_then(|sig| sig.ctor().cloned());
                    match ctor {
                        Some(sig) => {
                            let params: Vec<_> = sig
                                .params
                                .iter()
                                .map(|(_, ty)| self.resolve_type_value(ty))
                                .collect();
                            self.check_args(&params, args, token.span);
                        }
                        None => {
                            for (arg, _) in args.iter_mut() {
                                self.resolve_expr(arg);
                            }
                            if !args.is_empty() {
                                self.diagnostics.error(
                                    &format!("Class '{}' has no constructor", class_name),
                                    token.span,
                                );
                            }
                        }
                    }
                    ExprTypeInfo::value(ResolvedType::class(class_name).shared())
                } else if let TypeKind::Function { params, ret } = &callee_info.ty.kind {
                    let params = params.clone();
                    let ret = Rc::clone(ret);
                    self.check_args(&params, args, token.span);
                    ExprTypeInfo::value(ret)
                } else if callee_info.ty.is_error() {
                    for (arg, _) in args.iter_mut() {
                        self.resolve_expr(arg);
                    }
                    ExprTypeInfo::error()
                } else {
                    for (arg, _) in args.iter_mut() {
                        self.resolve_expr(arg);
                    }
                    self.error(
                        "Can only call functions, methods and class constructors",
                        callee.token.span,
                    )
                }
            }

            ExprKind::Index { object, index } => {
                let object_info = self.resolve_expr(object);
                let index_info = self.resolve_expr(index);
                if !index_info.ty.is_int() {
                    self.diagnostics
                        .error("List index must have type int", index.token.span);
                }
                match &object_info.ty.kind {
                    TypeKind::List(element) => {
                        ExprTypeInfo::value(propagate_const(element, object_info.ty.is_const))
                    }
                    TypeKind::Error => ExprTypeInfo::error(),
                    _ => self.error("Can only index lists", token.span),
                }
            }

            ExprKind::ListAssign {
                object,
                index,
                value,
                conversion,
            } => {
                let object_info = self.resolve_expr(object);
                let index_info = self.resolve_expr(index);
                let value_info = self.resolve_expr(value);
                if !index_info.ty.is_int() {
                    self.diagnostics
                        .error("List index must have type int", index.token.span);
                }
                match &object_info.ty.kind {
                    TypeKind::List(element) => {
                        let element = Rc::clone(element);
                        if object_info.ty.is_const || element.is_const {
                            self.diagnostics
                                .error("Cannot assign through a 'const' list", token.span);
                        }
                        match value_info.ty.assignable_to(&element) {
                            Some(conv) => *conversion = conv,
                            None => self.diagnostics.error(
                                &format!(
                                    "Cannot assign value of type '{}' to list element of type '{}'",
                                    value_info.ty, element
                                ),
                                token.span,
                            ),
                        }
                        ExprTypeInfo::value(element)
                    }
                    TypeKind::Error => ExprTypeInfo::error(),
                    _ => self.error("Can only index lists", token.span),
                }
            }

            ExprKind::List { elements } => {
                let mut types = Vec::new();
                for (element, _) in elements.iter_mut() {
                    types.push(self.resolve_expr(element).ty);
                }
                // An empty list gets the error sentinel element type, which
                // binds to any declared list type
                let mut element_ty = ResolvedType::error().shared();
                if let Some(first) = types.first() {
                    element_ty = Rc::clone(first);
                    if types.iter().any(|t| t.is_float()) && types.iter().all(|t| t.is_numeric()) {
                        element_ty = ResolvedType::float().shared();
                    }
                    for (i, ty) in types.iter().enumerate() {
                        match ty.assignable_to(&element_ty) {
                            Some(conv) => elements[i].1 = conv,
                            None => {
                                let span = elements[i].0.token.span;
                                self.diagnostics
                                    .error("List elements must all have the same type", span);
                            }
                        }
                    }
                }
                ExprTypeInfo::value(ResolvedType::list(element_ty).shared())
            }

            ExprKind::Tuple { elements } => {
                let mut types = Vec::new();
                for (element, _) in elements.iter_mut() {
                    types.push(self.resolve_expr(element).ty);
                }
                ExprTypeInfo::value(ResolvedType::tuple(types).shared())
            }

            ExprKind::Get { object, name } => {
                let object_info = self.resolve_expr(object);
                let name = name.clone();
                match &object_info.ty.kind {
                    TypeKind::Class(class_name) => {
                        let class_name = class_name.clone();
                        self.resolve_class_access(&class_name, &name)
                    }
                    TypeKind::Tuple(elements) => {
                        let elements = elements.clone();
                        self.resolve_tuple_access(&elements, &name)
                    }
                    TypeKind::Error => ExprTypeInfo::error(),
                    _ => self.error(
                        "Can only access members of classes and tuples",
                        name.span,
                    ),
                }
            }

            ExprKind::Set {
                object,
                name,
                value,
                conversion,
            } => {
                let object_info = self.resolve_expr(object);
                let value_info = self.resolve_expr(value);
                let name = name.clone();
                match &object_info.ty.kind {
                    TypeKind::Class(class_name) => {
                        let class_name = class_name.clone();
                        match self.lookup_class_entry(&class_name, &name.lexeme) {
                            Some(ClassEntry::Member {
                                visibility,
                                is_const,
                                ty,
                            }) => {
                                self.check_visibility(
                                    visibility,
                                    &class_name,
                                    &name.lexeme,
                                    name.span,
                                );
                                if object_info.ty.is_const {
                                    self.diagnostics.error(
                                        "Cannot assign to a member of a 'const' value",
                                        token.span,
                                    );
                                }
                                if is_const || ty.is_const {
                                    self.diagnostics.error(
                                        &format!(
                                            "Cannot assign to constant member '{}'",
                                            name.lexeme
                                        ),
                                        name.span,
                                    );
                                }
                                match value_info.ty.assignable_to(&ty) {
                                    Some(conv) => *conversion = conv,
                                    None => self.diagnostics.error(
                                        &format!(
                                            "Cannot assign value of type '{}' to member of type '{}'",
                                            value_info.ty, ty
                                        ),
                                        token.span,
                                    ),
                                }
                                ExprTypeInfo::value(ty)
                            }
                            Some(ClassEntry::Method { .. }) => self.error(
                                &format!("Cannot assign to method '{}'", name.lexeme),
                                name.span,
                            ),
                            None => self.error(
                                &format!(
                                    "Class '{}' has no member named '{}'",
                                    class_name, name.lexeme
                                ),
                                name.span,
                            ),
                        }
                    }
                    TypeKind::Tuple(elements) => {
                        let elements = elements.clone();
                        if object_info.ty.is_const {
                            self.diagnostics.error(
                                "Cannot assign to a member of a 'const' value",
                                token.span,
                            );
                        }
                        let info = self.resolve_tuple_access(&elements, &name);
                        match value_info.ty.assignable_to(&info.ty) {
                            Some(conv) => *conversion = conv,
                            None => self.diagnostics.error(
                                &format!(
                                    "Cannot assign value of type '{}' to tuple element of type '{}'",
                                    value_info.ty, info.ty
                                ),
                                token.span,
                            ),
                        }
                        info
                    }
                    TypeKind::Error => ExprTypeInfo::error(),
                    _ => self.error(
                        "Can only access members of classes and tuples",
                        name.span,
                    ),
                }
            }

            ExprKind::ScopeName { name } => {
                let lexeme = name.lexeme.clone();
                if let Some(index) = self.registry.find_by_stem(&lexeme) {
                    ExprTypeInfo::module(index, ResolvedType::null().shared())
                } else if self.find_class(&lexeme).is_some() {
                    let ty = ResolvedType::class(lexeme.clone()).shared();
                    ExprTypeInfo::class(lexeme, ty)
                } else {
                    self.error(
                        &format!("Undefined module or class name '{}'", lexeme),
                        name.span,
                    )
                }
            }

            ExprKind::ScopeAccess { scope, name } => {
                let scope_info = self.resolve_expr(scope);
                let name = name.clone();
                match scope_info.target {
                    ResolvedTarget::Module(index) => {
                        let function = self
                            .registry
                            .module(index)
                            .functions
                            .get(&name.lexeme)
                            .cloned();
                        if let Some(sig) = function {
                            let ty = self.resolve_signature(&sig);
                            ExprTypeInfo::function(name.lexeme.clone(), ty)
                        } else if self
                            .registry
                            .module(index)
                            .classes
                            .contains_key(&name.lexeme)
                        {
                            let ty = ResolvedType::class(name.lexeme.clone()).shared();
                            ExprTypeInfo::class(name.lexeme.clone(), ty)
                        } else {
                            let module_name = self.registry.module(index).name.clone();
                            self.error(
                                &format!(
                                    "Module '{}' has no member named '{}'",
                                    module_name, name.lexeme
                                ),
                                name.span,
                            )
                        }
                    }
                    ResolvedTarget::Class(class_name) => {
                        match self.lookup_class_entry(&class_name, &name.lexeme) {
                            Some(ClassEntry::Method { visibility, ty }) => {
                                self.check_visibility(
                                    visibility,
                                    &class_name,
                                    &name.lexeme,
                                    name.span,
                                );
                                ExprTypeInfo {
                                    ty,
                                    target: ResolvedTarget::Method {
                                        class: class_name,
                                        name: name.lexeme.clone(),
                                    },
                                }
                            }
                            Some(ClassEntry::Member { .. }) => self.error(
                                &format!(
                                    "Cannot access instance member '{}' through class '{}'",
                                    name.lexeme, class_name
                                ),
                                name.span,
                            ),
                            None => self.error(
                                &format!(
                                    "Class '{}' has no method named '{}'",
                                    class_name, name.lexeme
                                ),
                                name.span,
                            ),
                        }
                    }
                    _ => self.error("Scope access requires a module or class name", token.span),
                }
            }

            ExprKind::Super { .. } => {
                let class_name = self.current_class.clone().unwrap_or_default();
                self.error(
                    &format!("Cannot use 'super': class '{}' has no base class", class_name),
                    token.span,
                )
            }

            ExprKind::This => match self.current_class.clone() {
                Some(class_name) if self.in_function => {
                    ExprTypeInfo::value(ResolvedType::class(class_name).shared())
                }
                _ => self.error("Cannot use 'this' outside a class method", token.span),
            },

            ExprKind::Comma { exprs } => {
                let mut last = ExprTypeInfo::error();
                for expr in exprs.iter_mut() {
                    last = self.resolve_expr(expr);
                }
                ExprTypeInfo::value(last.ty)
            }
        }
    }

    /// Member or method access on a class instance
    fn resolve_class_access(&mut self, class_name: &str, name: &Token) -> ExprTypeInfo {
        match self.lookup_class_entry(class_name, &name.lexeme) {
            Some(ClassEntry::Member { visibility, ty, .. }) => {
                self.check_visibility(visibility, class_name, &name.lexeme, name.span);
                ExprTypeInfo::value(ty)
            }
            Some(ClassEntry::Method { visibility, ty }) => {
                self.check_visibility(visibility, class_name, &name.lexeme, name.span);
                ExprTypeInfo {
                    ty,
                    target: ResolvedTarget::Method {
                        class: class_name.to_string(),
                        name: name.lexeme.clone(),
                    },
                }
            }
            None => self.error(
                &format!("Class '{}' has no member named '{}'", class_name, name.lexeme),
                name.span,
            ),
        }
    }

    /// Numeric-literal index into a tuple, with bounds checking
    fn resolve_tuple_access(
        &mut self,
        elements: &[QualifiedTypeInfo],
        name: &Token,
    ) -> ExprTypeInfo {
        if name.kind != TokenKind::IntValue {
            return self.error("Expected integer index for tuple access", name.span);
        }
        match name.lexeme.parse::<usize>() {
            Ok(index) if index < elements.len() => ExprTypeInfo::value(Rc::clone(&elements[index])),
            _ => self.error(
                &format!(
                    "Tuple index '{}' is out of bounds (tuple has {} elements)",
                    name.lexeme,
                    elements.len()
                ),
                name.span,
            ),
        }
    }

    fn resolve_binary(
        &mut self,
        operator: &Token,
        left: QualifiedTypeInfo,
        right: QualifiedTypeInfo,
        conversion: &mut NumericConversionType,
    ) -> ExprTypeInfo {
        match operator.kind {
            TokenKind::Plus if left.is_string() && right.is_string() => {
                ExprTypeInfo::value(ResolvedType::string().shared())
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent => {
                if !left.is_numeric() || !right.is_numeric() {
                    return self.error(
                        &format!("Operands of '{}' must be numeric", operator.lexeme),
                        operator.span,
                    );
                }
                if left.is_float() || right.is_float() {
                    if !left.is_float() || !right.is_float() {
                        *conversion = NumericConversionType::IntToFloat;
                    }
                    ExprTypeInfo::value(ResolvedType::float().shared())
                } else {
                    ExprTypeInfo::value(ResolvedType::int().shared())
                }
            }
            TokenKind::EqEq | TokenKind::BangEq => {
                let comparable = left.same_base(&right)
                    || (left.is_numeric() && right.is_numeric())
                    || (left.is_null() && (right.is_class() || right.is_ref))
                    || (right.is_null() && (left.is_class() || left.is_ref));
                if !comparable {
                    self.diagnostics.error(
                        &format!("Cannot compare values of types '{}' and '{}'", left, right),
                        operator.span,
                    );
                }
                ExprTypeInfo::value(ResolvedType::bool().shared())
            }
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
                let comparable = (left.is_numeric() && right.is_numeric())
                    || (left.is_string() && right.is_string());
                if !comparable {
                    self.diagnostics.error(
                        &format!(
                            "Operands of '{}' must both be numeric or both be strings",
                            operator.lexeme
                        ),
                        operator.span,
                    );
                }
                ExprTypeInfo::value(ResolvedType::bool().shared())
            }
            TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::LtLt
            | TokenKind::GtGt => {
                if !left.is_int() || !right.is_int() {
                    self.diagnostics.error(
                        &format!("Operands of '{}' must be integers", operator.lexeme),
                        operator.span,
                    );
                }
                ExprTypeInfo::value(ResolvedType::int().shared())
            }
            TokenKind::DotDot | TokenKind::DotDotEq => {
                if !left.is_int() || !right.is_int() {
                    self.diagnostics
                        .error("Range bounds must have type int", operator.span);
                }
                ExprTypeInfo::value(ResolvedType::range().shared())
            }
            _ => self.error("Invalid binary operator", operator.span),
        }
    }

    /// Compound assignment operators reuse the binary operand rules
    fn check_compound_operands(
        &mut self,
        operator: &Token,
        target: &ResolvedType,
        value: &ResolvedType,
    ) {
        let ok = match operator.kind {
            TokenKind::PlusEq => {
                (target.is_numeric() && value.is_numeric())
                    || (target.is_string() && value.is_string())
            }
            _ => target.is_numeric() && value.is_numeric(),
        };
        if !ok {
            self.diagnostics.error(
                &format!(
                    "Operands of '{}' must be numeric{}",
                    operator.lexeme,
                    if operator.kind == TokenKind::PlusEq {
                        " or strings"
                    } else {
                        ""
                    }
                ),
                operator.span,
            );
        }
    }

    fn check_args(
        &mut self,
        params: &[QualifiedTypeInfo],
        args: &mut [ConvertedExpr],
        span: SourceSpan,
    ) {
        if params.len() != args.len() {
            self.diagnostics.error(
                &format!("Expected {} arguments but got {}", params.len(), args.len()),
                span,
            );
            for (arg, _) in args.iter_mut() {
                self.resolve_expr(arg);
            }
            return;
        }
        for ((arg, conversion), param) in args.iter_mut().zip(params) {
            let info = self.resolve_expr(arg);
            match info.ty.assignable_to(param) {
                Some(conv) => *conversion = conv,
                None => self.diagnostics.error(
                    &format!(
                        "Argument of type '{}' does not match parameter type '{}'",
                        info.ty, param
                    ),
                    arg.token.span,
                ),
            }
        }
    }

    // ==================== Statements ====================

    pub fn resolve_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.begin_scope();
                for stmt in &mut block.stmts {
                    self.resolve_stmt(stmt);
                }
                self.end_scope();
            }

            Stmt::Break { keyword } => {
                if !(self.in_loop || self.in_switch) {
                    let span = keyword.span;
                    self.diagnostics
                        .error("Cannot use 'break' outside a loop or switch", span);
                }
            }

            Stmt::Continue { keyword } => {
                if !self.in_loop {
                    let span = keyword.span;
                    self.diagnostics
                        .error("Cannot use 'continue' outside a loop", span);
                }
            }

            Stmt::Expression { expr } => {
                self.resolve_expr(expr);
            }

            Stmt::Function(function) => self.resolve_function(function),

            Stmt::Class(class) => self.resolve_class(class),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let info = self.resolve_expr(condition);
                if !info.ty.is_bool() {
                    self.diagnostics
                        .error("If condition must have type bool", condition.token.span);
                }
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            // The import already materialized an independently resolved
            // module in the registry
            Stmt::Import { .. } => {}

            Stmt::Return { keyword, value } => self.resolve_return(keyword, value),

            Stmt::Switch(switch) => {
                let scrutinee = self.resolve_expr(&mut switch.condition).ty;
                self.begin_scope();
                self.with_flag(
                    |r| &mut r.in_switch,
                    |resolver| {
                        for (case_expr, case_stmt) in &mut switch.cases {
                            let info = resolver.resolve_expr(case_expr);
                            if info.ty.assignable_to(&scrutinee).is_none() {
                                resolver.diagnostics.error(
                                    &format!(
                                        "Case expression of type '{}' is not comparable to switch value of type '{}'",
                                        info.ty, scrutinee
                                    ),
                                    case_expr.token.span,
                                );
                            }
                            resolver.resolve_stmt(case_stmt);
                        }
                        if let Some(default_case) = &mut switch.default_case {
                            resolver.resolve_stmt(default_case);
                        }
                    },
                );
                self.end_scope();
            }

            Stmt::Type(alias) => {
                self.resolve_type(&mut alias.aliased);
                self.module
                    .type_aliases
                    .insert(alias.name.lexeme.clone(), alias.aliased.clone());
            }

            Stmt::Var(var) => self.resolve_var(var),

            Stmt::While(while_stmt) => {
                if let Some(condition) = &mut while_stmt.condition {
                    let info = self.resolve_expr(condition);
                    if !info.ty.is_bool() {
                        self.diagnostics
                            .error("Loop condition must have type bool", condition.token.span);
                    }
                }
                self.with_flag(
                    |r| &mut r.in_loop,
                    |resolver| {
                        resolver.resolve_stmt(&mut while_stmt.body);
                        if let Some(increment) = &mut while_stmt.increment {
                            resolver.resolve_stmt(increment);
                        }
                    },
                );
            }
        }
    }

    fn resolve_var(&mut self, var: &mut VarStmt) {
        let init_info = var.initializer.as_mut().map(|e| self.resolve_expr(e));
        let declared = var.declared_type.as_mut().map(|t| self.resolve_type(t));

        let ty = match (declared, &init_info) {
            (Some(declared), Some(init)) => {
                match init.ty.assignable_to(&declared) {
                    Some(conv) => var.conversion = conv,
                    None => self.diagnostics.error(
                        &format!(
                            "Cannot initialize variable of type '{}' with value of type '{}'",
                            declared, init.ty
                        ),
                        var.name.span,
                    ),
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init)) => Rc::clone(&init.ty),
            (None, None) => {
                self.diagnostics.error(
                    "Variable declaration needs a type or an initializer",
                    var.name.span,
                );
                ResolvedType::error().shared()
            }
        };

        let ty = if var.keyword.kind == TokenKind::Ref && !ty.is_ref {
            ResolvedType {
                kind: ty.kind.clone(),
                is_const: ty.is_const,
                is_ref: true,
            }
            .shared()
        } else {
            ty
        };

        let mutable = var.keyword.kind != TokenKind::Const && !ty.is_const;
        self.values.push(Value {
            lexeme: var.name.lexeme.clone(),
            ty,
            scope_depth: self.scope_depth,
            mutable,
        });
    }

    fn resolve_return(&mut self, keyword: &Token, value: &mut Option<Expr>) {
        if !self.in_function {
            self.diagnostics
                .error("Cannot use 'return' outside a function", keyword.span);
            return;
        }
        match value {
            Some(value_expr) => {
                let info = self.resolve_expr(value_expr);
                if self.in_ctor {
                    self.diagnostics
                        .error("Cannot return a value from a constructor", keyword.span);
                } else if self.in_dtor {
                    self.diagnostics
                        .error("Cannot return a value from a destructor", keyword.span);
                } else if let Some(expected) = self.current_return_type.clone() {
                    if info.ty.assignable_to(&expected).is_none() {
                        self.diagnostics.error(
                            &format!(
                                "Cannot return value of type '{}' from function returning '{}'",
                                info.ty, expected
                            ),
                            value_expr.token.span,
                        );
                    }
                }
            }
            None => {
                if let Some(expected) = self.current_return_type.clone() {
                    if !expected.is_null() && !expected.is_error() && !self.in_ctor && !self.in_dtor
                    {
                        self.diagnostics.error(
                            &format!("This function must return a value of type '{}'", expected),
                            keyword.span,
                        );
                    }
                }
            }
        }
    }

    fn resolve_function(&mut self, function: &mut FunctionStmt) {
        let ret = self.resolve_type(&mut function.return_type);
        let saved_return = self.current_return_type.replace(Rc::clone(&ret));

        self.begin_scope();
        for (name, ty) in &mut function.params {
            let param_ty = self.resolve_type(ty);
            let mutable = !param_ty.is_const;
            self.values.push(Value {
                lexeme: name.lexeme.clone(),
                ty: param_ty,
                scope_depth: self.scope_depth,
                mutable,
            });
        }

        self.with_flag(
            |r| &mut r.in_function,
            |resolver| {
                for stmt in &mut function.body.stmts {
                    resolver.resolve_stmt(stmt);
                }
            },
        );
        self.end_scope();

        self.current_return_type = saved_return;

        if !ret.is_null() && !ret.is_error() && !block_always_returns(&function.body) {
            self.diagnostics.error(
                &format!(
                    "Function '{}' does not return a value on all paths",
                    function.name.lexeme
                ),
                function.name.span,
            );
        }
    }

    fn resolve_class(&mut self, class: &mut ClassStmt) {
        let class_name = class.name.lexeme.clone();
        let saved_class = self.current_class.replace(class_name.clone());

        self.with_flag(
            |r| &mut r.in_class,
            |resolver| {
                resolver.begin_scope();

                // Members resolve before methods so method bodies can
                // reference member types (and members by name)
                let mut member_types = Vec::new();
                for (member, _) in &mut class.members {
                    resolver.resolve_var(member);
                    let ty = resolver
                        .values
                        .last()
                        .map(|v| Rc::clone(&v.ty))
                        .unwrap_or_else(|| ResolvedType::error().shared());
                    member_types.push(ty);
                }
                if let Some(info) = resolver.class_info.get_mut(&class_name) {
                    for (slot, ty) in info.members.iter_mut().zip(member_types) {
                        slot.ty = ty;
                    }
                }

                for (index, (method, _)) in class.methods.iter_mut().enumerate() {
                    let is_ctor = class.ctor == Some(index);
                    let is_dtor = class.dtor == Some(index);

                    if is_dtor {
                        if !method.params.is_empty() {
                            resolver.diagnostics.error(
                                "Destructor cannot have parameters",
                                method.name.span,
                            );
                        }
                        if !matches!(
                            method.return_type.kind,
                            TypeExprKind::Primitive(PrimitiveKind::Null)
                        ) {
                            resolver
                                .diagnostics
                                .error("Destructor must return null", method.name.span);
                        }
                    }

                    let saved_ctor = std::mem::replace(&mut resolver.in_ctor, is_ctor);
                    let saved_dtor = std::mem::replace(&mut resolver.in_dtor, is_dtor);
                    resolver.resolve_function(method);
                    resolver.in_ctor = saved_ctor;
                    resolver.in_dtor = saved_dtor;
                }

                resolver.end_scope();
            },
        );

        self.current_class = saved_class;
    }
}

/// Element access through a `const` list yields `const` elements
fn propagate_const(element: &QualifiedTypeInfo, object_const: bool) -> QualifiedTypeInfo {
    if object_const && !element.is_const {
        ResolvedType {
            kind: element.kind.clone(),
            is_const: true,
            is_ref: element.is_ref,
        }
        .shared()
    } else {
        Rc::clone(element)
    }
}

/// Whether every control path through the block ends in a return
fn block_always_returns(block: &BlockStmt) -> bool {
    block.stmts.iter().any(stmt_always_returns)
}

fn stmt_always_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::Block(block) => block_always_returns(block),
        Stmt::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => stmt_always_returns(then_branch) && stmt_always_returns(else_branch),
        Stmt::Switch(switch) => {
            switch
                .default_case
                .as_ref()
                .is_some_and(|d| stmt_always_returns(d))
                && switch.cases.iter().all(|(_, s)| stmt_always_returns(s))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::parser::ast::{ExprKind, Stmt};
    use std::path::PathBuf;

    fn resolve_with_diagnostics(source: &str) -> (Module, Diagnostics) {
        let mut diagnostics = Diagnostics::buffered();
        diagnostics.set_source(source);
        diagnostics.set_module_name("test.eis");
        let mut registry = ModuleRegistry::new();
        let tokens = Scanner::new(source, &mut diagnostics).scan();
        let mut module = Parser::new(
            tokens,
            Module::new("test.eis", PathBuf::new()),
            0,
            &mut registry,
            &mut diagnostics,
        )
        .parse();
        TypeResolver::new(&mut module, &registry, &mut diagnostics).check();
        (module, diagnostics)
    }

    fn resolve_ok(source: &str) -> Module {
        let (module, mut diagnostics) = resolve_with_diagnostics(source);
        let output = diagnostics.take_output();
        assert!(!diagnostics.had_error(), "unexpected errors:\n{}", output);
        module
    }

    fn expect_error(source: &str, message: &str) {
        let (_, mut diagnostics) = resolve_with_diagnostics(source);
        assert!(diagnostics.had_error(), "expected an error for {:?}", source);
        let output = diagnostics.take_output();
        assert!(
            output.contains(message),
            "missing {:?} in:\n{}",
            message,
            output
        );
    }

    fn initializer_type(module: &Module, index: usize) -> QualifiedTypeInfo {
        let Stmt::Var(var) = &module.statements[index] else {
            panic!("expected var statement");
        };
        let resolved = var
            .initializer
            .as_ref()
            .and_then(|e| e.resolved.as_ref())
            .expect("initializer should be resolved");
        Rc::clone(&resolved.ty)
    }

    #[test]
    fn test_arithmetic_resolves_to_int() {
        let module = resolve_ok("var x = 1 + 2 * 3;");
        assert_eq!(initializer_type(&module, 0).kind, TypeKind::Int);
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        let module = resolve_ok("var x = 1 + 2.5;");
        assert_eq!(initializer_type(&module, 0).kind, TypeKind::Float);
        let Stmt::Var(var) = &module.statements[0] else {
            panic!();
        };
        let Some(Expr {
            kind: ExprKind::Binary { conversion, .. },
            ..
        }) = &var.initializer
        else {
            panic!("expected binary initializer");
        };
        assert_eq!(*conversion, NumericConversionType::IntToFloat);
    }

    #[test]
    fn test_int_widens_into_declared_float() {
        let module = resolve_ok("var x: float = 1;");
        let Stmt::Var(var) = &module.statements[0] else {
            panic!();
        };
        assert_eq!(var.conversion, NumericConversionType::IntToFloat);
    }

    #[test]
    fn test_float_does_not_narrow_into_int() {
        expect_error(
            "var x: int = 1.5;",
            "Cannot initialize variable of type 'int' with value of type 'float'",
        );
    }

    #[test]
    fn test_return_type_mismatch() {
        expect_error(
            "fn f(a: int) -> int { return a + 1.5; }",
            "Cannot return value of type 'float' from function returning 'int'",
        );
    }

    #[test]
    fn test_undefined_name() {
        expect_error("var x = missing;", "Undefined name 'missing'");
    }

    #[test]
    fn test_const_is_not_assignable() {
        expect_error(
            "const x = 1\nfn f() -> null { x = 2; }",
            "Cannot assign to constant 'x'",
        );
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        resolve_ok("var x = 1\nfn f() -> null { var x = \"s\"\n var y: string = x\n }");
    }

    #[test]
    fn test_logical_operands_must_be_bool() {
        expect_error("var x = 1 and true;", "Operands of 'and' must be booleans");
    }

    #[test]
    fn test_bitwise_requires_integers() {
        expect_error("var x = 1.5 & 2;", "Operands of '&' must be integers");
    }

    #[test]
    fn test_range_over_ints() {
        let module = resolve_ok("var r = 1..10;");
        assert_eq!(initializer_type(&module, 0).kind, TypeKind::Range);
        expect_error("var r = 1.5..2;", "Range bounds must have type int");
    }

    #[test]
    fn test_ternary_arms_must_unify() {
        resolve_ok("var c = true\nvar x = c ? 1 : 2\n");
        expect_error(
            "var c = true\nvar x = c ? 1 : \"two\"\n",
            "Branches of ternary expression have incompatible types",
        );
    }

    #[test]
    fn test_if_condition_must_be_bool() {
        expect_error(
            "fn f() -> null { if 1 { } }",
            "If condition must have type bool",
        );
    }

    #[test]
    fn test_index_requires_list_and_int() {
        resolve_ok("var xs = [1, 2, 3]\nvar x: int = xs[0]\n");
        expect_error("var x = 1\nvar y = x[0]\n", "Can only index lists");
        expect_error(
            "var xs = [1]\nvar y = xs[\"zero\"]\n",
            "List index must have type int",
        );
    }

    #[test]
    fn test_list_elements_unify_with_promotion() {
        let module = resolve_ok("var xs = [1, 2.5];");
        let ty = initializer_type(&module, 0);
        let TypeKind::List(element) = &ty.kind else {
            panic!("expected list type");
        };
        assert_eq!(element.kind, TypeKind::Float);
        expect_error(
            "var xs = [1, \"two\"];",
            "List elements must all have the same type",
        );
    }

    #[test]
    fn test_empty_list_binds_to_declared_type() {
        resolve_ok("var xs: [int] = [];");
    }

    #[test]
    fn test_tuple_access_by_index() {
        let module = resolve_ok("var t = {1, \"two\"};\nvar a: int = t.0\nvar b: string = t.1\n");
        assert_eq!(initializer_type(&module, 1).kind, TypeKind::Int);
        expect_error(
            "var t = {1};\nvar x = t.3\n",
            "Tuple index '3' is out of bounds",
        );
    }

    #[test]
    fn test_call_checks_arity_and_argument_types() {
        resolve_ok("fn add(a: int, b: int) -> int { return a + b; }\nvar s = add(1, 2)\n");
        expect_error(
            "fn add(a: int, b: int) -> int { return a + b; }\nvar s = add(1)\n",
            "Expected 2 arguments but got 1",
        );
        expect_error(
            "fn add(a: int, b: int) -> int { return a + b; }\nvar s = add(1, \"two\")\n",
            "Argument of type 'string' does not match parameter type 'int'",
        );
    }

    #[test]
    fn test_call_records_numeric_promotion_on_argument() {
        let module = resolve_ok("fn half(x: float) -> float { return x / 2.0; }\nvar h = half(3)\n");
        let Stmt::Var(var) = &module.statements[1] else {
            panic!();
        };
        let Some(Expr {
            kind: ExprKind::Call { args, .. },
            ..
        }) = &var.initializer
        else {
            panic!("expected call initializer");
        };
        assert_eq!(args[0].1, NumericConversionType::IntToFloat);
    }

    #[test]
    fn test_calling_a_non_function() {
        expect_error(
            "var x = 1\nvar y = x(2)\n",
            "Can only call functions, methods and class constructors",
        );
    }

    #[test]
    fn test_function_must_return_on_all_paths() {
        expect_error(
            "fn f(c: bool) -> int { if c { return 1\n } }",
            "does not return a value on all paths",
        );
        resolve_ok("fn f(c: bool) -> int { if c { return 1\n } else { return 2\n } }");
    }

    #[test]
    fn test_class_members_and_methods() {
        resolve_ok(
            "class Counter {\n\
             public var n: int = 0\n\
             public fn add(k: int) -> int { return k + this.n; }\n\
             }\n\
             var c = Counter()\n\
             var r: int = c.add(2)\n",
        );
    }

    #[test]
    fn test_private_member_is_hidden_outside() {
        expect_error(
            "class Foo {\n\
             private var x: int = 0\n\
             }\n\
             var f = Foo()\n\
             var y = f.x\n",
            "Cannot access private member 'x' of class 'Foo'",
        );
    }

    #[test]
    fn test_private_member_is_visible_inside() {
        resolve_ok(
            "class Foo {\n\
             private var x: int = 0\n\
             public fn get() -> int { return this.x; }\n\
             }\n",
        );
    }

    #[test]
    fn test_unknown_member() {
        expect_error(
            "class Foo {\n\
             public var x: int = 0\n\
             }\n\
             var f = Foo()\n\
             var y = f.missing\n",
            "Class 'Foo' has no member named 'missing'",
        );
    }

    #[test]
    fn test_constructor_call_checks_arguments() {
        resolve_ok(
            "class Point {\n\
             public var x: int = 0\n\
             public fn Point(x: int) -> null { this.x = x\n }\n\
             }\n\
             var p = Point(3)\n",
        );
        expect_error(
            "class Point {\n\
             public fn Point(x: int) -> null { }\n\
             }\n\
             var p = Point()\n",
            "Expected 1 arguments but got 0",
        );
    }

    #[test]
    fn test_destructor_discipline() {
        expect_error(
            "class Foo {\n\
             public fn ~Foo(x: int) -> null { }\n\
             }\n",
            "Destructor cannot have parameters",
        );
        expect_error(
            "class Foo {\n\
             public fn ~Foo() -> int { return 1\n }\n\
             }\n",
            "Destructor must return null",
        );
    }

    #[test]
    fn test_constructor_cannot_return_a_value() {
        expect_error(
            "class Foo {\n\
             public fn Foo() -> null { return 1\n }\n\
             }\n",
            "Cannot return a value from a constructor",
        );
    }

    #[test]
    fn test_super_is_rejected() {
        expect_error(
            "class Foo {\n\
             public fn f() -> null { super.g()\n }\n\
             }\n",
            "has no base class",
        );
    }

    #[test]
    fn test_type_alias_expands() {
        resolve_ok("type Id = int\nvar x: Id = 5\n");
        expect_error("type Id = int\nvar x: Id = \"five\"\n", "Cannot initialize");
    }

    #[test]
    fn test_typeof_type() {
        resolve_ok("var x = 1\nvar y: typeof x = 2\n");
    }

    #[test]
    fn test_undefined_type() {
        expect_error("var x: Missing = 1;", "Undefined type 'Missing'");
    }

    #[test]
    fn test_var_needs_type_or_initializer() {
        expect_error(
            "var x;",
            "Variable declaration needs a type or an initializer",
        );
    }

    #[test]
    fn test_switch_case_types_match_scrutinee() {
        resolve_ok("var x = 1\nswitch x { 1 -> x = 2; default -> x = 3; }");
        expect_error(
            "var x = 1\nswitch x { \"one\" -> x = 2; }",
            "Case expression of type 'string' is not comparable to switch value of type 'int'",
        );
    }

    #[test]
    fn test_null_binds_to_class_variables() {
        resolve_ok(
            "class Foo {\n\
             public var x: int = 0\n\
             }\n\
             var f: Foo = null\n",
        );
    }

    #[test]
    fn test_every_resolved_expression_is_annotated() {
        let module = resolve_ok("var x = (1 + 2) * 3\nvar y = x < 9 ? x : 0\n");
        for stmt in &module.statements {
            let Stmt::Var(var) = stmt else { continue };
            fn walk(expr: &Expr) {
                assert!(expr.resolved.is_some(), "missing annotation");
                match &expr.kind {
                    ExprKind::Binary { left, right, .. } => {
                        walk(left);
                        walk(right);
                    }
                    ExprKind::Ternary {
                        condition,
                        then_expr,
                        else_expr,
                    } => {
                        walk(condition);
                        walk(then_expr);
                        walk(else_expr);
                    }
                    ExprKind::Grouping { expr } => walk(expr),
                    _ => {}
                }
            }
            walk(var.initializer.as_ref().unwrap());
        }
    }

    #[test]
    fn test_increment_requires_mutable_numeric_place() {
        resolve_ok("fn f() -> null { var x = 1\n ++x\n }");
        expect_error(
            "fn f() -> null { const x = 1\n ++x\n }",
            "Operand of '++' must be a mutable numeric value",
        );
        expect_error(
            "fn f() -> null { ++3\n }",
            "Operand of '++' must be a mutable numeric value",
        );
    }

    #[test]
    fn test_string_concatenation() {
        let module = resolve_ok("var s = \"a\" + \"b\";");
        assert_eq!(initializer_type(&module, 0).kind, TypeKind::String);
        expect_error("var s = \"a\" - \"b\";", "Operands of '-' must be numeric");
    }
}
