//! Semantic analysis
//!
//! A single depth-first traversal over the parsed forest performs scope
//! management, lvalue classification, struct-field resolution, ternary
//! pair matching, function signature checking and the typedef/struct/
//! forward-declaration interplay. All diagnostics are collected; one pass
//! always runs to completion.
//!
//! Several side tables keyed by node id carry state between visits:
//! the lvalue set, the ternary pair counters, and the struct-access
//! propagation table that hands a struct descriptor upward from a leaf
//! through `.`/`->`/subscripts/dereferences so the field name on the right
//! of an access knows which struct to query.

pub mod errors;
pub mod expressions;
pub mod scope;
pub mod statements;
pub mod types;

pub use errors::{AnalyzeError, SemanticErrorKind};
pub use types::Results;

use crate::ast::{Node, NodeId, NodeKind, SharedNodeTags};
use crate::semantic::scope::ScopeStack;
use crate::types::{FunctionType, StructType, Type, TypeBase};
use rc0_common::SourceLocation;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub(crate) struct TernaryCheck {
    node: NodeId,
    seen: usize,
}

/// Analyzer state for checking a forest of ASTs
pub struct Analyzer {
    file: String,
    tags: SharedNodeTags,
    errors: Vec<AnalyzeError>,
    pub(crate) res: Results,

    // Traversal state
    pub(crate) scope: ScopeStack,
    pub(crate) curfunc: Option<(String, Rc<FunctionType>)>,
    pub(crate) loops: Vec<NodeId>,
    pub(crate) canassign: HashSet<NodeId>,
    pub(crate) ternaryvals: HashMap<NodeId, TernaryCheck>,
    pub(crate) structaccess: HashMap<NodeId, Rc<StructType>>,
    pub(crate) returns: HashMap<String, usize>,
}

impl Analyzer {
    pub fn new(file: &str, tags: SharedNodeTags) -> Self {
        Self {
            file: file.to_string(),
            tags,
            errors: Vec::new(),
            res: Results::default(),
            scope: ScopeStack::new(),
            curfunc: None,
            loops: Vec::new(),
            canassign: HashSet::new(),
            ternaryvals: HashMap::new(),
            structaccess: HashMap::new(),
            returns: HashMap::new(),
        }
    }

    /// Check the given forest; returns the collected diagnostics. The type
    /// tables survive in `results()`.
    pub fn analyze(&mut self, nodes: &[Node]) -> &[AnalyzeError] {
        for node in nodes {
            self.check(node);
            self.check_ternaries();
        }
        &self.errors
    }

    pub fn errors(&self) -> &[AnalyzeError] {
        &self.errors
    }

    pub fn results(&self) -> &Results {
        &self.res
    }

    pub(crate) fn location_of(&self, id: NodeId) -> SourceLocation {
        self.tags
            .borrow()
            .token(id)
            .map(|t| t.span.start)
            .unwrap_or_else(SourceLocation::dummy)
    }

    pub(crate) fn error(&mut self, id: NodeId, kind: SemanticErrorKind, detail: &str) {
        let location = self.location_of(id);
        self.errors
            .push(AnalyzeError::new(kind, &self.file, location, detail));
    }

    pub(crate) fn set_type(&mut self, id: NodeId, t: Type) {
        if self.res.node_types.insert(id, t).is_some() {
            panic!("node type defined twice for {}", id);
        }
    }

    pub(crate) fn get_type(&self, id: NodeId) -> Option<Type> {
        self.res.node_types.get(&id).cloned()
    }

    pub(crate) fn set_assignable(&mut self, id: NodeId) {
        if !self.canassign.insert(id) {
            panic!("node {} classified as lvalue twice", id);
        }
    }

    pub(crate) fn is_assignable(&self, id: NodeId) -> bool {
        self.canassign.contains(&id)
    }

    pub(crate) fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    fn check_atom(&mut self, id: NodeId, base: TypeBase) {
        self.set_type(id, Type::new(base, 0, 0));
    }

    pub(crate) fn check(&mut self, n: &Node) {
        match &n.kind {
            NodeKind::Variable(name) => self.check_variable(n.id, name),
            NodeKind::Bool(_) => self.check_atom(n.id, TypeBase::Bool),
            NodeKind::StrLit(_) => self.check_atom(n.id, TypeBase::String),
            NodeKind::ChrLit(_) => self.check_atom(n.id, TypeBase::Char),
            NodeKind::Numeric { .. } => self.check_atom(n.id, TypeBase::Int),
            NodeKind::Null => self.check_atom(n.id, TypeBase::Null),
            NodeKind::LibLit(lit) => panic!("unexpected liblit: {}", lit),
            NodeKind::Struct { name, members } => self.add_struct(n.id, name, members),
            NodeKind::StructForwardDecl(name) => {
                self.res.struct_fwds.insert(name.clone());
            }
            NodeKind::Typedef { name, kind } => self.add_typedef(n.id, name, kind),
            NodeKind::TypedefFunc {
                name,
                returns,
                params,
            } => self.add_typedef_func(n.id, name, returns, params),
            NodeKind::OpUnary { op, operand } => {
                self.check(operand);
                self.check_unary(n.id, *op, operand);
            }
            NodeKind::OpBinary { op, left, right } => {
                self.check(left);
                match op {
                    crate::ast::BinOp::StructDec | crate::ast::BinOp::StructPtrDec => {
                        self.check_struct_field_access(n.id, *op, left, right);
                    }
                    _ => {
                        self.check(right);
                        self.check_binary(n.id, *op, left, right);
                    }
                }
            }
            NodeKind::OpAssign { target, value, .. } => {
                // The value is checked before the target, so an
                // initializer may not refer to the variable it defines.
                if let Some(value) = value {
                    self.check(value);
                }
                self.check(target);
                self.check_assign(n.id, target, value.as_deref());
            }
            NodeKind::VarDecl(vd) => self.check_var_decl(vd),
            NodeKind::Args(args) => {
                for arg in args {
                    self.check(arg);
                }
            }
            NodeKind::FunDecl(fd) => {
                self.scope.push();
                for param in &fd.params {
                    self.check_var_decl(param);
                }
                self.check_fun_decl(fd);
                self.scope.pop();
            }
            NodeKind::FunDef { decl, body } => {
                self.scope.push();
                for param in &decl.params {
                    self.check_var_decl(param);
                }
                // The declaration is registered first so the body may
                // recurse and may not shadow the function name.
                self.check_fun_decl(decl);
                match self.res.functions.get(&decl.name).cloned() {
                    None => {
                        self.error(
                            n.id,
                            SemanticErrorKind::FuncDeclInvalid,
                            &format!("{:?}", decl.name),
                        );
                    }
                    Some(f) => {
                        self.curfunc = Some((decl.name.clone(), f));
                        self.check(body);
                        let (name, f) = self.curfunc.take().expect("current function vanished");
                        let seen = self.returns.get(&name).copied().unwrap_or(0);
                        if !f.returns.matches(&Type::void()) && seen == 0 {
                            self.error(n.id, SemanticErrorKind::ReturnMissing, "");
                        }
                    }
                }
                self.scope.pop();
            }
            NodeKind::Block(stmts) => {
                self.scope.push();
                for stmt in stmts {
                    self.check(stmt);
                }
                self.scope.pop();
            }
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.check(cond);
                self.check(then);
                if let Some(otherwise) = otherwise {
                    self.check(otherwise);
                }
                self.check_cond(cond, "if");
            }
            NodeKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.loops.push(n.id);
                self.check(init);
                self.check(cond);
                self.check(step);
                self.check(body);
                self.check_cond(cond, "for");
                self.loops.pop();
            }
            NodeKind::While { cond, body } => {
                self.loops.push(n.id);
                self.check(cond);
                self.check(body);
                self.check_cond(cond, "while");
                self.loops.pop();
            }
            NodeKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.check(expr);
                }
                self.check_return(n.id, expr.as_deref());
            }
            NodeKind::Assert(expr) => {
                self.check(expr);
                self.check_cond(expr, "assert");
            }
            NodeKind::Error(expr) => {
                self.check(expr);
                self.check_error(n.id, expr);
            }
            NodeKind::Cast { to, what } => {
                self.check(what);
                self.check_cast(n.id, to, what);
            }
            NodeKind::AllocArray { kind, count } => {
                self.check(count);
                self.check_alloc_array(n.id, kind, count);
            }
            NodeKind::Alloc { kind } => self.check_alloc(n.id, kind),
            NodeKind::Break => {
                if !self.in_loop() {
                    self.error(n.id, SemanticErrorKind::BreakOutsideLoop, "");
                }
            }
            NodeKind::Continue => {
                if !self.in_loop() {
                    self.error(n.id, SemanticErrorKind::ContinueOutsideLoop, "");
                }
            }
            NodeKind::DirectiveUse { .. } => {}
        }
    }

    /// Every valid `?`/`:` pair ends with a count of exactly two: one from
    /// marking the `:` node, one from its parent `?`. Anything else means
    /// an unpaired half. The table drains here so a broken pair is
    /// reported once.
    fn check_ternaries(&mut self) {
        let leftover: Vec<_> = self
            .ternaryvals
            .drain()
            .filter(|(_, tc)| tc.seen != 2)
            .map(|(_, tc)| tc.node)
            .collect();
        for node in leftover {
            self.error(node, SemanticErrorKind::TernaryMissingCond, "");
        }
    }

    pub(crate) fn mark_ternary_val(&mut self, id: NodeId) {
        self.ternaryvals
            .insert(id, TernaryCheck { node: id, seen: 1 });
    }

    pub(crate) fn bump_ternary_val(&mut self, id: NodeId) -> bool {
        match self.ternaryvals.get_mut(&id) {
            Some(tc) => {
                tc.seen += 1;
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_name_shadowed(&mut self, id: NodeId, name: &str) -> bool {
        if self.res.functions.contains_key(name) {
            self.error(
                id,
                SemanticErrorKind::VarDeclShadowsFunction,
                &format!("{:?}", name),
            );
            return true;
        }
        if self.res.typedefs.contains_key(name) || self.res.typedef_funcs.contains_key(name) {
            self.error(
                id,
                SemanticErrorKind::VarDeclShadowsTypedef,
                &format!("{:?}", name),
            );
            return true;
        }
        false
    }

    pub(crate) fn check_var_decl(&mut self, vd: &crate::ast::VarDecl) {
        if self.is_name_shadowed(vd.id, &vd.name) {
            return;
        }
        let Some(t) = self.kind_to_type(&vd.kind) else {
            return;
        };
        if self.scope.insert(&vd.name, t.clone()).is_err() {
            self.error(
                vd.id,
                SemanticErrorKind::VariableAlreadyDefined,
                &format!("{:?}", vd.name),
            );
            return;
        }
        if t.base == TypeBase::Void && t.pointer_level == 0 {
            self.error(vd.id, SemanticErrorKind::VarDeclVoid, "");
            return;
        }
        // With only a forward declaration the struct's size is unknown,
        // so only pointers to it may be declared.
        if t.base == TypeBase::StructFwd && t.pointer_level == 0 {
            self.error(
                vd.id,
                SemanticErrorKind::StructOnlyForward,
                &format!("{:?}", vd.name),
            );
            return;
        }
        self.set_type(vd.id, t);
        self.set_assignable(vd.id);
    }

    pub(crate) fn check_fun_decl(&mut self, fd: &crate::ast::FunDecl) {
        // A function may be re-declared with a matching signature, so only
        // typedef collisions are rejected here; set_function below handles
        // mismatched redefinitions.
        if self.res.typedefs.contains_key(&fd.name) || self.res.typedef_funcs.contains_key(&fd.name)
        {
            self.error(
                fd.id,
                SemanticErrorKind::VarDeclShadowsTypedef,
                &format!("{:?}", fd.name),
            );
            return;
        }
        for param in &fd.params {
            let Some(pt) = self.kind_to_type(&param.kind) else {
                return;
            };
            if pt.array_level < 1
                && matches!(pt.base, TypeBase::Struct | TypeBase::StructFwd)
                && pt.pointer_level == 0
            {
                self.error(param.id, SemanticErrorKind::FuncParamStruct, "");
            }
        }
        self.set_function(fd);
    }

    fn set_function(&mut self, fd: &crate::ast::FunDecl) {
        let Some(f) = self.function_from_decl(fd) else {
            return;
        };
        if let Some(existing) = self.res.functions.get(&fd.name) {
            if !existing.matches(&f) {
                self.error(
                    fd.id,
                    SemanticErrorKind::FuncDifferentType,
                    &format!("{:?}", fd.name),
                );
                return;
            }
        }
        self.res.functions.insert(fd.name.clone(), Rc::new(f));
    }

    pub(crate) fn check_cond(&mut self, cond: &Node, name: &str) {
        let Some(k) = self.get_type(cond.id) else {
            // The condition failed to type; that error has been reported.
            return;
        };
        if !k.matches(&Type::bool()) {
            self.error(
                cond.id,
                SemanticErrorKind::CondNotBool,
                &format!("for {}: got {}", name, k),
            );
        }
    }

    pub(crate) fn check_return(&mut self, id: NodeId, expr: Option<&Node>) {
        let Some((name, cf)) = self.curfunc.clone() else {
            return;
        };
        *self.returns.entry(name).or_insert(0) += 1;
        match expr {
            None => {
                if !cf.returns.matches(&Type::void()) {
                    self.error(id, SemanticErrorKind::ReturnExprMissing, "");
                }
            }
            Some(expr) => {
                let Some(rt) = self.get_type(expr.id) else {
                    return;
                };
                if !cf.returns.matches(&rt) {
                    self.error(
                        id,
                        SemanticErrorKind::ReturnMistyped,
                        &format!("wanted {}, got {}", cf.returns, rt),
                    );
                }
            }
        }
    }

    pub(crate) fn check_error(&mut self, id: NodeId, expr: &Node) {
        if let Some(t) = self.get_type(expr.id) {
            if !t.matches(&Type::string()) {
                self.error(id, SemanticErrorKind::ErrorNotString, &format!("got {}", t));
            }
        }
    }

    /// The struct-access side channel: a struct-typed node hands its
    /// descriptor upward so the field name on the right of an eventual
    /// `.`/`->` can be resolved.
    pub(crate) fn propagate_struct_access(&mut self, from: NodeId, to: NodeId) {
        if let Some(st) = self.structaccess.get(&from).cloned() {
            self.structaccess.insert(to, st);
        }
    }
}
