//! Expression checks
//!
//! The traversal in `mod.rs` visits operands first; the checks here then
//! read the operands' types from the node type table and decide the
//! present node's type.

use crate::ast::{BinOp, Kind, Node, NodeId, NodeKind, UnOp};
use crate::semantic::{Analyzer, SemanticErrorKind};
use crate::types::{Type, TypeBase};

impl Analyzer {
    /// Variable leaves: known function names type as `func`; anything
    /// else resolves through the scope chain. A struct-typed leaf starts
    /// the struct-access propagation described in the module docs.
    pub(crate) fn check_variable(&mut self, id: NodeId, name: &str) {
        if let Some(fd) = self.res.functions.get(name).cloned() {
            self.set_type(
                id,
                Type::with_extra(
                    TypeBase::Func,
                    0,
                    0,
                    crate::types::TypeExtra::Function(fd),
                ),
            );
            return;
        }
        let Some(t) = self.scope.lookup(name).cloned() else {
            self.error(
                id,
                SemanticErrorKind::VariableNotDefined,
                &format!("{:?}", name),
            );
            return;
        };
        if t.base == TypeBase::Struct {
            self.structaccess.insert(id, t.struct_extra().clone());
        }
        self.set_type(id, t);
        self.set_assignable(id);
    }

    pub(crate) fn check_unary(&mut self, id: NodeId, op: UnOp, operand: &Node) {
        let Some(kt) = self.get_type(operand.id) else {
            return;
        };
        match op {
            UnOp::Deref => {
                if kt.base == TypeBase::Null {
                    self.error(id, SemanticErrorKind::DerefNull, "");
                    return;
                }
                if kt.pointer_level < 1 {
                    self.error(
                        id,
                        SemanticErrorKind::DerefNonPointer,
                        &format!("{}", operand),
                    );
                    return;
                }
                let mut nt = kt;
                nt.dec_ptr();
                self.set_type(id, nt);
                // Pointer arithmetic does not exist, so a dereference of
                // an lvalue is itself an lvalue.
                if self.is_assignable(operand.id) {
                    self.set_assignable(id);
                }
                self.propagate_struct_access(operand.id, id);
            }
            UnOp::AddrOf => {
                if kt.base != TypeBase::Func {
                    self.error(
                        id,
                        SemanticErrorKind::AddrOfNonFunction,
                        &format!("{}", operand),
                    );
                }
                let mut nt = kt;
                nt.inc_ptr();
                self.set_type(id, nt);
            }
            UnOp::LogNot => {
                if !kt.matches(&Type::bool()) {
                    self.error(id, SemanticErrorKind::NegateNonBool, &format!("{}", operand));
                }
                self.set_type(id, kt);
            }
            _ => {
                // The rest are integer operations.
                if !kt.matches(&Type::int()) {
                    self.error(
                        id,
                        SemanticErrorKind::UnaryNonInteger,
                        &format!("{} {}", kt, operand),
                    );
                }
                self.set_type(id, kt);
            }
        }
    }

    pub(crate) fn check_binary(&mut self, id: NodeId, op: BinOp, left: &Node, right: &Node) {
        match op {
            BinOp::TernaryCond => self.check_ternary_cond(id, left, right),
            BinOp::TernaryVals => self.mark_ternary_val(id),
            BinOp::ArrSub => self.check_array_sub(id, left, right),
            BinOp::Eq | BinOp::Ne => self.check_eq(id, left, right),
            BinOp::FunCall => self.check_funcall(id, left, right),
            BinOp::Le | BinOp::Ge | BinOp::Lt | BinOp::Gt => self.check_comp(id, left, right),
            BinOp::BitAnd
            | BinOp::BitOr
            | BinOp::BitXor
            | BinOp::And
            | BinOp::Or
            | BinOp::ShiftR
            | BinOp::ShiftL
            | BinOp::Add
            | BinOp::Sub
            | BinOp::Mul
            | BinOp::Div
            | BinOp::Mod => self.check_arith(id, left, right),
            BinOp::StructDec | BinOp::StructPtrDec => {
                panic!("struct access must be dispatched separately")
            }
        }
    }

    fn check_arith(&mut self, id: NodeId, left: &Node, right: &Node) {
        let (Some(kl), Some(kr)) = (self.get_type(left.id), self.get_type(right.id)) else {
            return;
        };
        if !kl.matches(&kr) || !kr.matches(&Type::int()) {
            self.error(
                left.id,
                SemanticErrorKind::ArithNonInteger,
                &format!("{} vs. {}", kl, kr),
            );
            return;
        }
        self.set_type(id, kl);
    }

    /// Ordering comparison results in boolean; operands must be matching
    /// integers or characters.
    fn check_comp(&mut self, id: NodeId, left: &Node, right: &Node) {
        self.set_type(id, Type::bool());
        let (Some(kl), Some(kr)) = (self.get_type(left.id), self.get_type(right.id)) else {
            return;
        };
        if !kl.matches(&kr) || !(kl.matches(&Type::int()) || kl.matches(&Type::char())) {
            self.error(
                left.id,
                SemanticErrorKind::CompareNonInteger,
                &format!("{} vs. {}", kl, kr),
            );
        }
    }

    /// Equality is defined for integers, booleans, characters and arrays;
    /// pointer and whole-struct equality are rejected.
    fn check_eq(&mut self, id: NodeId, left: &Node, right: &Node) {
        self.set_type(id, Type::bool());
        let (Some(kl), Some(kr)) = (self.get_type(left.id), self.get_type(right.id)) else {
            return;
        };
        let valid = |k: &Type| {
            k.matches(&Type::int())
                || k.matches(&Type::bool())
                || k.matches(&Type::char())
                || k.array_level > 0
        };
        if !valid(&kl) || !valid(&kr) {
            self.error(
                id,
                SemanticErrorKind::CompareBadType,
                &format!("got {} and {}", kl, kr),
            );
        }
        if !kl.matches(&kr) {
            self.error(
                id,
                SemanticErrorKind::CompareTypesMismatch,
                &format!("{} vs. {}", kl, kr),
            );
        }
    }

    /// The left side must be a subscriptable array and the index an
    /// integer; the result drops one array level and is assignable.
    fn check_array_sub(&mut self, id: NodeId, left: &Node, right: &Node) {
        let Some(tl) = self.get_type(left.id) else {
            self.error(id, SemanticErrorKind::ArraySubBadExpr, "array");
            return;
        };
        if tl.array_level < 1 || tl.pointer_level != 0 {
            self.error(
                left.id,
                SemanticErrorKind::ArraySubNotArray,
                &format!("got {}", tl),
            );
            if tl.array_level == 0 {
                return;
            }
        }
        let Some(tr) = self.get_type(right.id) else {
            self.error(id, SemanticErrorKind::ArraySubBadExpr, "subscript");
            return;
        };
        if !tr.matches(&Type::int()) {
            self.error(
                right.id,
                SemanticErrorKind::ArraySubNotInt,
                &format!("got {}", tr),
            );
        }
        let mut nt = tl;
        nt.dec_array();
        self.set_type(id, nt);
        if self.is_assignable(left.id) {
            self.set_assignable(id);
        }
        self.propagate_struct_access(left.id, id);
    }

    /// Calls resolve either through a named function or through any
    /// expression typing to a function pointer; arity and element-wise
    /// parameter types must match.
    fn check_funcall(&mut self, id: NodeId, left: &Node, right: &Node) {
        let fd = match &left.kind {
            NodeKind::Variable(name) => match self.res.functions.get(name).cloned() {
                Some(fd) => fd,
                None => {
                    self.error(
                        id,
                        SemanticErrorKind::FuncallNotFound,
                        &format!("{:?}", name),
                    );
                    return;
                }
            },
            _ => {
                let Some(ct) = self.get_type(left.id) else {
                    return;
                };
                if ct.base != TypeBase::Func {
                    self.error(
                        left.id,
                        SemanticErrorKind::FuncallWrongPtrType,
                        &format!("got {}", ct),
                    );
                    return;
                }
                ct.func_extra().clone()
            }
        };
        let NodeKind::Args(got) = &right.kind else {
            panic!("invalid function call arguments: {}", right);
        };
        let want = &fd.param_types;
        if got.len() != want.len() {
            self.error(
                id,
                SemanticErrorKind::FuncallArgsAmount,
                &format!("wanted {}, got {}", want.len(), got.len()),
            );
        }
        for i in 0..got.len().min(want.len()) {
            let Some(typegot) = self.get_type(got[i].id) else {
                continue;
            };
            if !want[i].matches(&typegot) {
                self.error(
                    id,
                    SemanticErrorKind::FuncallArgType,
                    &format!("wanted {}, got {}", want[i], typegot),
                );
            }
        }
        self.set_type(id, fd.returns.clone());
    }

    /// Field access `a.f` / `p->f`. The left traversal has propagated the
    /// struct descriptor through the side channel; the right side must be
    /// a plain field name resolvable against it. Nested accesses keep the
    /// propagation going.
    pub(crate) fn check_struct_field_access(
        &mut self,
        id: NodeId,
        op: BinOp,
        left: &Node,
        right: &Node,
    ) {
        let explvl = match op {
            BinOp::StructPtrDec => 1,
            BinOp::StructDec => 0,
            other => panic!("expecting struct access operator, got {}", other),
        };
        let Some(tl) = self.get_type(left.id) else {
            return;
        };
        if tl.pointer_level != explvl || tl.array_level != 0 {
            self.error(id, SemanticErrorKind::StructBadType, &format!("got {}", tl));
        }
        let NodeKind::Variable(field) = &right.kind else {
            self.error(
                right.id,
                SemanticErrorKind::StructDecNotField,
                &format!("got {}", right),
            );
            return;
        };
        let Some(st) = self.structaccess.get(&left.id).cloned() else {
            self.error(id, SemanticErrorKind::StructNotStruct, &format!("{}", left));
            return;
        };
        let Some(f) = st.find_field(field) else {
            self.error(
                right.id,
                SemanticErrorKind::StructFieldNotFound,
                &format!("{:?} has no field {:?}", st.name, field),
            );
            return;
        };
        let ft = f.ty.clone();
        if ft.base == TypeBase::Struct {
            self.structaccess.insert(id, ft.struct_extra().clone());
        }
        self.set_type(id, ft);
        if self.is_assignable(left.id) {
            self.set_assignable(id);
        }
    }

    /// Any pointer casts to `void*` and `void*` casts to any pointer;
    /// plain `void` is not a cast target and NULL is immune to casting.
    pub(crate) fn check_cast(&mut self, id: NodeId, to: &Kind, what: &Node) {
        if to.base == crate::ast::BaseKind::Void && to.pointer_level < 1 {
            self.error(id, SemanticErrorKind::CastVoid, "");
        }
        if let Some(kw) = self.get_type(what.id) {
            if matches!(what.kind, NodeKind::Null) {
                self.error(id, SemanticErrorKind::CastNull, "");
            } else if kw.pointer_level < 1 && to.pointer_level > 0 {
                self.error(
                    id,
                    SemanticErrorKind::CastVoidPointer,
                    &format!("{} is {}", what, kw),
                );
            }
        }
        let Some(t) = self.kind_to_type(to) else {
            return;
        };
        self.set_type(id, t);
    }

    pub(crate) fn check_alloc(&mut self, id: NodeId, kind: &Kind) {
        let Some(mut at) = self.kind_to_type(kind) else {
            return;
        };
        at.inc_ptr();
        self.set_type(id, at);
    }

    pub(crate) fn check_alloc_array(&mut self, id: NodeId, kind: &Kind, count: &Node) {
        let Some(mut at) = self.kind_to_type(kind) else {
            return;
        };
        at.inc_array();
        self.set_type(id, at);
        if let Some(nt) = self.get_type(count.id) {
            if !nt.matches(&Type::int()) {
                self.error(
                    count.id,
                    SemanticErrorKind::AllocArrayBadExpr,
                    &format!("got {}", nt),
                );
            }
        }
    }

    /// The `?` half of a ternary: its condition must be boolean and its
    /// right child must be the `:` node marked during the same traversal.
    fn check_ternary_cond(&mut self, id: NodeId, left: &Node, right: &Node) {
        let Some(k) = self.get_type(left.id) else {
            return;
        };
        if !k.matches(&Type::bool()) {
            self.error(
                id,
                SemanticErrorKind::TernaryCondNotBool,
                &format!("got {}", k),
            );
        }
        match &right.kind {
            NodeKind::OpBinary {
                op: BinOp::TernaryVals,
                ..
            } => {
                if !self.bump_ternary_val(right.id) {
                    self.error(right.id, SemanticErrorKind::TernaryMissingValue, "");
                }
            }
            _ => {
                self.error(id, SemanticErrorKind::TernaryMissingValue, "");
            }
        }
    }
}
