//! SSA-style IR generation
//!
//! Lowers a function's CFG into a linear instruction list over an infinite
//! register file. Each assignment to a user variable bumps the variable's
//! generation counter and allocates a fresh cell, so straight-line code
//! comes out in SSA form; the value expression is lowered first and thus
//! still reads the previous generation.
//!
//! Blocks are emitted by a naive successor DFS without revisit
//! memoization, which is only adequate for straight-line code. Merging
//! paths and phi placement are deliberately out of scope for now.

use crate::cfg::{BasicBlock, Cfg};
use crate::ir::{Instruction, IrType, IrVariable, Value};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Constructs the straight-line generator cannot lower
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoweringError {
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),
    #[error("unsupported binary operator: {0}")]
    UnsupportedOperator(String),
    #[error("unsupported assignment target: {0}")]
    UnsupportedTarget(String),
    #[error("return without a value")]
    ReturnWithoutValue,
}

/// SSA generation state and output for one function
pub struct Ssa {
    reggen: usize,
    generations: HashMap<String, usize>,
    pub instructions: Vec<Instruction>,
    pub errors: Vec<LoweringError>,
}

impl Ssa {
    /// Lower a whole function
    pub fn from_cfg(cfg: &Cfg) -> Self {
        let mut ssa = Self {
            reggen: 0,
            generations: HashMap::new(),
            instructions: Vec::new(),
            errors: Vec::new(),
        };
        ssa.emit(Instruction::Label("entry".to_string()));
        ssa.emit_block(cfg, cfg.entry());
        ssa
    }

    fn emit(&mut self, inst: Instruction) {
        trace!("emit: {}", inst);
        self.instructions.push(inst);
    }

    fn fresh_register(&mut self) -> IrVariable {
        self.reggen += 1;
        IrVariable::temp(self.reggen)
    }

    /// Bump a user variable's generation; the first assignment gets
    /// generation zero.
    fn next_generation(&mut self, name: &str) -> usize {
        let next = match self.generations.get(name) {
            None => 0,
            Some(g) => g + 1,
        };
        debug!("generation: {} -> {}", name, next);
        self.generations.insert(name.to_string(), next);
        next
    }

    fn current_generation(&self, name: &str) -> usize {
        match self.generations.get(name) {
            Some(g) => *g,
            None => panic!("unknown generation for {:?}", name),
        }
    }

    fn unsupported(&mut self, err: LoweringError) -> IrVariable {
        self.errors.push(err);
        self.fresh_register()
    }

    /// Allocate the next cell for a user variable and return its register
    fn fresh_storable(&mut self, name: &str) -> IrVariable {
        let to = IrVariable::named(name, self.next_generation(name));
        self.emit(Instruction::Alloca {
            ty: IrType::INT32,
            align: 4,
            to: to.clone(),
        });
        to
    }

    /// Lower an expression to the register holding its value
    fn emit_loadable(&mut self, n: &rc0_frontend::ast::Node) -> IrVariable {
        use rc0_frontend::ast::NodeKind;
        match &n.kind {
            NodeKind::Variable(name) => {
                let from = IrVariable::named(name, self.current_generation(name));
                let to = self.fresh_register();
                self.emit(Instruction::Load {
                    ty: IrType::INT32,
                    from,
                    to: to.clone(),
                });
                to
            }
            NodeKind::Numeric { value, .. } => {
                let to = self.fresh_register();
                self.emit(Instruction::Mov {
                    ty: IrType::INT32,
                    what: Value::Num(*value),
                    to: to.clone(),
                });
                to
            }
            NodeKind::OpBinary { op, left, right } => self.emit_op_binary(*op, left, right),
            other => self.unsupported(LoweringError::UnsupportedExpression(format!("{:?}", other))),
        }
    }

    fn emit_op_binary(
        &mut self,
        op: rc0_frontend::ast::BinOp,
        left: &rc0_frontend::ast::Node,
        right: &rc0_frontend::ast::Node,
    ) -> IrVariable {
        use rc0_frontend::ast::BinOp;
        let left = self.emit_loadable(left);
        let right = self.emit_loadable(right);
        let to = self.fresh_register();
        let (ty, l, r) = (IrType::INT32, Value::Var(left), Value::Var(right));
        match op {
            BinOp::Add => self.emit(Instruction::Add { ty, to: to.clone(), left: l, right: r }),
            BinOp::Mul => self.emit(Instruction::Mul { ty, to: to.clone(), left: l, right: r }),
            BinOp::BitXor => self.emit(Instruction::Xor { ty, to: to.clone(), left: l, right: r }),
            other => {
                return self.unsupported(LoweringError::UnsupportedOperator(other.to_string()))
            }
        }
        to
    }

    /// Each assignment means a new variable generation. The right-hand
    /// side lowers first so its loads still reference the old one.
    fn emit_assign(&mut self, target: &rc0_frontend::ast::Node, value: Option<&rc0_frontend::ast::Node>) {
        use rc0_frontend::ast::NodeKind;
        let value = value.map(|v| self.emit_loadable(v));
        let name = match &target.kind {
            NodeKind::Variable(name) => name.clone(),
            NodeKind::VarDecl(vd) => vd.name.clone(),
            other => {
                self.unsupported(LoweringError::UnsupportedTarget(format!("{:?}", other)));
                return;
            }
        };
        let to = self.fresh_storable(&name);
        if let Some(value) = value {
            self.emit(Instruction::Store {
                ty: IrType::INT32,
                from: Value::Var(value),
                to,
            });
        }
    }

    fn emit_return(&mut self, expr: Option<&rc0_frontend::ast::Node>) {
        let Some(expr) = expr else {
            self.unsupported(LoweringError::ReturnWithoutValue);
            return;
        };
        let with = self.emit_loadable(expr);
        self.emit(Instruction::Return {
            ty: IrType::INT32,
            with: Value::Var(with),
        });
    }

    fn emit_node(&mut self, n: &rc0_frontend::ast::Node) {
        use rc0_frontend::ast::NodeKind;
        match &n.kind {
            NodeKind::OpAssign { target, value, .. } => {
                self.emit_assign(target, value.as_deref())
            }
            NodeKind::OpBinary { op, left, right } => {
                self.emit_op_binary(*op, left, right);
            }
            NodeKind::Return(expr) => self.emit_return(expr.as_deref()),
            other => {
                self.unsupported(LoweringError::UnsupportedStatement(format!("{:?}", other)));
            }
        }
    }

    fn emit_block(&mut self, cfg: &Cfg, bb: &BasicBlock) {
        for stmt in &bb.stmts {
            self.emit_node(stmt);
        }
        for succ in &bb.successors {
            self.emit_block(cfg, cfg.block(succ.to));
        }
    }

    /// Debug dump with instruction indices
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, inst) in self.instructions.iter().enumerate() {
            out.push_str(&format!("[{:03}] {}\n", i, inst));
        }
        out
    }
}

impl fmt::Display for Ssa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}
