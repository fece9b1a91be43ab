//! Toy register VM for emitted IR
//!
//! Executes instruction lists linearly: `ALLOCA` targets get fresh 32-bit
//! cells, a register map carries intermediate values, and the value of
//! the last executed `RET` is the program's result.

use crate::ir::{Instruction, IrVariable, Value};
use log::trace;
use std::collections::HashMap;

#[derive(Default)]
pub struct Vm {
    funcs: Vec<(String, Vec<Instruction>)>,
    regs: HashMap<IrVariable, i32>,
    mem: Vec<i32>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, instructions: Vec<Instruction>) {
        self.funcs.push((name.to_string(), instructions));
    }

    fn value_of(&self, v: &Value) -> i32 {
        match v {
            Value::Num(n) => *n,
            Value::Var(var) => self.regs.get(var).copied().unwrap_or(0),
        }
    }

    fn alloca(&mut self) -> i32 {
        self.mem.push(0);
        (self.mem.len() - 1) as i32
    }

    /// Run all inserted functions in insertion order; returns the last
    /// `RET` value seen, if any.
    pub fn run(&mut self) -> Option<i32> {
        let mut ret = None;
        let funcs = std::mem::take(&mut self.funcs);
        for (name, instructions) in &funcs {
            trace!("running {}", name);
            for inst in instructions {
                trace!("{}", inst);
                match inst {
                    Instruction::Alloca { to, .. } => {
                        let cell = self.alloca();
                        self.regs.insert(to.clone(), cell);
                    }
                    Instruction::Mov { what, to, .. } => {
                        let val = self.value_of(what);
                        self.regs.insert(to.clone(), val);
                    }
                    Instruction::Store { from, to, .. } => {
                        let ptr = self.regs.get(to).copied().unwrap_or(0) as usize;
                        self.mem[ptr] = self.value_of(from);
                    }
                    Instruction::Load { from, to, .. } => {
                        let ptr = self.regs.get(from).copied().unwrap_or(0) as usize;
                        let val = self.mem[ptr];
                        self.regs.insert(to.clone(), val);
                    }
                    Instruction::Add { to, left, right, .. } => {
                        let val = self.value_of(left).wrapping_add(self.value_of(right));
                        self.regs.insert(to.clone(), val);
                    }
                    Instruction::Mul { to, left, right, .. } => {
                        let val = self.value_of(left).wrapping_mul(self.value_of(right));
                        self.regs.insert(to.clone(), val);
                    }
                    Instruction::Xor { to, left, right, .. } => {
                        let val = self.value_of(left) ^ self.value_of(right);
                        self.regs.insert(to.clone(), val);
                    }
                    Instruction::Return { with, .. } => {
                        ret = Some(self.value_of(with));
                    }
                    Instruction::Label(_) => {}
                }
            }
        }
        self.funcs = funcs;
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::form_cfg;
    use crate::ir::IrType;
    use crate::ssa::Ssa;
    use rc0_frontend::ast::NodeKind;
    use rc0_frontend::Frontend;

    fn run_function(code: &str) -> i32 {
        let unit = Frontend::analyze_source("<test>", code)
            .unwrap_or_else(|errs| panic!("analysis failed: {:?}", errs));
        let fundef = unit
            .nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::FunDef { .. }))
            .expect("no function definition");
        let cfg = form_cfg(fundef);
        let ssa = Ssa::from_cfg(&cfg);
        assert!(ssa.errors.is_empty(), "{:?}", ssa.errors);
        let mut vm = Vm::new();
        vm.insert(cfg.name(), ssa.instructions);
        vm.run().expect("no RET executed")
    }

    #[test]
    fn test_straight_line_arithmetic() {
        // b = 4, a = 1 * 2 + 4 = 6, result 7.
        let got = run_function(
            "int f() {
                 int a = 1;
                 int b = a + 3;
                 a = a * 2 + b;
                 return a + 1;
             }",
        );
        assert_eq!(got, 7);
    }

    #[test]
    fn test_immediate_return() {
        assert_eq!(run_function("int f() { return 42; }"), 42);
    }

    #[test]
    fn test_xor() {
        assert_eq!(run_function("int f() { int a = 12; return a ^ 10; }"), 12 ^ 10);
    }

    #[test]
    fn test_reassignment_reads_latest_cell() {
        assert_eq!(
            run_function("int f() { int x = 1; x = 2; x = x + 3; return x; }"),
            5
        );
    }

    #[test]
    fn test_hand_built_instruction_list() {
        // MOV 5 -> %1; ALLOCA -> %v_0; STORE %1; LOAD -> %2; RET %2
        let ty = IrType::INT32;
        let prog = vec![
            Instruction::Label("entry".to_string()),
            Instruction::Mov {
                ty,
                what: Value::Num(5),
                to: IrVariable::temp(1),
            },
            Instruction::Alloca {
                ty,
                align: 4,
                to: IrVariable::named("v", 0),
            },
            Instruction::Store {
                ty,
                from: Value::Var(IrVariable::temp(1)),
                to: IrVariable::named("v", 0),
            },
            Instruction::Load {
                ty,
                from: IrVariable::named("v", 0),
                to: IrVariable::temp(2),
            },
            Instruction::Return {
                ty,
                with: Value::Var(IrVariable::temp(2)),
            },
        ];
        let mut vm = Vm::new();
        vm.insert("f", prog);
        assert_eq!(vm.run(), Some(5));
    }

    #[test]
    fn test_overflow_wraps() {
        assert_eq!(
            run_function("int f() { int a = 2147483647; return a + 1; }"),
            i32::MIN
        );
    }
}
