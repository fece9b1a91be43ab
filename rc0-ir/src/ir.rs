//! Intermediate representation
//!
//! A subset of the LLVM IR approach: a RISC-flavored instruction set where
//! all ALU operands are registers, LOAD and STORE move memory contents,
//! and the register file is assumed infinite. Register allocation is a
//! later stage's worry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A virtual register. Named registers carry a user variable name and its
/// SSA generation; anonymous temporaries have an empty name and print as
/// `%N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrVariable {
    pub name: String,
    pub count: usize,
}

impl IrVariable {
    pub fn temp(count: usize) -> Self {
        Self {
            name: String::new(),
            count,
        }
    }

    pub fn named(name: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            count,
        }
    }
}

impl fmt::Display for IrVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "%{}", self.count)
        } else {
            write!(f, "%{}_{}", self.name, self.count)
        }
    }
}

/// An instruction operand: a register or a 32-bit signed constant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Var(IrVariable),
    Num(i32),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(v) => write!(f, "{}", v),
            Value::Num(n) => write!(f, "{}", n),
        }
    }
}

/// Type parameterizing an instruction. Pointer level renders as a run of
/// `*` inside the brackets, an element count as an `n x` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrType {
    pub pointer_level: usize,
    pub elements: usize,
}

impl IrType {
    pub const INT32: IrType = IrType {
        pointer_level: 0,
        elements: 0,
    };
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements > 0 {
            write!(f, "[{} x {}i32]", self.elements, "*".repeat(self.pointer_level))
        } else {
            write!(f, "[{}i32]", "*".repeat(self.pointer_level))
        }
    }
}

/// IR instruction with its deterministic pretty-print form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// `ALLOCA [i32], align 4 → %name_gen`
    Alloca {
        ty: IrType,
        align: u32,
        to: IrVariable,
    },
    /// `LOAD<[i32]> [%name_gen], %temp`
    Load {
        ty: IrType,
        from: IrVariable,
        to: IrVariable,
    },
    /// `STORE<[i32]> %temp, [%name_gen]`
    Store {
        ty: IrType,
        from: Value,
        to: IrVariable,
    },
    /// `MOV<[i32]> <value>, %temp`
    Mov {
        ty: IrType,
        what: Value,
        to: IrVariable,
    },
    /// `%t = ADD<[i32]> %a, %b`
    Add {
        ty: IrType,
        to: IrVariable,
        left: Value,
        right: Value,
    },
    /// `%t = MUL<[i32]> %a, %b`
    Mul {
        ty: IrType,
        to: IrVariable,
        left: Value,
        right: Value,
    },
    /// `%t = XOR<[i32]> %a, %b`
    Xor {
        ty: IrType,
        to: IrVariable,
        left: Value,
        right: Value,
    },
    /// `RET<[i32]> %v`
    Return { ty: IrType, with: Value },
    /// `entry:`
    Label(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { ty, align, to } => {
                write!(f, "ALLOCA {}, align {} \u{2192} {}", ty, align, to)
            }
            Instruction::Load { ty, from, to } => write!(f, "LOAD<{}> [{}], {}", ty, from, to),
            Instruction::Store { ty, from, to } => write!(f, "STORE<{}> {}, [{}]", ty, from, to),
            Instruction::Mov { ty, what, to } => write!(f, "MOV<{}> {}, {}", ty, what, to),
            Instruction::Add { ty, to, left, right } => {
                write!(f, "{} = ADD<{}> {}, {}", to, ty, left, right)
            }
            Instruction::Mul { ty, to, left, right } => {
                write!(f, "{} = MUL<{}> {}, {}", to, ty, left, right)
            }
            Instruction::Xor { ty, to, left, right } => {
                write!(f, "{} = XOR<{}> {}, {}", to, ty, left, right)
            }
            Instruction::Return { ty, with } => write!(f, "RET<{}> {}", ty, with),
            Instruction::Label(name) => write!(f, "{}:", name),
        }
    }
}
