//! rc0 C0 Compiler - Mid-end
//!
//! This crate turns analyzed function definitions into control-flow
//! graphs, lowers straight-line CFGs into an SSA-style intermediate
//! representation, and provides a toy register VM that executes the
//! emitted instruction lists.

pub mod cfg;
pub mod ir;
pub mod ssa;
pub mod vm;

pub use cfg::{form_cfg, BasicBlock, BlockId, Branch, BranchId, BranchKind, Cfg};
pub use ir::{Instruction, IrType, IrVariable, Value};
pub use ssa::{LoweringError, Ssa};
pub use vm::Vm;
