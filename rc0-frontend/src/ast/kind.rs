//! Syntactic type declarations
//!
//! A `Kind` is a declared type exactly as parsed: a base, a pointer level
//! (run of `*`) and an array level (run of `[]`). Whether the declaration
//! makes sense is the analyzer's business; see the semantic type model.

use crate::ast::tagging::NodeId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Int,
    Bool,
    String,
    Struct,
    Void,
    Char,
    Typedef,
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseKind::Int => "Int",
            BaseKind::Bool => "Bool",
            BaseKind::String => "String",
            BaseKind::Struct => "Struct",
            BaseKind::Void => "Void",
            BaseKind::Char => "Char",
            BaseKind::Typedef => "Typedef",
        };
        write!(f, "{}", name)
    }
}

/// A parsed type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    pub id: NodeId,
    pub base: BaseKind,
    pub pointer_level: usize,
    pub array_level: usize,
    /// struct or typedef name; empty for the atomic bases
    pub name: String,
}

impl Kind {
    /// Validating constructor. A `Kind` that violates the naming invariant
    /// is a compiler bug, not a user error.
    pub fn new(base: BaseKind, pointer_level: usize, array_level: usize, name: &str) -> Self {
        match base {
            BaseKind::Struct | BaseKind::Typedef => {
                if name.is_empty() {
                    panic!("typedef/struct without name");
                }
            }
            _ => {
                if !name.is_empty() {
                    panic!("atomic type with a name");
                }
            }
        }
        Self {
            id: 0,
            base,
            pointer_level,
            array_level,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseKind::Typedef => format!("typedef: {}", self.name),
            BaseKind::Struct => format!("struct {}", self.name),
            other => other.to_string(),
        };
        write!(
            f,
            "(kind \"{}{}{}\")",
            base,
            "*".repeat(self.pointer_level),
            "[]".repeat(self.array_level)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let k = Kind::new(BaseKind::Int, 2, 1, "");
        assert_eq!(format!("{}", k), "(kind \"Int**[]\")");
        let k = Kind::new(BaseKind::Struct, 0, 0, "zap");
        assert_eq!(format!("{}", k), "(kind \"struct zap\")");
        let k = Kind::new(BaseKind::Typedef, 1, 0, "myint");
        assert_eq!(format!("{}", k), "(kind \"typedef: myint*\")");
    }

    #[test]
    #[should_panic(expected = "typedef/struct without name")]
    fn test_struct_needs_name() {
        let _ = Kind::new(BaseKind::Struct, 0, 0, "");
    }

    #[test]
    #[should_panic(expected = "atomic type with a name")]
    fn test_atomic_rejects_name() {
        let _ = Kind::new(BaseKind::Int, 0, 0, "zap");
    }
}
