//! Semantic type model
//!
//! The analyzer turns syntactic `Kind` declarations into `Type` values and
//! propagates them through expressions. Equality is structural: equal base
//! and pointer/array levels, and for structs and functions structural
//! equality of the payload.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeBase {
    Int,
    Bool,
    String,
    Struct,
    StructFwd,
    Void,
    Char,
    Func,
    Null,
}

impl fmt::Display for TypeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeBase::Int => "int",
            TypeBase::Bool => "bool",
            TypeBase::String => "string",
            TypeBase::Struct => "struct",
            TypeBase::StructFwd => "struct (fwd)",
            TypeBase::Void => "void",
            TypeBase::Char => "char",
            TypeBase::Func => "func",
            TypeBase::Null => "null",
        };
        write!(f, "{}", name)
    }
}

/// Payload for struct and function types
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExtra {
    Struct(Rc<StructType>),
    StructForward(String),
    Function(Rc<FunctionType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn find_field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(def-struct {:?} (struct-members", self.name)?;
        for field in &self.fields {
            write!(f, " (struct-member {:?} {})", field.name, field.ty)?;
        }
        write!(f, "))")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub returns: Type,
    pub param_types: Vec<Type>,
}

impl FunctionType {
    pub fn matches(&self, other: &FunctionType) -> bool {
        self.returns.matches(&other.returns)
            && self.param_types.len() == other.param_types.len()
            && self
                .param_types
                .iter()
                .zip(other.param_types.iter())
                .all(|(a, b)| a.matches(b))
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(def-function {} (types", self.returns)?;
        for pt in &self.param_types {
            write!(f, " {}", pt)?;
        }
        write!(f, "))")
    }
}

/// A semantic type: base, pointer level, array level and an optional payload
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub base: TypeBase,
    pub pointer_level: usize,
    pub array_level: usize,
    pub extra: Option<TypeExtra>,
}

impl Type {
    pub fn new(base: TypeBase, pointer_level: usize, array_level: usize) -> Self {
        Self {
            base,
            pointer_level,
            array_level,
            extra: None,
        }
    }

    pub fn with_extra(
        base: TypeBase,
        pointer_level: usize,
        array_level: usize,
        extra: TypeExtra,
    ) -> Self {
        Self {
            base,
            pointer_level,
            array_level,
            extra: Some(extra),
        }
    }

    pub fn int() -> Self {
        Self::new(TypeBase::Int, 0, 0)
    }

    pub fn bool() -> Self {
        Self::new(TypeBase::Bool, 0, 0)
    }

    pub fn char() -> Self {
        Self::new(TypeBase::Char, 0, 0)
    }

    pub fn string() -> Self {
        Self::new(TypeBase::String, 0, 0)
    }

    pub fn void() -> Self {
        Self::new(TypeBase::Void, 0, 0)
    }

    pub fn null() -> Self {
        Self::new(TypeBase::Null, 0, 0)
    }

    /// Structural type equality
    pub fn matches(&self, other: &Type) -> bool {
        if self.base != other.base
            || self.pointer_level != other.pointer_level
            || self.array_level != other.array_level
        {
            return false;
        }
        // A missing payload on a struct or function type is a compiler bug,
        // and matching on it would be nonsensical.
        match self.base {
            TypeBase::Struct => {
                let (a, b) = (self.struct_extra(), other.struct_extra());
                a.name == b.name
                    && a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .zip(b.fields.iter())
                        .all(|(x, y)| x.name == y.name && x.ty.matches(&y.ty))
            }
            TypeBase::StructFwd => self.fwd_name() == other.fwd_name(),
            TypeBase::Func => self.func_extra().matches(other.func_extra()),
            _ => true,
        }
    }

    pub fn struct_extra(&self) -> &Rc<StructType> {
        match &self.extra {
            Some(TypeExtra::Struct(st)) => st,
            _ => panic!("struct type without struct payload: {}", self),
        }
    }

    pub fn func_extra(&self) -> &Rc<FunctionType> {
        match &self.extra {
            Some(TypeExtra::Function(ft)) => ft,
            _ => panic!("function type without function payload: {}", self),
        }
    }

    fn fwd_name(&self) -> &str {
        match &self.extra {
            Some(TypeExtra::StructForward(name)) => name,
            _ => panic!("forward struct type without name payload: {}", self),
        }
    }

    pub fn inc_ptr(&mut self) {
        self.pointer_level += 1;
    }

    pub fn dec_ptr(&mut self) {
        if self.pointer_level == 0 {
            panic!("pointer level below zero");
        }
        self.pointer_level -= 1;
    }

    pub fn inc_array(&mut self) {
        self.array_level += 1;
    }

    pub fn dec_array(&mut self) {
        if self.array_level == 0 {
            panic!("array level below zero");
        }
        self.array_level -= 1;
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.base,
            "*".repeat(self.pointer_level),
            "[]".repeat(self.array_level)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_plain() {
        assert!(Type::int().matches(&Type::int()));
        assert!(!Type::int().matches(&Type::bool()));
        assert!(!Type::int().matches(&Type::new(TypeBase::Int, 1, 0)));
        assert!(!Type::int().matches(&Type::new(TypeBase::Int, 0, 1)));
    }

    #[test]
    fn test_matches_is_an_equivalence() {
        let a = Type::new(TypeBase::Char, 2, 1);
        let b = Type::new(TypeBase::Char, 2, 1);
        let c = Type::new(TypeBase::Char, 2, 1);
        assert!(a.matches(&a));
        assert!(a.matches(&b) && b.matches(&a));
        assert!(a.matches(&b) && b.matches(&c) && a.matches(&c));
    }

    #[test]
    fn test_matches_structs() {
        let st = |name: &str| {
            Type::with_extra(
                TypeBase::Struct,
                0,
                0,
                TypeExtra::Struct(Rc::new(StructType {
                    name: name.to_string(),
                    fields: vec![StructField {
                        name: "a".to_string(),
                        ty: Type::int(),
                    }],
                })),
            )
        };
        assert!(st("s").matches(&st("s")));
        assert!(!st("s").matches(&st("t")));
    }

    #[test]
    fn test_matches_functions() {
        let ft = |params: Vec<Type>| {
            Type::with_extra(
                TypeBase::Func,
                0,
                0,
                TypeExtra::Function(Rc::new(FunctionType {
                    returns: Type::bool(),
                    param_types: params,
                })),
            )
        };
        assert!(ft(vec![Type::int()]).matches(&ft(vec![Type::int()])));
        assert!(!ft(vec![Type::int()]).matches(&ft(vec![Type::char()])));
        assert!(!ft(vec![Type::int()]).matches(&ft(vec![])));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Type::new(TypeBase::Int, 2, 1)), "int**[]");
        assert_eq!(format!("{}", Type::null()), "null");
    }

    #[test]
    #[should_panic(expected = "pointer level below zero")]
    fn test_dec_ptr_panics() {
        let mut t = Type::int();
        t.dec_ptr();
    }
}
