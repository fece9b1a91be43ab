//! Semantic error kinds
//!
//! Each diagnostic pairs a matchable kind with a located, human-readable
//! message. Tests match on the kind; users see `file:line:col: message`.

use rc0_common::SourceLocation;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    #[error("condition not boolean")]
    CondNotBool,
    #[error("ternary operator missing '?'")]
    TernaryMissingCond,
    #[error("ternary operator missing ':'")]
    TernaryMissingValue,
    #[error("ternary condition not boolean")]
    TernaryCondNotBool,
    #[error("non-integer comparison")]
    CompareNonInteger,
    #[error("types for comparison do not match")]
    CompareTypesMismatch,
    #[error("equality can only be evaluated for integers, booleans, characters and arrays")]
    CompareBadType,
    #[error("variable has not been defined")]
    VariableNotDefined,
    #[error("variable has already been defined")]
    VariableAlreadyDefined,
    #[error("non-integer arithmetic")]
    ArithNonInteger,
    #[error("assignment type mismatch")]
    AssignTypeMismatch,
    #[error("cannot assign to a non-lvalue")]
    AssignNotLvalue,
    #[error("calling non-declared function")]
    FuncallNotFound,
    #[error("function argument type mismatch")]
    FuncallArgType,
    #[error("wrong amount of function arguments")]
    FuncallArgsAmount,
    #[error("expecting function pointer")]
    FuncallWrongPtrType,
    #[error("variable declaration already a function")]
    VarDeclShadowsFunction,
    #[error("variable declaration already a typedef")]
    VarDeclShadowsTypedef,
    #[error("`alloc_array' expression should result in integer")]
    AllocArrayBadExpr,
    #[error("bad array subscript expression")]
    ArraySubBadExpr,
    #[error("trying to subscript a non-array")]
    ArraySubNotArray,
    #[error("array subscript a non-integer")]
    ArraySubNotInt,
    #[error("struct access needs a field name")]
    StructDecNotField,
    #[error("struct field not found")]
    StructFieldNotFound,
    #[error("trying to access a field of a non-struct")]
    StructNotStruct,
    #[error("trying to access a field from bad type")]
    StructBadType,
    #[error("forward-declared struct size is unknown")]
    StructSizeUnknown,
    #[error("cannot declare a non-pointer variable of a struct, which is only forward-declared")]
    StructOnlyForward,
    #[error("`break' not permitted outside loops")]
    BreakOutsideLoop,
    #[error("`continue' not permitted outside loops")]
    ContinueOutsideLoop,
    #[error("`return' expression missing for non-void function")]
    ReturnExprMissing,
    #[error("`return' expression is mistyped")]
    ReturnMistyped,
    #[error("`return' statement missing for non-void function")]
    ReturnMissing,
    #[error("function parameter may not be plain struct")]
    FuncParamStruct,
    #[error("`void' as a variable type is unacceptable")]
    VarDeclVoid,
    #[error("cannot cast to void")]
    CastVoid,
    #[error("cannot cast to void pointer")]
    CastVoidPointer,
    #[error("NULL cannot be cast")]
    CastNull,
    #[error("cannot negate non-boolean")]
    NegateNonBool,
    #[error("dereferencing NULL")]
    DerefNull,
    #[error("dereferencing non-pointer")]
    DerefNonPointer,
    #[error("cannot get address of non-function")]
    AddrOfNonFunction,
    #[error("integer operation on non-integer")]
    UnaryNonInteger,
    #[error("`error' expects a string")]
    ErrorNotString,
    #[error("unrecognized typedef")]
    TypeUnrecognizedTypedef,
    #[error("unrecognized struct")]
    TypeUnrecognizedStruct,
    #[error("typedef already defined")]
    TypedefAlreadyDefined,
    #[error("struct already defined")]
    StructAlreadyDefined,
    #[error("function redefined with different type")]
    FuncDifferentType,
    #[error("invalid function declaration")]
    FuncDeclInvalid,
}

/// A located semantic diagnostic
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{file}:{location}: {message}")]
pub struct AnalyzeError {
    pub kind: SemanticErrorKind,
    pub file: String,
    pub location: SourceLocation,
    pub message: String,
}

impl AnalyzeError {
    pub fn new(
        kind: SemanticErrorKind,
        file: &str,
        location: SourceLocation,
        detail: &str,
    ) -> Self {
        let message = if detail.is_empty() {
            kind.to_string()
        } else {
            format!("{}: {}", kind, detail)
        };
        Self {
            kind,
            file: file.to_string(),
            location,
            message,
        }
    }
}

impl From<AnalyzeError> for rc0_common::CompilerError {
    fn from(err: AnalyzeError) -> Self {
        rc0_common::CompilerError::Semantic {
            file: err.file,
            location: err.location,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        let err = AnalyzeError::new(
            SemanticErrorKind::VariableNotDefined,
            "main.c0",
            SourceLocation::new(4, 9),
            "\"zap\"",
        );
        assert_eq!(
            format!("{}", err),
            "main.c0:4:9: variable has not been defined: \"zap\""
        );
        assert_eq!(err.kind, SemanticErrorKind::VariableNotDefined);
    }
}
