//! Token definitions for the C0 lexer

use rc0_common::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// C0 token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals and identifiers
    Id,
    DecNum,
    HexNum,
    StrLit,
    LibLit,
    ChrLit,

    // Separators
    LParen,
    RParen,
    LBrack,
    RBrack,
    LCurly,
    RCurly,
    Comma,
    Semicolon,

    // Operators
    Exclam,    // !
    Worm,      // ~
    Plus,      // +
    Minus,     // -
    Star,      // *
    Dot,       // .
    Arrow,     // ->
    Slash,     // /
    Percent,   // %
    Lt,        // <
    Gt,        // >
    DLt,       // <<
    DGt,       // >>
    Le,        // <=
    Ge,        // >=
    Eq,        // ==
    Ne,        // !=
    Ampersand, // &
    Hat,       // ^
    Pipe,      // |
    DAmpersand, // &&
    DPipe,     // ||
    Quest,     // ?
    Colon,     // :
    DPlus,     // ++
    DMinus,    // --

    // Assignment operators
    Assign,          // =
    AssignPlus,      // +=
    AssignMinus,     // -=
    AssignStar,      // *=
    AssignSlash,     // /=
    AssignPercent,   // %=
    AssignDLt,       // <<=
    AssignDGt,       // >>=
    AssignAmpersand, // &=
    AssignHat,       // ^=
    AssignPipe,      // |=

    // Compiler directives
    UseStrLit, // #use "file"
    UseLibLit, // #use <lib>

    // Adjacent "[]" in a type declaration
    Brackets,

    // Special identifiers
    True,
    False,
    Null,

    // Comments
    CommentOne,
    CommentMulti,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Id => "id",
            TokenKind::DecNum => "decnum",
            TokenKind::HexNum => "hexnum",
            TokenKind::StrLit => "strlit",
            TokenKind::LibLit => "liblit",
            TokenKind::ChrLit => "chrlit",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrack => "[",
            TokenKind::RBrack => "]",
            TokenKind::LCurly => "{",
            TokenKind::RCurly => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Exclam => "!",
            TokenKind::Worm => "~",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::DLt => "<<",
            TokenKind::DGt => ">>",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::Eq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Ampersand => "&",
            TokenKind::Hat => "^",
            TokenKind::Pipe => "|",
            TokenKind::DAmpersand => "&&",
            TokenKind::DPipe => "||",
            TokenKind::Quest => "?",
            TokenKind::Colon => ":",
            TokenKind::DPlus => "++",
            TokenKind::DMinus => "--",
            TokenKind::Assign => "=",
            TokenKind::AssignPlus => "+=",
            TokenKind::AssignMinus => "-=",
            TokenKind::AssignStar => "*=",
            TokenKind::AssignSlash => "/=",
            TokenKind::AssignPercent => "%=",
            TokenKind::AssignDLt => "<<=",
            TokenKind::AssignDGt => ">>=",
            TokenKind::AssignAmpersand => "&=",
            TokenKind::AssignHat => "^=",
            TokenKind::AssignPipe => "|=",
            TokenKind::UseStrLit => "#usestr",
            TokenKind::UseLibLit => "#uselib",
            TokenKind::Brackets => "[]",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "NULL",
            TokenKind::CommentOne => "//comment",
            TokenKind::CommentMulti => "/* comment */",
        };
        write!(f, "{}", name)
    }
}

/// A token with span and processed lexeme
///
/// The lexeme carries the useful payload: identifier text, the digits of a
/// numeric literal (hex literals keep their `0x` prefix), the unescaped
/// contents of string and character literals, or the path of a `#use`
/// directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan, text: String) -> Self {
        Self { kind, span, text }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::CommentOne | TokenKind::CommentMulti)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Id
            | TokenKind::DecNum
            | TokenKind::HexNum
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => write!(f, "{}", self.text),
            TokenKind::StrLit => write!(f, "{:?}", self.text),
            TokenKind::ChrLit => {
                write!(f, "'")?;
                for ch in self.text.chars() {
                    write!(f, "{}", ch.escape_default())?;
                }
                write!(f, "'")
            }
            TokenKind::LibLit => write!(f, "<{}>", self.text),
            TokenKind::UseStrLit => write!(f, "#use {:?}", self.text),
            TokenKind::UseLibLit => write!(f, "#use <{}>", self.text),
            TokenKind::CommentOne => write!(f, "//{}", self.text),
            TokenKind::CommentMulti => write!(f, "/*{}*/", self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// The words that may begin a type declaration
pub fn is_primitive_word(name: &str) -> bool {
    matches!(name, "int" | "bool" | "char" | "void" | "string" | "struct")
}

/// Identifiers that may not name variables, parameters, struct members,
/// typedefs or functions
pub fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "if" | "else"
            | "while"
            | "for"
            | "return"
            | "assert"
            | "error"
            | "typedef"
            | "struct"
            | "int"
            | "bool"
            | "void"
            | "string"
            | "char"
            | "NULL"
            | "true"
            | "false"
            | "alloc"
            | "alloc_array"
            | "break"
            | "continue"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", TokenKind::DAmpersand), "&&");
        assert_eq!(format!("{}", TokenKind::AssignDLt), "<<=");
        assert_eq!(format!("{}", TokenKind::Brackets), "[]");
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("alloc_array"));
        assert!(is_reserved_word("NULL"));
        assert!(!is_reserved_word("main"));
        assert!(is_primitive_word("struct"));
        assert!(!is_primitive_word("typedef"));
    }
}
