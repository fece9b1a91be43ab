//! Type declaration parsing
//!
//! Grammar:
//!
//! ```text
//! <tp>        = <tp-atomic> <tp-suffix>
//! <tp-atomic> = "int" | "bool" | "string" | "char" | "void"
//!             | "struct" <sid>
//!             | <aid>
//! <tp-suffix> = [ "*" { "*" } ] [ "[]" { "[]" } ]
//! ```
//!
//! An identifier that is neither a primitive word nor a known typedef name
//! fails the whole production. The failure is soft: callers trying a cast
//! fall back to a grouped expression, and declaration contexts wrap the
//! failure into their own diagnostic.

use crate::ast::{BaseKind, Kind};
use crate::lexer::token::is_primitive_word;
use crate::lexer::{TokenKind, TokenStream};
use crate::parser::{PResult, ParseFail, Parser};
use log::trace;

impl Parser {
    pub fn parse_type(&mut self, toks: &mut TokenStream) -> PResult<Kind> {
        let atom = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if atom.kind != TokenKind::Id {
            return Err(ParseFail::Soft);
        }
        if !is_primitive_word(&atom.text) && !self.is_typedef(&atom.text) {
            trace!("type parse: {:?} is neither primitive nor typedef", atom.text);
            return Err(ParseFail::Soft);
        }
        toks.pop();

        let (base, name) = match atom.text.as_str() {
            "int" => (BaseKind::Int, String::new()),
            "bool" => (BaseKind::Bool, String::new()),
            "string" => (BaseKind::String, String::new()),
            "char" => (BaseKind::Char, String::new()),
            "void" => (BaseKind::Void, String::new()),
            "struct" => {
                let sid = toks.pop();
                match sid {
                    Some(sid) if sid.kind == TokenKind::Id => (BaseKind::Struct, sid.text),
                    got => {
                        return Err(self.error_at(
                            Some(&atom),
                            format!("expected struct name, got {:?}", got.map(|t| t.text)),
                        ));
                    }
                }
            }
            // Anything else here is a typedef name; whether it makes sense
            // is resolved during analysis.
            other => (BaseKind::Typedef, other.to_string()),
        };

        let mut pointer_level = 0;
        while toks.peek().is_some_and(|t| t.kind == TokenKind::Star) {
            pointer_level += 1;
            toks.pop();
        }
        let mut array_level = 0;
        while toks.peek().is_some_and(|t| t.kind == TokenKind::Brackets) {
            array_level += 1;
            toks.pop();
        }

        let mut kind = Kind::new(base, pointer_level, array_level, &name);
        kind.id = self.tag(&atom);
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeTags;
    use crate::lexer::lex;

    fn parse_type_str(input: &str) -> (PResult<Kind>, Parser) {
        let (mut toks, _) = lex("<test>", input);
        let mut parser = Parser::new(NodeTags::disabled_shared());
        let got = parser.parse_type(&mut toks);
        (got, parser)
    }

    #[test]
    fn test_simple() {
        let (got, _) = parse_type_str("int");
        assert_eq!(got.unwrap(), Kind::new(BaseKind::Int, 0, 0, ""));
    }

    #[test]
    fn test_struct() {
        let (got, _) = parse_type_str("struct name");
        assert_eq!(got.unwrap(), Kind::new(BaseKind::Struct, 0, 0, "name"));
    }

    #[test]
    fn test_levels() {
        let (got, _) = parse_type_str("struct name **[]");
        assert_eq!(got.unwrap(), Kind::new(BaseKind::Struct, 2, 1, "name"));
    }

    #[test]
    fn test_typedef_requires_table_entry() {
        let (got, _) = parse_type_str("something");
        assert_eq!(got, Err(ParseFail::Soft));

        let (mut toks, _) = lex("<test>", "something *");
        let mut parser = Parser::new(NodeTags::disabled_shared());
        parser.add_typedef("something").unwrap();
        let got = parser.parse_type(&mut toks).unwrap();
        assert_eq!(got, Kind::new(BaseKind::Typedef, 1, 0, "something"));
    }

    #[test]
    fn test_not_a_type() {
        let (got, parser) = parse_type_str("42");
        assert_eq!(got, Err(ParseFail::Soft));
        assert!(parser.errors().is_empty());
    }

    #[test]
    fn test_struct_without_name() {
        let (got, parser) = parse_type_str("struct ;");
        assert_eq!(got, Err(ParseFail::Hard));
        assert_eq!(parser.errors().len(), 1);
    }
}
