//! Expression parsing
//!
//! Precedence climbing after Norvell's exposition. Function calls `()` and
//! array subscripts `[]` are handled as maximally greedy postfix operators
//! outside the precedence machinery; `?` and `:` parse as two separate
//! right-associative binary operators whose pairing the analyzer verifies.
//!
//! ```text
//! <exp>    = <prefix> <suffix>
//! <prefix> = <num> | <strlit> | <chrlit> | true | false | NULL
//!          | "(" <exp> ")"
//!          | <unop> <exp>
//!          | <exp> "[" <exp> "]"
//!          | <exp> "(" [ <exp> ("," <exp>)* ] ")"
//!          | <exp> "." <fid>
//!          | <exp> "->" <fid>
//!          | <vid>
//! <suffix> = <binop> <exp> | "?" <exp> ":" <exp> | eps
//! ```

use crate::ast::{BinOp, Node, NodeKind, UnOp};
use crate::lexer::token::is_reserved_word;
use crate::lexer::{TokenKind, TokenStream};
use crate::parser::{PResult, ParseFail, Parser};

fn unop_for(kind: TokenKind) -> Option<UnOp> {
    match kind {
        TokenKind::Minus => Some(UnOp::Neg),
        TokenKind::Exclam => Some(UnOp::LogNot),
        TokenKind::Worm => Some(UnOp::BitNot),
        TokenKind::Star => Some(UnOp::Deref),
        TokenKind::DPlus => Some(UnOp::AddOne),
        TokenKind::DMinus => Some(UnOp::SubOne),
        TokenKind::Ampersand => Some(UnOp::AddrOf),
        _ => None,
    }
}

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Mod),
        TokenKind::LBrack => Some(BinOp::ArrSub),
        TokenKind::LParen => Some(BinOp::FunCall),
        TokenKind::Dot => Some(BinOp::StructDec),
        TokenKind::Arrow => Some(BinOp::StructPtrDec),
        TokenKind::Quest => Some(BinOp::TernaryCond),
        TokenKind::Colon => Some(BinOp::TernaryVals),
        TokenKind::DGt => Some(BinOp::ShiftR),
        TokenKind::DLt => Some(BinOp::ShiftL),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Ge => Some(BinOp::Ge),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Eq => Some(BinOp::Eq),
        TokenKind::Ne => Some(BinOp::Ne),
        TokenKind::Ampersand => Some(BinOp::BitAnd),
        TokenKind::Pipe => Some(BinOp::BitOr),
        TokenKind::Hat => Some(BinOp::BitXor),
        TokenKind::DAmpersand => Some(BinOp::And),
        TokenKind::DPipe => Some(BinOp::Or),
        _ => None,
    }
}

/// Binary operator precedence, lowest first. Assignment operators are not
/// expression operators at all, which is why chained assignments do not
/// parse.
fn prec_binary(kind: TokenKind) -> u32 {
    match kind {
        TokenKind::Quest | TokenKind::Colon => 0,
        TokenKind::DPipe => 1,
        TokenKind::DAmpersand => 2,
        TokenKind::Pipe => 3,
        TokenKind::Hat => 4,
        TokenKind::Ampersand => 5,
        TokenKind::Eq | TokenKind::Ne => 6,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => 7,
        TokenKind::DLt | TokenKind::DGt => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
        // LParen and LBrack never reach the precedence machinery.
        TokenKind::Arrow | TokenKind::Dot => 11,
        other => panic!("invalid binary operator: {}", other),
    }
}

fn prec_unary(kind: TokenKind) -> u32 {
    match kind {
        TokenKind::Star
        | TokenKind::Exclam
        | TokenKind::Worm
        | TokenKind::Minus
        | TokenKind::DPlus
        | TokenKind::DMinus
        | TokenKind::Ampersand => 10,
        other => panic!("invalid unary operator: {}", other),
    }
}

fn is_left_assoc(kind: TokenKind) -> bool {
    !matches!(kind, TokenKind::Quest | TokenKind::Colon)
}

impl Parser {
    /// Parse one expression
    pub fn expr(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        self.expr_parse(toks, 0)
    }

    fn expr_atom(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let this = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if let Some(unop) = unop_for(this.kind) {
            // All unary operators bind right, hence the +1. Since field
            // access sits one level above, a prefix `*` takes the whole
            // postfix chain: `*s.f` is `*(s.f)`.
            let nextminprec = prec_unary(this.kind) + 1;
            toks.pop();
            let operand = self.expr_parse(toks, nextminprec)?;
            return Ok(self.node(
                &this,
                NodeKind::OpUnary {
                    op: unop,
                    operand: Box::new(operand),
                },
            ));
        }
        match this.kind {
            TokenKind::LParen => {
                // '(' can open a cast, "(int *)x", or a subexpression.
                toks.pop();
                match self.parse_type(toks) {
                    Ok(castkind) => {
                        if let Err(msg) = toks.accept(TokenKind::RParen) {
                            return Err(
                                self.error_at(Some(&this), format!("invalid cast: {}", msg))
                            );
                        }
                        let castwhat = self.expr_atom(toks)?;
                        Ok(self.node(
                            &this,
                            NodeKind::Cast {
                                to: castkind,
                                what: Box::new(castwhat),
                            },
                        ))
                    }
                    Err(ParseFail::Hard) => Err(ParseFail::Hard),
                    Err(ParseFail::Soft) => {
                        let parexpr = self.expr_parse(toks, 0)?;
                        if let Err(msg) = toks.accept(TokenKind::RParen) {
                            return Err(self.error_at(
                                Some(&this),
                                format!("unbalanced parentheses: {}", msg),
                            ));
                        }
                        Ok(parexpr)
                    }
                }
            }
            TokenKind::DecNum | TokenKind::HexNum => {
                toks.pop();
                let (digits, base) = if this.kind == TokenKind::HexNum {
                    (this.text.trim_start_matches("0x").trim_start_matches("0X"), 16)
                } else {
                    (this.text.as_str(), 10)
                };
                match i32::from_str_radix(digits, base) {
                    Ok(value) => {
                        Ok(self.node(&this, NodeKind::Numeric { value, base }))
                    }
                    Err(err) => {
                        Err(self.error_at(Some(&this), format!("invalid integer: {}", err)))
                    }
                }
            }
            TokenKind::Id => {
                let iv = this.text.as_str();
                if self.is_typedef(iv) {
                    // A typedef name is not an expression atom; failing
                    // here without consuming lets the cast and
                    // variable-declaration branches have their go.
                    return Err(ParseFail::Soft);
                }
                match iv {
                    // "void" is not accepted in expressions.
                    "void" => Err(ParseFail::Soft),
                    "alloc" | "alloc_array" => {
                        let which = iv.to_string();
                        toks.pop();
                        if toks.accept(TokenKind::LParen).is_err() {
                            return Err(self
                                .error_at(Some(&this), format!("{} missing '('", which)));
                        }
                        let ak = match self.parse_type(toks) {
                            Ok(ak) => ak,
                            Err(_) => {
                                return Err(self.error_at(
                                    Some(&this),
                                    format!("invalid type for {}", which),
                                ));
                            }
                        };
                        let ret = if which == "alloc_array" {
                            if let Err(msg) = toks.accept(TokenKind::Comma) {
                                return Err(self.error_at(
                                    Some(&this),
                                    format!("alloc_array missing size expression: {}", msg),
                                ));
                            }
                            let count = match self.expr(toks) {
                                Ok(count) => count,
                                Err(_) => {
                                    return Err(self.error_at(
                                        Some(&this),
                                        "invalid size expression for alloc_array".to_string(),
                                    ));
                                }
                            };
                            self.node(
                                &this,
                                NodeKind::AllocArray {
                                    kind: ak,
                                    count: Box::new(count),
                                },
                            )
                        } else {
                            self.node(&this, NodeKind::Alloc { kind: ak })
                        };
                        if toks.accept(TokenKind::RParen).is_err() {
                            return Err(self
                                .error_at(Some(&this), format!("{} missing ')'", which)));
                        }
                        Ok(ret)
                    }
                    _ => {
                        if is_reserved_word(iv) {
                            // Not consumed: a reserved word here usually
                            // means a declaration, which the statement
                            // grammar retries.
                            return Err(ParseFail::Soft);
                        }
                        toks.pop();
                        Ok(self.node(&this, NodeKind::Variable(this.text.clone())))
                    }
                }
            }
            TokenKind::True | TokenKind::False => {
                toks.pop();
                Ok(self.node(&this, NodeKind::Bool(this.kind == TokenKind::True)))
            }
            TokenKind::Null => {
                toks.pop();
                Ok(self.node(&this, NodeKind::Null))
            }
            TokenKind::StrLit => {
                toks.pop();
                Ok(self.node(&this, NodeKind::StrLit(this.text.clone())))
            }
            TokenKind::ChrLit => {
                toks.pop();
                let ch = this.text.chars().next().expect("empty character literal");
                Ok(self.node(&this, NodeKind::ChrLit(ch)))
            }
            _ => Err(self.error_at(
                Some(&this),
                format!("invalid expression atom: {:?}", this.kind.to_string()),
            )),
        }
    }

    fn expr_parse(&mut self, toks: &mut TokenStream, minprec: u32) -> PResult<Node> {
        let mut lhs = self.expr_atom(toks)?;
        loop {
            let Some(op) = toks.peek().cloned() else {
                break;
            };
            let Some(binop) = binop_for(op.kind) else {
                break;
            };
            // Calls and subscripts are maximally greedy postfix operators;
            // everything else is vanilla precedence climbing.
            match op.kind {
                TokenKind::LBrack => {
                    toks.pop();
                    let index = self.expr_parse(toks, 0)?;
                    if let Err(msg) = toks.accept(TokenKind::RBrack) {
                        return Err(self.error_at(
                            Some(&op),
                            format!("unbalanced array subscript: {}", msg),
                        ));
                    }
                    lhs = self.node(
                        &op,
                        NodeKind::OpBinary {
                            op: binop,
                            left: Box::new(lhs),
                            right: Box::new(index),
                        },
                    );
                    continue;
                }
                TokenKind::LParen => {
                    toks.pop();
                    let mut args = Vec::new();
                    if toks.accept(TokenKind::RParen).is_err() {
                        loop {
                            if toks.peek().is_none() {
                                return Err(self.error_at(
                                    Some(&op),
                                    "unbalanced parentheses in function call".to_string(),
                                ));
                            }
                            let arg = match self.expr_parse(toks, 0) {
                                Ok(arg) => arg,
                                Err(_) => {
                                    return Err(self.error_at(
                                        Some(&op),
                                        "invalid function argument".to_string(),
                                    ));
                                }
                            };
                            args.push(arg);
                            if toks.accept(TokenKind::Comma).is_ok() {
                                continue;
                            } else if toks.accept(TokenKind::RParen).is_ok() {
                                break;
                            } else {
                                return Err(self.error_at(
                                    Some(&op),
                                    "unbalanced parentheses in function call".to_string(),
                                ));
                            }
                        }
                    }
                    let argsnode = self.node(&op, NodeKind::Args(args));
                    lhs = self.node(
                        &op,
                        NodeKind::OpBinary {
                            op: binop,
                            left: Box::new(lhs),
                            right: Box::new(argsnode),
                        },
                    );
                    continue;
                }
                _ => {}
            }
            let prec = prec_binary(op.kind);
            if prec < minprec {
                break;
            }
            let nextminprec = if is_left_assoc(op.kind) { prec + 1 } else { prec };
            toks.pop();
            let rhs = self.expr_parse(toks, nextminprec)?;
            lhs = self.node(
                &op,
                NodeKind::OpBinary {
                    op: binop,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
            );
        }
        Ok(lhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeTags;
    use crate::lexer::lex;

    fn parse_expr(input: &str) -> (PResult<Node>, Parser) {
        let (mut toks, lexerrs) = lex("<test>", input);
        assert!(lexerrs.is_empty(), "lex errors: {:?}", lexerrs);
        let mut parser = Parser::new(NodeTags::disabled_shared());
        let got = parser.expr(&mut toks);
        (got, parser)
    }

    fn sexpr(input: &str) -> String {
        let (got, parser) = parse_expr(input);
        let node = got.unwrap_or_else(|e| panic!("{:?}: {:?}", e, parser.errors()));
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        format!("{}", node)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(sexpr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(sexpr("1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(sexpr("1 + 2 - 3"), "(- (+ 1 2) 3)");
        assert_eq!(sexpr("a || b && c"), "(|| a (&& b c))");
        assert_eq!(sexpr("a | b ^ c & d"), "(| a (^ b (& c d)))");
        assert_eq!(sexpr("1 << 2 + 3"), "(<< 1 (+ 2 3))");
        assert_eq!(sexpr("a == b < c"), "(== a (< b c))");
    }

    #[test]
    fn test_unary_binds_tight() {
        assert_eq!(sexpr("-a + b"), "(+ (u- a) b)");
        assert_eq!(sexpr("-a * b"), "(* (u- a) b)");
        assert_eq!(sexpr("!!a"), "(! (! a))");
        assert_eq!(sexpr("~-a"), "(~ (u- a))");
    }

    #[test]
    fn test_deref_takes_postfix_chain() {
        // A prefix '*' binds to the result of the whole postfix chain.
        assert_eq!(sexpr("*s.f"), "(* (. s f))");
        assert_eq!(sexpr("(*s).f"), "(. (* s) f)");
        assert_eq!(sexpr("*a->b.c"), "(* (. (-> a b) c))");
    }

    #[test]
    fn test_struct_access_left_assoc() {
        assert_eq!(sexpr("stru->element.other"), "(. (-> stru element) other)");
    }

    #[test]
    fn test_funcall() {
        assert_eq!(sexpr("fun() + 1"), "(+ (CALL fun []) 1)");
        assert_eq!(sexpr("fun(x)"), "(CALL fun [x])");
        assert_eq!(sexpr("fun(1+2, x)"), "(CALL fun [(+ 1 2) x])");
        assert_eq!(
            sexpr("one(two(1, three(3+4)), 2)"),
            "(CALL one [(CALL two [1 (CALL three [(+ 3 4)])]) 2])"
        );
        assert_eq!(sexpr("(*ptr)(1, 2)"), "(CALL (* ptr) [1 2])");
    }

    #[test]
    fn test_array_subscript() {
        assert_eq!(sexpr("(arr)[a/b]"), "([] arr (/ a b))");
        assert_eq!(sexpr("a[0][1]"), "([] ([] a 0) 1)");
    }

    #[test]
    fn test_ternary_parses_as_two_binops() {
        assert_eq!(sexpr("c ? 1 : 0"), "(? c (: 1 0))");
        // Right associativity keeps nested ternaries parseable.
        assert_eq!(sexpr("a ? 1 : b ? 2 : 3"), "(? a (: 1 (? b (: 2 3))))");
    }

    #[test]
    fn test_literals() {
        assert_eq!(sexpr("true"), "#t");
        assert_eq!(sexpr("false"), "#f");
        assert_eq!(sexpr("NULL"), "NULL");
        assert_eq!(sexpr("\"jep\""), "\"jep\"");
        assert_eq!(sexpr("'x'"), "'x'");
        assert_eq!(sexpr("0x10"), "16");
        assert_eq!(sexpr("0"), "0");
    }

    #[test]
    fn test_casts() {
        assert_eq!(sexpr("(int)x"), "(cast (kind \"Int\") x)");
        assert_eq!(sexpr("(int *)x"), "(cast (kind \"Int*\") x)");
        assert_eq!(sexpr("(void*)a"), "(cast (kind \"Void*\") a)");
        // Not a type inside the parens: grouped expression.
        assert_eq!(sexpr("(a)"), "a");
        assert_eq!(sexpr("(a + b) * 2"), "(* (+ a b) 2)");
    }

    #[test]
    fn test_cast_binds_atom() {
        assert_eq!(sexpr("(int)x + 1"), "(+ (cast (kind \"Int\") x) 1)");
        assert_eq!(sexpr("(int *)*p"), "(cast (kind \"Int*\") (* p))");
    }

    #[test]
    fn test_alloc_forms() {
        assert_eq!(sexpr("alloc(int)"), "(alloc (kind \"Int\"))");
        assert_eq!(
            sexpr("alloc_array(int, 1+2)"),
            "(alloc-array (kind \"Int\") (+ 1 2))"
        );
    }

    #[test]
    fn test_int_overflow_is_an_error() {
        let (got, parser) = parse_expr("2147483648");
        assert_eq!(got, Err(ParseFail::Hard));
        assert_eq!(parser.errors().len(), 1);
        assert!(format!("{}", parser.errors()[0]).contains("invalid integer"));
        // i32::MAX still parses.
        assert_eq!(sexpr("2147483647"), "2147483647");
    }

    #[test]
    fn test_reserved_word_fails_softly() {
        let (got, parser) = parse_expr("while");
        assert_eq!(got, Err(ParseFail::Soft));
        assert!(parser.errors().is_empty());
    }

    #[test]
    fn test_unbalanced_parens() {
        let (got, parser) = parse_expr("(a + b");
        assert_eq!(got, Err(ParseFail::Hard));
        assert!(!parser.errors().is_empty());
    }
}
