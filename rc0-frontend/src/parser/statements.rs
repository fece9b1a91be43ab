//! Statement parsing
//!
//! `simple_stmt` implements `<simple>`: since lvalues are a subset of
//! expressions, it parses any expression first and leaves lvalue
//! classification to the analyzer. Statement-level failures inside a block
//! resynchronize at the next `;` or `}`.

use crate::ast::{AsnOp, Node, NodeKind, UnOp};
use crate::lexer::{TokenKind, TokenStream};
use crate::parser::{PResult, ParseFail, Parser};

fn asnop_for(kind: TokenKind) -> Option<AsnOp> {
    match kind {
        TokenKind::Assign => Some(AsnOp::Plain),
        TokenKind::AssignPlus => Some(AsnOp::Add),
        TokenKind::AssignMinus => Some(AsnOp::Sub),
        TokenKind::AssignStar => Some(AsnOp::Mul),
        TokenKind::AssignSlash => Some(AsnOp::Div),
        TokenKind::AssignPercent => Some(AsnOp::Mod),
        TokenKind::AssignDLt => Some(AsnOp::ShiftL),
        TokenKind::AssignDGt => Some(AsnOp::ShiftR),
        TokenKind::AssignAmpersand => Some(AsnOp::And),
        TokenKind::AssignHat => Some(AsnOp::Xor),
        TokenKind::AssignPipe => Some(AsnOp::Or),
        _ => None,
    }
}

fn suffix_for(kind: TokenKind) -> Option<UnOp> {
    match kind {
        TokenKind::DPlus => Some(UnOp::AddOneSuffix),
        TokenKind::DMinus => Some(UnOp::SubOneSuffix),
        _ => None,
    }
}

impl Parser {
    /// ```text
    /// <simple> = <tp> <vid> [ "=" <exp> ]
    ///          | <exp> <asnop> <exp>
    ///          | <exp> "++"
    ///          | <exp> "--"
    ///          | <exp>
    /// ```
    pub fn simple_stmt(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        match self.expr(toks) {
            Ok(lv) => {
                let Some(next) = toks.peek().cloned() else {
                    return Ok(lv);
                };
                if let Some(ak) = asnop_for(next.kind) {
                    toks.pop();
                    let rv = match self.expr(toks) {
                        Ok(rv) => rv,
                        Err(_) => {
                            return Err(
                                self.error_at(Some(&next), "invalid rvalue".to_string())
                            );
                        }
                    };
                    return Ok(self.node(
                        &first,
                        NodeKind::OpAssign {
                            op: ak,
                            target: Box::new(lv),
                            value: Some(Box::new(rv)),
                        },
                    ));
                }
                if let Some(su) = suffix_for(next.kind) {
                    toks.pop();
                    return Ok(self.node(
                        &next,
                        NodeKind::OpUnary {
                            op: su,
                            operand: Box::new(lv),
                        },
                    ));
                }
                // A plain expression-looking thing.
                Ok(lv)
            }
            Err(exprerr) => {
                // <tp> <vid> [ "=" <exp> ]
                if let Ok(vd) = self.var_decl(toks) {
                    let mut value = None;
                    if toks.peek().is_some_and(|t| t.kind == TokenKind::Assign) {
                        toks.pop();
                        match self.expr(toks) {
                            Ok(av) => value = Some(Box::new(av)),
                            Err(_) => {
                                return Err(self.error_at(
                                    Some(&first),
                                    "erroneous variable assignment".to_string(),
                                ));
                            }
                        }
                    }
                    let target = Node::new(vd.id, NodeKind::VarDecl(vd));
                    return Ok(self.node(
                        &first,
                        NodeKind::OpAssign {
                            op: AsnOp::Plain,
                            target: Box::new(target),
                            value,
                        },
                    ));
                }
                // Prefer the expression failure if nothing else matched.
                Err(exprerr)
            }
        }
    }

    /// A `{ ... }` block; statement-level errors resynchronize and parsing
    /// continues so the block surfaces every broken statement.
    pub fn block(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if first.kind != TokenKind::LCurly {
            return Err(ParseFail::Soft);
        }
        toks.pop();
        let mut stmts = Vec::new();
        let mut inerror = false;
        while toks.peek().is_some_and(|t| t.kind != TokenKind::RCurly) {
            match self.stmt(toks) {
                Ok(stmt) => stmts.push(stmt),
                Err(_) => {
                    inerror = true;
                    toks.find(&[TokenKind::Semicolon, TokenKind::RCurly]);
                    toks.pop();
                }
            }
        }
        if toks.accept(TokenKind::RCurly).is_err() {
            return Err(self.error_at(Some(&first), "block not terminated".to_string()));
        }
        if inerror {
            // The broken statements have already been reported.
            return Err(ParseFail::Soft);
        }
        Ok(self.node(&first, NodeKind::Block(stmts)))
    }

    pub fn stmt(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if first.kind == TokenKind::LCurly {
            return self.block(toks);
        }
        let keyword = if first.kind == TokenKind::Id {
            first.text.as_str()
        } else {
            ""
        };
        match keyword {
            "if" => {
                toks.pop();
                if toks.accept(TokenKind::LParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), "`if' condition missing '('".to_string())
                    );
                }
                let cond = self.expr(toks)?;
                if toks.accept(TokenKind::RParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), "`if' condition missing ')'".to_string())
                    );
                }
                let then = self.stmt(toks)?;
                let mut otherwise = None;
                if toks
                    .peek()
                    .is_some_and(|t| t.kind == TokenKind::Id && t.text == "else")
                {
                    toks.pop();
                    otherwise = Some(Box::new(self.stmt(toks)?));
                }
                Ok(self.node(
                    &first,
                    NodeKind::If {
                        cond: Box::new(cond),
                        then: Box::new(then),
                        otherwise,
                    },
                ))
            }
            "while" => {
                toks.pop();
                if toks.accept(TokenKind::LParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), "`while' condition missing '('".to_string())
                    );
                }
                let cond = self.expr(toks)?;
                if toks.accept(TokenKind::RParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), "`while' condition missing ')'".to_string())
                    );
                }
                let body = self.stmt(toks)?;
                Ok(self.node(
                    &first,
                    NodeKind::While {
                        cond: Box::new(cond),
                        body: Box::new(body),
                    },
                ))
            }
            "for" => {
                toks.pop();
                if toks.accept(TokenKind::LParen).is_err() {
                    return Err(self.error_at(Some(&first), "`for' missing '('".to_string()));
                }
                let init = self.simple_stmt(toks)?;
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(self.error_at(
                        Some(&first),
                        "`for' missing ';' after initializer".to_string(),
                    ));
                }
                let cond = self.expr(toks)?;
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(self.error_at(
                        Some(&first),
                        "`for' missing ';' after condition".to_string(),
                    ));
                }
                let step = self.simple_stmt(toks)?;
                if toks.accept(TokenKind::RParen).is_err() {
                    return Err(self.error_at(Some(&first), "`for' missing ')'".to_string()));
                }
                let body = self.stmt(toks)?;
                Ok(self.node(
                    &first,
                    NodeKind::For {
                        init: Box::new(init),
                        cond: Box::new(cond),
                        step: Box::new(step),
                        body: Box::new(body),
                    },
                ))
            }
            "return" => {
                toks.pop();
                if toks.accept(TokenKind::Semicolon).is_ok() {
                    return Ok(self.node(&first, NodeKind::Return(None)));
                }
                let expr = match self.expr(toks) {
                    Ok(expr) => expr,
                    Err(_) => {
                        return Err(self
                            .error_at(Some(&first), "invalid return expression".to_string()));
                    }
                };
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(self.error_at(Some(&first), "return missing ';'".to_string()));
                }
                Ok(self.node(&first, NodeKind::Return(Some(Box::new(expr)))))
            }
            "assert" | "error" => {
                let which = keyword.to_string();
                toks.pop();
                if toks.accept(TokenKind::LParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), format!("{} missing '('", which))
                    );
                }
                let expr = match self.expr(toks) {
                    Ok(expr) => expr,
                    Err(_) => {
                        return Err(self.error_at(
                            Some(&first),
                            format!("invalid {} statement", which),
                        ));
                    }
                };
                if toks.accept(TokenKind::RParen).is_err() {
                    return Err(
                        self.error_at(Some(&first), format!("{} statement missing ')'", which))
                    );
                }
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(
                        self.error_at(Some(&first), format!("{} statement missing ';'", which))
                    );
                }
                let kind = match which.as_str() {
                    "assert" => NodeKind::Assert(Box::new(expr)),
                    _ => NodeKind::Error(Box::new(expr)),
                };
                Ok(self.node(&first, kind))
            }
            "break" => {
                toks.pop();
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(
                        self.error_at(Some(&first), "break statement missing ';'".to_string())
                    );
                }
                Ok(self.node(&first, NodeKind::Break))
            }
            "continue" => {
                toks.pop();
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(self
                        .error_at(Some(&first), "continue statement missing ';'".to_string()));
                }
                Ok(self.node(&first, NodeKind::Continue))
            }
            _ => {
                let ss = self.simple_stmt(toks)?;
                if toks.accept(TokenKind::Semicolon).is_err() {
                    return Err(
                        self.error_at(Some(&first), "statement missing ';'".to_string())
                    );
                }
                Ok(ss)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeTags;
    use crate::lexer::lex;

    fn parse_stmt(input: &str) -> (PResult<Node>, Parser) {
        let (mut toks, lexerrs) = lex("<test>", input);
        assert!(lexerrs.is_empty(), "lex errors: {:?}", lexerrs);
        let mut parser = Parser::new(NodeTags::disabled_shared());
        let got = parser.stmt(&mut toks);
        (got, parser)
    }

    fn sexpr(input: &str) -> String {
        let (got, parser) = parse_stmt(input);
        let node = got.unwrap_or_else(|e| panic!("{:?}: {:?}", e, parser.errors()));
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        format!("{}", node)
    }

    #[test]
    fn test_if_else() {
        assert_eq!(sexpr("if (a) 1; else 2;"), "(if a 1 2)");
        assert_eq!(sexpr("if (a) 1;"), "(if a 1 'noelse)");
        assert_eq!(
            sexpr("if (a) { 1; } else { 2; }"),
            "(if a (begin 1) (begin 2))"
        );
    }

    #[test]
    fn test_dangling_else() {
        assert_eq!(
            sexpr("if (a) if (b) 1; else 2;"),
            "(if a (if b 1 2) 'noelse)"
        );
    }

    #[test]
    fn test_while() {
        assert_eq!(sexpr("while (a < 10) a++;"), "(while (< a 10) (s++ a))");
    }

    #[test]
    fn test_for() {
        assert_eq!(
            sexpr("for (int i = 0; i < 10; i++) { x; }"),
            "(for (assign= (vardecl \"i\" (kind \"Int\")) 0) (< i 10) (s++ i) (begin x))"
        );
    }

    #[test]
    fn test_returns() {
        assert_eq!(sexpr("return;"), "(return)");
        assert_eq!(sexpr("return a + 1;"), "(return (+ a 1))");
    }

    #[test]
    fn test_assert_error() {
        assert_eq!(sexpr("assert(a == b);"), "(assert (== a b))");
        assert_eq!(sexpr("error(\"boom\");"), "(error \"boom\")");
    }

    #[test]
    fn test_break_continue() {
        assert_eq!(sexpr("break;"), "(break)");
        assert_eq!(sexpr("continue;"), "(continue)");
    }

    #[test]
    fn test_vardecl_without_initializer() {
        assert_eq!(sexpr("int *p;"), "(assign= (vardecl \"p\" (kind \"Int*\")) nil)");
    }

    #[test]
    fn test_missing_semicolon() {
        let (got, parser) = parse_stmt("a = 1");
        assert_eq!(got, Err(ParseFail::Hard));
        assert!(format!("{}", parser.errors()[0]).contains("statement missing ';'"));
    }

    #[test]
    fn test_block_collects_several_errors() {
        let (got, parser) = parse_stmt("{ 1 +; a = 1; 2 *; b = 2; }");
        assert!(got.is_err());
        // Both broken statements produced a diagnostic.
        assert!(parser.errors().len() >= 2, "{:?}", parser.errors());
    }
}
