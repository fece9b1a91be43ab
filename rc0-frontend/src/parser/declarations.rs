//! Declaration and definition parsing: variables, functions, structs and
//! typedefs

use crate::ast::{FunDecl, Node, NodeKind, VarDecl};
use crate::lexer::token::is_reserved_word;
use crate::lexer::{TokenKind, TokenStream};
use crate::parser::{PResult, ParseFail, Parser};

impl Parser {
    /// `<tp> <vid>`
    pub fn var_decl(&mut self, toks: &mut TokenStream) -> PResult<VarDecl> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        let kind = self.parse_type(toks)?;
        let next = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if next.kind != TokenKind::Id {
            return Err(self.error_at(
                Some(&first),
                format!(
                    "not a var declaration, expecting identifier, got {}",
                    next
                ),
            ));
        }
        if is_reserved_word(&next.text) {
            return Err(self.error_at(
                Some(&next),
                format!(
                    "reserved identifier {:?} for variable declaration",
                    next.text
                ),
            ));
        }
        toks.pop();
        Ok(VarDecl {
            id: self.tag(&first),
            kind,
            name: next.text,
        })
    }

    /// A top-level `<tp> ...`: either a struct forward declaration, a
    /// struct definition, or the `<tp> <vid>` head shared by global
    /// variable declarations and function declarations/definitions.
    pub fn top_var_decl(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        let kind = self.parse_type(toks)?;
        let next = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if kind.base == crate::ast::BaseKind::Struct
            && kind.pointer_level == 0
            && kind.array_level == 0
            && next.kind == TokenKind::Semicolon
        {
            toks.pop();
            return Ok(self.node(&first, NodeKind::StructForwardDecl(kind.name)));
        }
        if kind.base == crate::ast::BaseKind::Struct && next.kind == TokenKind::LCurly {
            return self.struct_def(toks, &kind.name);
        }
        if next.kind != TokenKind::Id {
            return Err(self.error_at(
                Some(&first),
                format!(
                    "not a var declaration or a struct definition, got {}",
                    next
                ),
            ));
        }
        if is_reserved_word(&next.text) {
            return Err(self.error_at(
                Some(&next),
                format!(
                    "reserved identifier {:?} for variable declaration",
                    next.text
                ),
            ));
        }
        toks.pop();
        let vd = VarDecl {
            id: self.tag(&first),
            kind,
            name: next.text,
        };
        Ok(Node::new(vd.id, NodeKind::VarDecl(vd)))
    }

    /// The parenthesized parameter list of a function declaration; the
    /// opening `(` has already been consumed.
    pub fn func_params(&mut self, toks: &mut TokenStream) -> PResult<Vec<VarDecl>> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        let mut params = Vec::new();
        if toks.accept(TokenKind::RParen).is_ok() {
            return Ok(params);
        }
        loop {
            match self.var_decl(toks) {
                Ok(pdecl) => params.push(pdecl),
                Err(_) => {
                    return Err(self.error_at(
                        Some(&first),
                        "unexpected parameter list contents".to_string(),
                    ));
                }
            }
            match toks.peek().map(|t| t.kind) {
                None => {
                    return Err(self
                        .error_at(Some(&first), "unexpected end of parameter list".to_string()));
                }
                Some(TokenKind::RParen) => break,
                Some(TokenKind::Comma) => {
                    toks.pop();
                }
                Some(_) => {}
            }
        }
        if toks.accept(TokenKind::RParen).is_err() {
            return Err(self.error_at(Some(&first), "unterminated parameter list".to_string()));
        }
        Ok(params)
    }

    /// Continue a `<tp> <vid>` head into a function declaration
    pub fn func_decl(&mut self, toks: &mut TokenStream, vd: &VarDecl) -> PResult<FunDecl> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if toks.accept(TokenKind::LParen).is_err() {
            return Err(self.error_at(Some(&first), "invalid function declaration".to_string()));
        }
        let params = self.func_params(toks)?;
        Ok(FunDecl {
            id: self.tag(&first),
            name: vd.name.clone(),
            returns: vd.kind.clone(),
            params,
        })
    }

    /// Function declaration (`;`-terminated) or definition (block body)
    pub fn func_decl_def(&mut self, toks: &mut TokenStream, vd: VarDecl) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        let fd = self.func_decl(toks, &vd)?;
        if toks.accept(TokenKind::Semicolon).is_ok() {
            return Ok(Node::new(fd.id, NodeKind::FunDecl(fd)));
        }
        match self.block(toks) {
            Ok(body) => Ok(self.node(
                &first,
                NodeKind::FunDef {
                    decl: fd,
                    body: Box::new(body),
                },
            )),
            Err(_) => Err(self.error_at(
                Some(&first),
                format!("invalid function body for {:?}", fd.name),
            )),
        }
    }

    /// Struct definition body; the `struct <sid>` head has been consumed
    /// and the current token is `{`.
    pub fn struct_def(&mut self, toks: &mut TokenStream, name: &str) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if first.kind != TokenKind::LCurly {
            return Err(ParseFail::Soft);
        }
        toks.pop();
        let mut members = Vec::new();
        while toks.peek().is_some_and(|t| t.kind != TokenKind::RCurly) {
            let cur = toks.peek().cloned();
            let mk = match self.parse_type(toks) {
                Ok(mk) => mk,
                Err(_) => {
                    return Err(self.error_at(
                        cur.as_ref(),
                        "expecting struct member type".to_string(),
                    ));
                }
            };
            let mid = toks.peek().cloned();
            let mid = match mid {
                Some(mid) if mid.kind == TokenKind::Id => mid,
                got => {
                    return Err(self.error_at(
                        cur.as_ref(),
                        format!("expecting struct member name, got {:?}", got.map(|t| t.text)),
                    ));
                }
            };
            if is_reserved_word(&mid.text) {
                return Err(self.error_at(
                    Some(&mid),
                    format!("struct member {:?} is a reserved identifier", mid.text),
                ));
            }
            toks.pop();
            if toks.accept(TokenKind::Semicolon).is_err() {
                return Err(self.error_at(
                    cur.as_ref(),
                    "struct definition member missing ';'".to_string(),
                ));
            }
            members.push(VarDecl {
                id: self.tag(&mid),
                kind: mk,
                name: mid.text,
            });
        }
        if toks.accept(TokenKind::RCurly).is_err() {
            return Err(
                self.error_at(Some(&first), "struct definition missing '}'".to_string())
            );
        }
        if members.is_empty() {
            return Err(self.error_at(Some(&first), "struct without any members".to_string()));
        }
        if toks.accept(TokenKind::Semicolon).is_err() {
            return Err(
                self.error_at(Some(&first), "struct definition missing ';'".to_string())
            );
        }
        Ok(self.node(
            &first,
            NodeKind::Struct {
                name: name.to_string(),
                members,
            },
        ))
    }

    /// `typedef <tp> <aid>;` or the function-pointer form
    /// `typedef <tp> <aid>(<params>);`
    pub fn typedef_def(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        if first.kind != TokenKind::Id || first.text != "typedef" {
            return Err(ParseFail::Soft);
        }
        toks.pop();
        let tk = match self.parse_type(toks) {
            Ok(tk) => tk,
            Err(_) => {
                return Err(self.error_at(Some(&first), "invalid typedef kind".to_string()));
            }
        };
        let aidtok = toks.peek().cloned();
        let aidtok = match aidtok {
            Some(t) if t.kind == TokenKind::Id => t,
            got => {
                return Err(self.error_at(
                    Some(&first),
                    format!("expecting typedef identifier, got {:?}", got.map(|t| t.text)),
                ));
            }
        };
        let aid = aidtok.text.clone();
        if is_reserved_word(&aid) {
            return Err(self.error_at(
                Some(&aidtok),
                format!("typedef identifier {:?} is reserved", aid),
            ));
        }
        toks.pop();
        // A parenthesized parameter list makes it a typedef'd function.
        let kind = if toks.accept(TokenKind::LParen).is_ok() {
            let params = self.func_params(toks)?;
            NodeKind::TypedefFunc {
                name: aid.clone(),
                returns: tk,
                params,
            }
        } else {
            NodeKind::Typedef {
                name: aid.clone(),
                kind: tk,
            }
        };
        if toks.accept(TokenKind::Semicolon).is_err() {
            return Err(self.error_at(Some(&aidtok), "typedef missing ';'".to_string()));
        }
        if let Err(msg) = self.add_typedef(&aid) {
            return Err(self.error_at(Some(&aidtok), format!("invalid typedef: {}", msg)));
        }
        Ok(self.node(&first, kind))
    }
}
