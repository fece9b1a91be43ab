//! `#use` directive handling
//!
//! An include is a recursive invocation of the whole lexer+parser pipeline
//! on the referenced file. The produced `DirectiveUse` node records
//! whether the inner run succeeded, the nodes and typedef names it
//! yielded, and any inner errors; `Parser::handle_use` then decides how to
//! merge them into the outer parse.

use crate::ast::{Node, NodeKind};
use crate::lexer::{lex, TokenKind, TokenStream};
use crate::parser::{PResult, Parser};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::rc::Rc;

impl Parser {
    pub fn directive_use(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let what = toks
            .peek()
            .cloned()
            .expect("directive_use without a head token");
        let path = match what.kind {
            TokenKind::UseStrLit => self.node(&what, NodeKind::StrLit(what.text.clone())),
            TokenKind::UseLibLit => self.node(&what, NodeKind::LibLit(what.text.clone())),
            _ => {
                return Err(self.error_at(
                    Some(&what),
                    format!("expecting a string or library literal for #use, got {}", what),
                ));
            }
        };
        toks.pop();

        debug!("#use: reading {:?}", what.text);
        let mut success = true;
        let mut errors = Vec::new();
        let mut nodes = Vec::new();
        let mut typedefs = HashSet::new();
        match fs::read_to_string(&what.text) {
            Err(err) => {
                success = false;
                errors.push(err.into());
            }
            Ok(src) => {
                let (mut ntoks, lexerrs) = lex(&what.text, &src);
                let mut inner = Parser::with_file(&what.text, Rc::clone(&self.tags));
                let parsed = inner.parse(&mut ntoks);
                success = lexerrs.is_empty() && parsed.is_ok();
                errors.extend(lexerrs);
                errors.extend(inner.errors);
                nodes = inner.nodes;
                typedefs = inner.typedefs;
            }
        }
        Ok(self.node(
            &what,
            NodeKind::DirectiveUse {
                path: Box::new(path),
                success,
                nodes,
                typedefs,
                errors,
            },
        ))
    }
}
