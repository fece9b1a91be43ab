//! C0 recursive descent parser
//!
//! Top-level items parse by recursive descent; expressions use precedence
//! climbing (see `expressions`). The parser keeps a typedef name table so
//! the expression grammar can tell a cast `(T) e` from a grouped `(e)`.
//!
//! Errors do not abort the parse: on a failed item or statement the token
//! stream is resynchronized at the next `;` or `}` and parsing continues,
//! so one run collects as many diagnostics as possible.

pub mod declarations;
pub mod directive;
pub mod expressions;
pub mod statements;
pub mod types;

use crate::ast::{Node, NodeKind, SharedNodeTags};
use crate::lexer::{Token, TokenKind, TokenStream};
use rc0_common::{CompilerError, SourceLocation};
use std::collections::HashSet;

/// How a parsing function failed
///
/// `Soft` marks a speculative attempt that did not pan out (for instance
/// trying a type in cast position); nothing is recorded and the caller is
/// free to try another production. `Hard` means a diagnostic has already
/// been pushed onto the parser's error list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFail {
    Soft,
    Hard,
}

pub type PResult<T> = Result<T, ParseFail>;

/// The whole parse met with at least one error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFailed;

/// C0 parser
pub struct Parser {
    pub(crate) file: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) errors: Vec<CompilerError>,
    pub(crate) typedefs: HashSet<String>,
    pub(crate) tags: SharedNodeTags,
}

impl Parser {
    pub fn new(tags: SharedNodeTags) -> Self {
        Self::with_file("<stdin>", tags)
    }

    pub fn with_file(file: &str, tags: SharedNodeTags) -> Self {
        Self {
            file: file.to_string(),
            nodes: Vec::new(),
            errors: Vec::new(),
            typedefs: HashSet::new(),
            tags,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn errors(&self) -> &[CompilerError] {
        &self.errors
    }

    pub fn typedefs(&self) -> &HashSet<String> {
        &self.typedefs
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Record a diagnostic against a token and fail hard
    pub(crate) fn error_at(&mut self, tok: Option<&Token>, message: String) -> ParseFail {
        let location = tok
            .map(|t| t.span.start)
            .unwrap_or_else(SourceLocation::dummy);
        self.errors
            .push(CompilerError::parse(&self.file, location, message));
        ParseFail::Hard
    }

    pub(crate) fn tag(&self, tok: &Token) -> crate::ast::NodeId {
        self.tags.borrow_mut().tag(tok)
    }

    pub(crate) fn node(&self, tok: &Token, kind: NodeKind) -> Node {
        Node::new(self.tag(tok), kind)
    }

    pub(crate) fn is_typedef(&self, name: &str) -> bool {
        self.typedefs.contains(name)
    }

    /// Introduce a typedef name; the message names the reason on failure.
    pub(crate) fn add_typedef(&mut self, name: &str) -> Result<(), String> {
        if crate::lexer::token::is_reserved_word(name) {
            return Err(format!("typedef name {:?} is reserved", name));
        }
        if !self.typedefs.insert(name.to_string()) {
            return Err(format!("typedef {:?} already defined", name));
        }
        Ok(())
    }

    /// Parse a whole compile unit from the token stream. The forest is
    /// available through `nodes()` whether or not errors were met.
    pub fn parse(&mut self, toks: &mut TokenStream) -> Result<(), ParseFailed> {
        self.nodes.clear();
        self.errors.clear();
        while toks.peek().is_some() {
            let cur = toks.peek().cloned();
            match self.global_decl_def(toks) {
                Ok(node) => {
                    let is_use = matches!(node.kind, NodeKind::DirectiveUse { .. });
                    self.nodes.push(node);
                    if is_use {
                        self.handle_use(cur.as_ref());
                    }
                }
                Err(_) => {
                    // Rewind until the next ';' or '}' and pop it; this
                    // gives us a better chance to catch multiple errors.
                    toks.find(&[TokenKind::Semicolon, TokenKind::RCurly]);
                    toks.pop();
                }
            }
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ParseFailed)
        }
    }

    /// Splice a successfully parsed `#use` into our own state: imported
    /// nodes join the forest, imported typedef names join the table and
    /// inner errors propagate to our error list.
    fn handle_use(&mut self, tok: Option<&Token>) {
        // Pull the directive's contents out first; the node itself stays in
        // the forest as a record of the import.
        let (success, inner_errors, imported_typedefs, path_str) = {
            let Some(Node {
                kind:
                    NodeKind::DirectiveUse {
                        path,
                        success,
                        typedefs,
                        errors,
                        ..
                    },
                ..
            }) = self.nodes.last_mut()
            else {
                panic!("handle_use without a use directive");
            };
            (
                *success,
                std::mem::take(errors),
                std::mem::take(typedefs),
                format!("{}", path),
            )
        };
        if !success {
            self.errors.extend(inner_errors);
            self.error_at(tok, format!("errors in #use {}", path_str));
            return;
        }
        let mut inerr = false;
        for td in imported_typedefs {
            if let Err(msg) = self.add_typedef(&td) {
                inerr = true;
                self.error_at(tok, msg);
            }
        }
        let imported = match self.nodes.last_mut() {
            Some(Node {
                kind: NodeKind::DirectiveUse { nodes, .. },
                ..
            }) => std::mem::take(nodes),
            _ => unreachable!(),
        };
        if !inerr {
            self.nodes.extend(imported);
        }
    }

    /// Top-level items: `#use` directive, typedef, struct forward
    /// declaration or definition, or a variable/function declaration or
    /// definition.
    pub fn global_decl_def(&mut self, toks: &mut TokenStream) -> PResult<Node> {
        let first = toks.peek().cloned().ok_or(ParseFail::Soft)?;
        match first.kind {
            TokenKind::UseLibLit | TokenKind::UseStrLit => self.directive_use(toks),
            TokenKind::Id => {
                if first.text == "typedef" {
                    return self.typedef_def(toks);
                }
                match self.top_var_decl(toks) {
                    Ok(node) => match node.kind {
                        NodeKind::StructForwardDecl(_) | NodeKind::Struct { .. } => Ok(node),
                        NodeKind::VarDecl(vd) => {
                            // A terminating ';' makes it a global variable
                            // declaration; parens continue into a function
                            // declaration or definition.
                            if toks.accept(TokenKind::Semicolon).is_ok() {
                                return Ok(Node::new(vd.id, NodeKind::VarDecl(vd)));
                            }
                            match self.func_decl_def(toks, vd) {
                                Ok(fd) => Ok(fd),
                                Err(_) => Err(self.error_at(
                                    Some(&first),
                                    "invalid function definition/declaration".to_string(),
                                )),
                            }
                        }
                        other => panic!("unrecognized top var decl result: {:?}", other),
                    },
                    Err(ParseFail::Hard) => Err(ParseFail::Hard),
                    Err(ParseFail::Soft) => {
                        Err(self.error_at(Some(&first), "invalid statement".to_string()))
                    }
                }
            }
            _ => Err(self.error_at(
                Some(&first),
                format!("unexpected statement token: {}", first),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseKind, BinOp, Kind, NodeTags};
    use crate::lexer::lex;

    fn parse_all(input: &str) -> (Vec<Node>, Vec<CompilerError>) {
        let (mut toks, lexerrs) = lex("<test>", input);
        assert!(lexerrs.is_empty(), "lex errors: {:?}", lexerrs);
        let mut parser = Parser::new(NodeTags::new_shared());
        let _ = parser.parse(&mut toks);
        (parser.nodes, parser.errors)
    }

    #[test]
    fn test_function_definition() {
        let (nodes, errs) = parse_all("int main() { return 42; }");
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            format!("{}", nodes[0]),
            "(fundef (fundecl \"main\" (kind \"Int\") ()) (begin (return 42)))"
        );
    }

    #[test]
    fn test_function_declaration() {
        let (nodes, errs) = parse_all("int twice(int a);");
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(
            format!("{}", nodes[0]),
            "(fundecl \"twice\" (kind \"Int\") ((vardecl \"a\" (kind \"Int\"))))"
        );
    }

    #[test]
    fn test_struct_forward_declaration() {
        let (nodes, errs) = parse_all("struct rakenne;");
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(format!("{}", nodes[0]), "(struct-fwd rakenne)");
    }

    #[test]
    fn test_struct_definition_needs_trailing_semicolon() {
        let (_, errs) = parse_all("struct s { int a; }");
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("missing ';'"));
    }

    #[test]
    fn test_typedef_then_cast() {
        let (nodes, errs) = parse_all(
            "typedef int myint; int f() { return (myint)3; }",
        );
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(nodes.len(), 2);
        assert!(format!("{}", nodes[1]).contains("(cast (kind \"typedef: myint\") 3)"));
    }

    #[test]
    fn test_error_resync_collects_several() {
        // Two broken top-level items and a good one; both errors surface
        // and the good item still parses.
        let (nodes, errs) = parse_all("int 3x(); ~~~; bool ok() { return true; }");
        assert!(errs.len() >= 2, "want >= 2 errors, got {:?}", errs);
        assert!(nodes
            .iter()
            .any(|n| format!("{}", n).contains("\"ok\"")));
    }

    #[test]
    fn test_kind_levels() {
        let (nodes, errs) = parse_all("struct s **[][] deep;");
        assert!(errs.is_empty(), "{:?}", errs);
        match &nodes[0].kind {
            NodeKind::VarDecl(vd) => {
                assert_eq!(vd.kind.base, BaseKind::Struct);
                assert_eq!(vd.kind.pointer_level, 2);
                assert_eq!(vd.kind.array_level, 2);
                assert_eq!(vd.kind.name, "s");
            }
            other => panic!("expected vardecl, got {:?}", other),
        }
    }

    #[test]
    fn test_structural_equality_with_tagging_disabled() {
        let parse_disabled = |input: &str| {
            let (mut toks, _) = lex("<test>", input);
            let mut parser = Parser::new(NodeTags::disabled_shared());
            parser.parse(&mut toks).unwrap();
            parser.into_nodes()
        };
        let a = parse_disabled("int f() { return 1 + 2; }");
        let b = parse_disabled("int  f( )  { return 1+2; }");
        assert_eq!(a, b);
    }

    #[test]
    fn test_typedef_redefinition_is_an_error() {
        let (_, errs) = parse_all("typedef int a; typedef bool a;");
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("already defined"));
    }

    #[test]
    fn test_expression_statement_shapes() {
        let (nodes, errs) = parse_all("int f() { a = 1; b += 2; c++; d; }");
        assert!(errs.is_empty(), "{:?}", errs);
        let body = format!("{}", nodes[0]);
        assert!(body.contains("(assign= a 1)"));
        assert!(body.contains("(assign+= b 2)"));
        assert!(body.contains("(s++ c)"));
    }

    #[test]
    fn test_chained_assignment_is_rejected() {
        let (_, errs) = parse_all("int f() { a = b = 1; }");
        assert!(!errs.is_empty());
    }

    fn kind_int() -> Kind {
        Kind::new(BaseKind::Int, 0, 0, "")
    }

    #[test]
    fn test_vardecl_with_initializer() {
        let (nodes, errs) = parse_all("int f() { int a = 1 + 2; }");
        assert!(errs.is_empty(), "{:?}", errs);
        let NodeKind::FunDef { body, .. } = &nodes[0].kind else {
            panic!("expected fundef");
        };
        let NodeKind::Block(stmts) = &body.kind else {
            panic!("expected block body");
        };
        let NodeKind::OpAssign { target, value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        match &target.kind {
            NodeKind::VarDecl(vd) => {
                assert_eq!(vd.name, "a");
                assert_eq!(vd.kind.base, kind_int().base);
            }
            other => panic!("expected vardecl target, got {:?}", other),
        }
        match &value.as_ref().unwrap().kind {
            NodeKind::OpBinary { op: BinOp::Add, .. } => {}
            other => panic!("expected addition initializer, got {:?}", other),
        }
    }
}
