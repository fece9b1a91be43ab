//! rc0 C0 Compiler - Frontend
//!
//! This crate provides the frontend components of the rc0 compiler:
//! - Lexer: tokenizes C0 source into the token alphabet
//! - Parser: recursive descent + precedence climbing into an AST forest
//! - AST: tagged node definitions and the id -> token registry
//! - Semantic analysis: scoping, lvalues, and type checking

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod types;

pub use ast::{BaseKind, Kind, Node, NodeId, NodeKind, NodeTags, SharedNodeTags};
pub use lexer::{lex, Lexer, Token, TokenKind, TokenStream};
pub use parser::Parser;
pub use semantic::{AnalyzeError, Analyzer, Results, SemanticErrorKind};
pub use types::{FunctionType, StructType, Type, TypeBase};

use rc0_common::CompilerError;
use std::collections::HashSet;
use std::rc::Rc;

/// A successfully parsed compile unit
#[derive(Debug)]
pub struct ParsedUnit {
    pub nodes: Vec<Node>,
    pub typedefs: HashSet<String>,
    pub tags: SharedNodeTags,
}

/// A parsed and analyzed compile unit
#[derive(Debug)]
pub struct AnalyzedUnit {
    pub nodes: Vec<Node>,
    pub tags: SharedNodeTags,
    pub results: Results,
}

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize source text (for debugging and the driver's `--tokens`)
    pub fn tokenize_source(file: &str, source: &str) -> (TokenStream, Vec<CompilerError>) {
        lex(file, source)
    }

    /// Lex and parse a compile unit. All lex and parse diagnostics are
    /// collected; any at all fails the unit.
    pub fn parse_source(file: &str, source: &str) -> Result<ParsedUnit, Vec<CompilerError>> {
        let tags = NodeTags::new_shared();
        let (mut toks, mut errors) = lex(file, source);
        let mut parser = Parser::with_file(file, Rc::clone(&tags));
        let parsed = parser.parse(&mut toks);
        errors.extend(parser.errors().iter().cloned());
        if parsed.is_err() || !errors.is_empty() {
            return Err(errors);
        }
        let typedefs = parser.typedefs().clone();
        Ok(ParsedUnit {
            nodes: parser.into_nodes(),
            typedefs,
            tags,
        })
    }

    /// Lex, parse and analyze a compile unit
    pub fn analyze_source(file: &str, source: &str) -> Result<AnalyzedUnit, Vec<CompilerError>> {
        let unit = Self::parse_source(file, source)?;
        let mut analyzer = Analyzer::new(file, Rc::clone(&unit.tags));
        let errors: Vec<CompilerError> = analyzer
            .analyze(&unit.nodes)
            .iter()
            .cloned()
            .map(Into::into)
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(AnalyzedUnit {
            nodes: unit.nodes,
            tags: unit.tags,
            results: analyzer.results().clone(),
        })
    }
}
