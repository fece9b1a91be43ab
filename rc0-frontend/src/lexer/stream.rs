//! Token FIFO consumed by the parser
//!
//! `peek` silently drains comment tokens so the grammar never sees them;
//! `peek_all` does not. `find` is the parser's resynchronization primitive.

use crate::lexer::token::{Token, TokenKind};
use std::collections::VecDeque;

/// FIFO of lexed tokens
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    toks: VecDeque<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self {
            toks: VecDeque::new(),
        }
    }

    pub fn push(&mut self, tok: Token) {
        self.toks.push_back(tok);
    }

    pub fn len(&self) -> usize {
        self.toks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toks.is_empty()
    }

    /// Current token-to-be-parsed. Never returns comment tokens; they are
    /// popped and dropped.
    pub fn peek(&mut self) -> Option<&Token> {
        while self.toks.front().is_some_and(|t| t.is_comment()) {
            self.toks.pop_front();
        }
        self.toks.front()
    }

    /// Current head token regardless of kind
    pub fn peek_all(&self) -> Option<&Token> {
        self.toks.front()
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.toks.pop_front()
    }

    /// Pop the head if its kind matches; otherwise leave it in place.
    pub fn accept(&mut self, kind: TokenKind) -> Result<Token, String> {
        match self.peek() {
            None => Err("end of tokens".to_string()),
            Some(tok) if tok.kind == kind => Ok(self.pop().unwrap()),
            Some(tok) => Err(format!("expecting {:?}, got {}", kind.to_string(), tok)),
        }
    }

    /// Pop tokens until the head matches one of `kinds`, then return a
    /// reference to it without popping. Used for error resynchronization.
    pub fn find(&mut self, kinds: &[TokenKind]) -> Option<&Token> {
        loop {
            match self.peek() {
                None => return None,
                Some(tok) if kinds.contains(&tok.kind) => break,
                Some(_) => {
                    self.pop();
                }
            }
        }
        self.peek()
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            toks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc0_common::SourceSpan;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, SourceSpan::dummy(), text.to_string())
    }

    #[test]
    fn test_peek_skips_comments() {
        let mut ts: TokenStream = [
            tok(TokenKind::CommentOne, "skip me"),
            tok(TokenKind::CommentMulti, "me too"),
            tok(TokenKind::Id, "a"),
        ]
        .into_iter()
        .collect();
        assert_eq!(ts.peek().unwrap().kind, TokenKind::Id);
        assert_eq!(ts.len(), 1);
    }

    #[test]
    fn test_peek_all_keeps_comments() {
        let ts: TokenStream = [tok(TokenKind::CommentOne, "kept"), tok(TokenKind::Id, "a")]
            .into_iter()
            .collect();
        assert_eq!(ts.peek_all().unwrap().kind, TokenKind::CommentOne);
    }

    #[test]
    fn test_accept() {
        let mut ts: TokenStream = [tok(TokenKind::Semicolon, ";"), tok(TokenKind::Id, "a")]
            .into_iter()
            .collect();
        assert!(ts.accept(TokenKind::LParen).is_err());
        assert_eq!(ts.len(), 2);
        assert!(ts.accept(TokenKind::Semicolon).is_ok());
        assert_eq!(ts.peek().unwrap().kind, TokenKind::Id);
    }

    #[test]
    fn test_find_resync() {
        let mut ts: TokenStream = [
            tok(TokenKind::Id, "junk"),
            tok(TokenKind::Plus, "+"),
            tok(TokenKind::Semicolon, ";"),
            tok(TokenKind::Id, "next"),
        ]
        .into_iter()
        .collect();
        let found = ts
            .find(&[TokenKind::Semicolon, TokenKind::RCurly])
            .cloned();
        assert_eq!(found.unwrap().kind, TokenKind::Semicolon);
        ts.pop();
        assert_eq!(ts.peek().unwrap().text, "next");
    }

    #[test]
    fn test_find_exhausts() {
        let mut ts: TokenStream = [tok(TokenKind::Id, "junk")].into_iter().collect();
        assert!(ts.find(&[TokenKind::Semicolon]).is_none());
        assert!(ts.is_empty());
    }
}
