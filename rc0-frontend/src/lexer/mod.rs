//! C0 lexer
//!
//! Tokenizes C0 source text into the token alphabet consumed by the parser.
//! Errors are collected rather than aborting the scan: the offending input
//! is skipped and lexing continues, so a single run surfaces as many
//! problems as possible.

pub mod stream;
pub mod token;

pub use stream::TokenStream;
pub use token::{Token, TokenKind};

use rc0_common::{CompilerError, SourceLocation, SourceSpan};

/// C0 lexer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    file: String,
    errors: Vec<CompilerError>,
}

impl Lexer {
    pub fn new(file: &str, input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            file: file.to_string(),
            errors: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn error(&mut self, location: SourceLocation, message: String) {
        self.errors
            .push(CompilerError::lex(&self.file, location, message));
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(|ch| ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Tokenize the entire input. Returns whatever tokens could be formed
    /// together with the collected errors.
    pub fn tokenize(mut self) -> (TokenStream, Vec<CompilerError>) {
        let mut toks = TokenStream::new();
        loop {
            self.skip_whitespace();
            let start = self.location();
            let Some(ch) = self.current_char() else {
                break;
            };
            let kind_and_text = match ch {
                c if c.is_ascii_alphabetic() || c == '_' => Some(self.scan_identifier()),
                c if c.is_ascii_digit() => self.scan_number(start),
                '"' => self.scan_string(start),
                '\'' => self.scan_char(start),
                '#' => self.scan_use_directive(start),
                '/' if self.peek_char(1) == Some('/') => Some(self.scan_line_comment()),
                '/' if self.peek_char(1) == Some('*') => self.scan_block_comment(start),
                _ => self.scan_operator(start),
            };
            if let Some((kind, text)) = kind_and_text {
                let span = SourceSpan::new(start, self.location());
                toks.push(Token::new(kind, span, text));
            }
        }
        (toks, self.errors)
    }

    fn scan_identifier(&mut self) -> (TokenKind, String) {
        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "NULL" => TokenKind::Null,
            _ => TokenKind::Id,
        };
        (kind, text)
    }

    fn scan_number(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        let mut text = String::new();
        if self.current_char() == Some('0') {
            text.push(self.advance().unwrap());
            if matches!(self.current_char(), Some('x') | Some('X')) {
                text.push(self.advance().unwrap());
                let mut digits = 0;
                while self.current_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                    text.push(self.advance().unwrap());
                    digits += 1;
                }
                if digits == 0 {
                    self.error(start, format!("invalid hex literal: {:?}", text));
                    return None;
                }
                return Some((TokenKind::HexNum, text));
            }
            // A lone zero; "0123" style literals are not part of the
            // grammar, so the following digits lex as a separate number.
            return Some((TokenKind::DecNum, text));
        }
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
        }
        Some((TokenKind::DecNum, text))
    }

    fn scan_escape(&mut self, start: SourceLocation, in_string: bool) -> Option<char> {
        // Caller has consumed the backslash.
        let Some(ch) = self.advance() else {
            self.error(start, "unterminated escape sequence".to_string());
            return None;
        };
        let resolved = match ch {
            'n' => '\n',
            't' => '\t',
            'v' => '\u{b}',
            'b' => '\u{8}',
            'r' => '\r',
            'f' => '\u{c}',
            'a' => '\u{7}',
            '\\' => '\\',
            '"' if in_string => '"',
            '\'' if !in_string => '\'',
            '0' if !in_string => '\0',
            other => {
                self.error(start, format!("invalid escape sequence: \\{}", other));
                return None;
            }
        };
        Some(resolved)
    }

    fn scan_string(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.current_char() {
                None | Some('\n') => {
                    self.error(start, "missing closing '\"'".to_string());
                    return None;
                }
                Some('"') => {
                    self.advance();
                    return Some((TokenKind::StrLit, text));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(resolved) = self.scan_escape(start, true) {
                        text.push(resolved);
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn scan_char(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        self.advance(); // opening quote
        let ch = match self.current_char() {
            None | Some('\n') => {
                self.error(start, "missing closing \"'\"".to_string());
                return None;
            }
            Some('\\') => {
                self.advance();
                self.scan_escape(start, false)?
            }
            Some(ch) => {
                self.advance();
                ch
            }
        };
        if self.current_char() != Some('\'') {
            self.error(start, "missing closing \"'\"".to_string());
            return None;
        }
        self.advance();
        Some((TokenKind::ChrLit, ch.to_string()))
    }

    fn scan_line_comment(&mut self) -> (TokenKind, String) {
        self.advance();
        self.advance(); // the two slashes
        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        (TokenKind::CommentOne, text)
    }

    fn scan_block_comment(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        self.advance();
        self.advance(); // "/*"
        let mut text = String::new();
        loop {
            match self.current_char() {
                None => {
                    self.error(start, "no matching \"*/\" for comment".to_string());
                    return None;
                }
                Some('*') if self.peek_char(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return Some((TokenKind::CommentMulti, text));
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// `#use <lib>` or `#use "file"`, terminated by a newline
    fn scan_use_directive(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        for expected in ['#', 'u', 's', 'e'] {
            if self.current_char() != Some(expected) {
                self.error(start, "unrecognized compiler directive".to_string());
                self.advance();
                return None;
            }
            self.advance();
        }
        if !self.current_char().is_some_and(|c| c.is_whitespace() && c != '\n') {
            self.error(start, "#use directive missing path".to_string());
            return None;
        }
        while self.current_char().is_some_and(|c| c.is_whitespace() && c != '\n') {
            self.advance();
        }
        let (kind, text) = match self.current_char() {
            Some('<') => {
                self.advance();
                let mut path = String::new();
                loop {
                    match self.current_char() {
                        None | Some('\n') => {
                            self.error(start, "#use directive missing '>'".to_string());
                            return None;
                        }
                        Some('>') => {
                            self.advance();
                            break;
                        }
                        Some(ch) => {
                            path.push(ch);
                            self.advance();
                        }
                    }
                }
                (TokenKind::UseLibLit, path)
            }
            Some('"') => {
                let (_, path) = self.scan_string(start)?;
                (TokenKind::UseStrLit, path)
            }
            _ => {
                self.error(start, "expecting a string or library literal for #use".to_string());
                return None;
            }
        };
        while self.current_char().is_some_and(|c| c.is_whitespace() && c != '\n') {
            self.advance();
        }
        match self.current_char() {
            None => {}
            Some('\n') => {
                self.advance();
            }
            Some(_) => {
                self.error(start, "#use directive missing newline".to_string());
                return None;
            }
        }
        Some((kind, text))
    }

    fn scan_operator(&mut self, start: SourceLocation) -> Option<(TokenKind, String)> {
        use TokenKind::*;
        // Maximal munch: try three-char operators, then two, then one.
        let one = self.current_char()?;
        let two = self.peek_char(1);
        let three = self.peek_char(2);

        if let (Some(t2), Some(t3)) = (two, three) {
            let kind = match (one, t2, t3) {
                ('<', '<', '=') => Some(AssignDLt),
                ('>', '>', '=') => Some(AssignDGt),
                _ => None,
            };
            if let Some(kind) = kind {
                let text: String = [one, t2, t3].iter().collect();
                self.advance();
                self.advance();
                self.advance();
                return Some((kind, text));
            }
        }
        if let Some(t2) = two {
            let kind = match (one, t2) {
                ('-', '>') => Some(Arrow),
                ('<', '<') => Some(DLt),
                ('>', '>') => Some(DGt),
                ('<', '=') => Some(Le),
                ('>', '=') => Some(Ge),
                ('=', '=') => Some(Eq),
                ('!', '=') => Some(Ne),
                ('&', '&') => Some(DAmpersand),
                ('|', '|') => Some(DPipe),
                ('+', '+') => Some(DPlus),
                ('-', '-') => Some(DMinus),
                ('+', '=') => Some(AssignPlus),
                ('-', '=') => Some(AssignMinus),
                ('*', '=') => Some(AssignStar),
                ('/', '=') => Some(AssignSlash),
                ('%', '=') => Some(AssignPercent),
                ('&', '=') => Some(AssignAmpersand),
                ('^', '=') => Some(AssignHat),
                ('|', '=') => Some(AssignPipe),
                ('[', ']') => Some(Brackets),
                _ => None,
            };
            if let Some(kind) = kind {
                let text: String = [one, t2].iter().collect();
                self.advance();
                self.advance();
                return Some((kind, text));
            }
        }
        let kind = match one {
            '(' => Some(LParen),
            ')' => Some(RParen),
            '[' => Some(LBrack),
            ']' => Some(RBrack),
            '{' => Some(LCurly),
            '}' => Some(RCurly),
            ',' => Some(Comma),
            ';' => Some(Semicolon),
            '!' => Some(Exclam),
            '~' => Some(Worm),
            '+' => Some(Plus),
            '-' => Some(Minus),
            '*' => Some(Star),
            '.' => Some(Dot),
            '/' => Some(Slash),
            '%' => Some(Percent),
            '<' => Some(Lt),
            '>' => Some(Gt),
            '=' => Some(Assign),
            '&' => Some(Ampersand),
            '^' => Some(Hat),
            '|' => Some(Pipe),
            '?' => Some(Quest),
            ':' => Some(Colon),
            _ => None,
        };
        match kind {
            Some(kind) => {
                self.advance();
                Some((kind, one.to_string()))
            }
            None => {
                self.error(start, format!("unexpected character: {:?}", one));
                self.advance();
                None
            }
        }
    }
}

/// Lex a compile unit in one call
pub fn lex(file: &str, input: &str) -> (TokenStream, Vec<CompilerError>) {
    Lexer::new(file, input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let (mut toks, errs) = lex("<test>", input);
        assert!(errs.is_empty(), "unexpected lex errors: {:?}", errs);
        let mut out = Vec::new();
        while let Some(tok) = toks.pop() {
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / % == != <= >= && || ++ -- <<= >>= ->"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::DAmpersand,
                TokenKind::DPipe,
                TokenKind::DPlus,
                TokenKind::DMinus,
                TokenKind::AssignDLt,
                TokenKind::AssignDGt,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn test_shift_vs_assign() {
        assert_eq!(kinds("<< <<= < <="), vec![
            TokenKind::DLt,
            TokenKind::AssignDLt,
            TokenKind::Lt,
            TokenKind::Le,
        ]);
    }

    #[test]
    fn test_brackets_adjacency() {
        // Adjacent "[]" is one token, a subscript's "[" is not.
        assert_eq!(kinds("int[] a"), vec![
            TokenKind::Id,
            TokenKind::Brackets,
            TokenKind::Id,
        ]);
        assert_eq!(kinds("a[0]"), vec![
            TokenKind::Id,
            TokenKind::LBrack,
            TokenKind::DecNum,
            TokenKind::RBrack,
        ]);
    }

    #[test]
    fn test_numbers() {
        let (mut toks, errs) = lex("<test>", "42 0 0x1F 123");
        assert!(errs.is_empty());
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::DecNum, "42"));
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::DecNum, "0"));
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::HexNum, "0x1F"));
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::DecNum, "123"));
    }

    #[test]
    fn test_bad_hex() {
        let (_, errs) = lex("<test>", "0x");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_string_escapes() {
        let (mut toks, errs) = lex("<test>", r#""hello\nworld\t""#);
        assert!(errs.is_empty());
        let t = toks.pop().unwrap();
        assert_eq!(t.kind, TokenKind::StrLit);
        assert_eq!(t.text, "hello\nworld\t");
    }

    #[test]
    fn test_char_escapes() {
        let (mut toks, errs) = lex("<test>", r"'\n' '\0' '\'' 'a'");
        assert!(errs.is_empty());
        let want = ["\n", "\0", "'", "a"];
        for expected in want {
            let t = toks.pop().unwrap();
            assert_eq!(t.kind, TokenKind::ChrLit);
            assert_eq!(t.text, expected);
        }
    }

    #[test]
    fn test_unterminated_string() {
        let (_, errs) = lex("<test>", "\"oops\nint a;");
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("missing closing"));
    }

    #[test]
    fn test_comments() {
        let (mut toks, errs) = lex("<test>", "a // one\n/* two */ b");
        assert!(errs.is_empty());
        assert_eq!(toks.pop().unwrap().kind, TokenKind::Id);
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::CommentOne, " one"));
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::CommentMulti, " two "));
        assert_eq!(toks.pop().unwrap().kind, TokenKind::Id);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (_, errs) = lex("<test>", "/* runs away");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_use_directives() {
        let (mut toks, errs) = lex("<test>", "#use <conio>\n#use \"util.c0\"\nint a;");
        assert!(errs.is_empty(), "{:?}", errs);
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::UseLibLit, "conio"));
        let t = toks.pop().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::UseStrLit, "util.c0"));
        assert_eq!(toks.pop().unwrap().kind, TokenKind::Id);
    }

    #[test]
    fn test_use_directive_missing_newline() {
        let (_, errs) = lex("<test>", "#use <conio> int a;");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_special_identifiers() {
        assert_eq!(kinds("true false NULL truthy"), vec![
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::Id,
        ]);
    }

    #[test]
    fn test_spans() {
        let (mut toks, _) = lex("<test>", "ab\n  cd");
        let a = toks.pop().unwrap();
        assert_eq!((a.span.start.line, a.span.start.column), (1, 1));
        assert_eq!((a.span.end.line, a.span.end.column), (1, 3));
        let c = toks.pop().unwrap();
        assert_eq!((c.span.start.line, c.span.start.column), (2, 3));
    }

    #[test]
    fn test_stray_character_is_skipped() {
        let (mut toks, errs) = lex("<test>", "a $ b");
        assert_eq!(errs.len(), 1);
        assert_eq!(toks.pop().unwrap().text, "a");
        assert_eq!(toks.pop().unwrap().text, "b");
    }

    #[test]
    fn test_format_relex_round_trip() {
        // Lexing the formatted token stream reproduces the token kinds.
        let input = "int f(int a) { // note\n\
                     int[] xs = alloc_array(int, 0x10);\n\
                     char c = '\\n';\n\
                     return a <= 1 ? a : f(a - 1) * \"s\" != NULL;\n\
                     }";
        let (mut first, errs) = lex("<test>", input);
        assert!(errs.is_empty(), "{:?}", errs);
        let mut formatted = Vec::new();
        let mut want = Vec::new();
        while let Some(tok) = first.pop() {
            formatted.push(tok.to_string());
            want.push(tok.kind);
        }
        let (mut second, errs) = lex("<test>", &formatted.join("\n"));
        assert!(errs.is_empty(), "{:?}", errs);
        let mut got = Vec::new();
        while let Some(tok) = second.pop() {
            got.push(tok.kind);
        }
        assert_eq!(got, want);
    }
}
