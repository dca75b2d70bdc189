//! Tokenizer for the Jack source language.
//!
//! Produces a pull-based token stream with exactly one token of lookahead,
//! kept in an explicit buffer.  Whitespace and comments are skipped before
//! every token and never surface in the stream.

use std::fmt::{self, Display, Formatter};

pub type Span = std::ops::Range<usize>;

/// The fixed punctuation set of the language.
const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// The largest value an integer literal may take.
const MAX_INT: u32 = 32767;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "class" => Keyword::Class,
            "constructor" => Keyword::Constructor,
            "function" => Keyword::Function,
            "method" => Keyword::Method,
            "field" => Keyword::Field,
            "static" => Keyword::Static,
            "var" => Keyword::Var,
            "int" => Keyword::Int,
            "char" => Keyword::Char,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "this" => Keyword::This,
            "let" => Keyword::Let,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "return" => Keyword::Return,

            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(char),
    IntConst(u16),
    StringConst(String),
    Identifier(String),
}

/// A single token with the raw text it was matched from and its position in
/// the source.  Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LexError {
    InvalidCharacter(Span, char),
    UnterminatedString(Span),
    IntegerOutOfRange(Span, String),
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::InvalidCharacter(span, _)
            | LexError::UnterminatedString(span)
            | LexError::IntegerOutOfRange(span, _) => span,
        }
    }
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LexError::InvalidCharacter(_, c) => {
                write!(f, "Invalid character \"{}\".", c)
            }
            LexError::UnterminatedString(_) => {
                write!(f, "Unterminated string literal.")
            }
            LexError::IntegerOutOfRange(_, text) => {
                write!(f, "Integer literal {} is out of range (0..={}).", text, MAX_INT)
            }
        }
    }
}

pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    lookahead: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            lookahead: None,
        }
    }

    /// The current scan offset.  Used for the span of end-of-input errors.
    pub fn pos(&self) -> usize {
        if let Some(token) = &self.lookahead {
            token.span.start
        } else {
            self.pos
        }
    }

    /// Returns the next token without consuming it.  `None` means the end of
    /// the input was reached.
    pub fn peek(&mut self) -> Result<Option<&Token>, LexError> {
        if self.lookahead.is_none() {
            self.lookahead = self.scan_token()?;
        }
        Ok(self.lookahead.as_ref())
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.lookahead.take() {
            return Ok(Some(token));
        }
        self.scan_token()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek_char(), self.peek_char_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance_char();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.advance_char() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.advance_char();
                    self.advance_char();
                    // An unterminated block comment swallows the rest of the
                    // input, matching the line-oriented skip above.
                    while let Some(c) = self.advance_char() {
                        if c == '*' && self.peek_char() == Some('/') {
                            self.advance_char();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia();

        let start = self.pos;
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(None),
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(Some(self.scan_word(start)));
        }

        if c.is_ascii_digit() {
            return self.scan_integer(start).map(Some);
        }

        if c == '"' {
            return self.scan_string(start).map(Some);
        }

        if SYMBOLS.contains(c) {
            self.advance_char();
            return Ok(Some(Token {
                kind: TokenKind::Symbol(c),
                text: c.to_string(),
                span: start..self.pos,
            }));
        }

        Err(LexError::InvalidCharacter(start..start + c.len_utf8(), c))
    }

    /// Scans a maximal identifier-shaped word, then classifies it against the
    /// keyword table.  Keywords are reserved words.
    fn scan_word(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let kind = if let Some(keyword) = Keyword::from_word(text) {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Identifier(text.to_owned())
        };

        Token {
            kind,
            text: text.to_owned(),
            span: start..self.pos,
        }
    }

    fn scan_integer(&mut self, start: usize) -> Result<Token, LexError> {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let span = start..self.pos;

        match text.parse::<u32>() {
            Ok(value) if value <= MAX_INT => Ok(Token {
                kind: TokenKind::IntConst(value as u16),
                text: text.to_owned(),
                span,
            }),
            _ => Err(LexError::IntegerOutOfRange(span, text.to_owned())),
        }
    }

    fn scan_string(&mut self, start: usize) -> Result<Token, LexError> {
        // Consume the opening quote.
        self.advance_char();

        let content_start = self.pos;
        loop {
            match self.advance_char() {
                Some('"') => break,
                Some(_) => continue,
                None => return Err(LexError::UnterminatedString(start..self.pos)),
            }
        }

        let content = &self.source[content_start..self.pos - 1];
        Ok(Token {
            kind: TokenKind::StringConst(content.to_owned()),
            text: self.source[start..self.pos].to_owned(),
            span: start..self.pos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(source);
        let mut out = vec![];
        while let Some(token) = tokenizer.next().unwrap() {
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn keywords_are_reserved() {
        assert_eq!(
            kinds("class classy let letter"),
            vec![
                TokenKind::Keyword(Keyword::Class),
                TokenKind::Identifier("classy".to_owned()),
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Identifier("letter".to_owned()),
            ]
        );
    }

    #[test]
    fn symbols_and_literals() {
        assert_eq!(
            kinds("let x = arr[3] + \"hi\";"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Identifier("x".to_owned()),
                TokenKind::Symbol('='),
                TokenKind::Identifier("arr".to_owned()),
                TokenKind::Symbol('['),
                TokenKind::IntConst(3),
                TokenKind::Symbol(']'),
                TokenKind::Symbol('+'),
                TokenKind::StringConst("hi".to_owned()),
                TokenKind::Symbol(';'),
            ]
        );
    }

    #[test]
    fn comments_and_whitespace_are_transparent() {
        let commented = "let // trailing comment\n  x /* block\n spanning */ = 1 ;";
        let plain = "let x = 1;";
        assert_eq!(kinds(commented), kinds(plain));
    }

    #[test]
    fn spans_and_raw_text() {
        let mut tokenizer = Tokenizer::new("  let x");
        let token = tokenizer.next().unwrap().unwrap();
        assert_eq!(token.span, 2..5);
        assert_eq!(token.text, "let");
        let token = tokenizer.next().unwrap().unwrap();
        assert_eq!(token.span, 6..7);
        assert_eq!(token.text, "x");
    }

    #[test]
    fn string_text_keeps_quotes() {
        let mut tokenizer = Tokenizer::new("\"ab\"");
        let token = tokenizer.next().unwrap().unwrap();
        assert_eq!(token.kind, TokenKind::StringConst("ab".to_owned()));
        assert_eq!(token.text, "\"ab\"");
    }

    #[test]
    fn lookahead_is_not_consuming() {
        let mut tokenizer = Tokenizer::new("do ;");
        assert_eq!(
            tokenizer.peek().unwrap().unwrap().kind,
            TokenKind::Keyword(Keyword::Do)
        );
        assert_eq!(
            tokenizer.peek().unwrap().unwrap().kind,
            TokenKind::Keyword(Keyword::Do)
        );
        assert_eq!(
            tokenizer.next().unwrap().unwrap().kind,
            TokenKind::Keyword(Keyword::Do)
        );
        assert_eq!(
            tokenizer.next().unwrap().unwrap().kind,
            TokenKind::Symbol(';')
        );
        assert_eq!(tokenizer.next().unwrap(), None);
    }

    #[test]
    fn integer_range() {
        assert_eq!(kinds("32767"), vec![TokenKind::IntConst(32767)]);

        let mut tokenizer = Tokenizer::new("32768");
        assert_eq!(
            tokenizer.next(),
            Err(LexError::IntegerOutOfRange(0..5, "32768".to_owned()))
        );
    }

    #[test]
    fn unterminated_string() {
        let mut tokenizer = Tokenizer::new("\"abc");
        assert_eq!(
            tokenizer.next(),
            Err(LexError::UnterminatedString(0..4))
        );
    }

    #[test]
    fn invalid_character() {
        let mut tokenizer = Tokenizer::new("let ! go");
        tokenizer.next().unwrap();
        assert_eq!(
            tokenizer.next(),
            Err(LexError::InvalidCharacter(4..5, '!'))
        );
    }
}
