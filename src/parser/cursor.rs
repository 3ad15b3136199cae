use crate::ast::{Identifier, Span};
use crate::lexer::{Token, TokenKind};
use crate::parser::{Result, SyntaxError, SyntaxErrorKind};

/// Token cursor with single-savepoint look-ahead.
///
/// Comment tokens are transparent: `peek`/`bump` never land on one.
#[derive(Debug)]
pub struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
    last_end: usize,
    last_line: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Savepoint {
    position: usize,
    last_end: usize,
    last_line: u64,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let mut cursor = Self {
            tokens,
            position: 0,
            last_end: 0,
            last_line: 1,
        };
        cursor.skip_comments();
        cursor
    }

    fn skip_comments(&mut self) {
        while self
            .tokens
            .get(self.position)
            .filter(|t| t.kind == TokenKind::Comment)
            .is_some()
        {
            self.position += 1;
        }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    pub fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.position) {
            self.last_end = token.end;
            self.last_line = token.line;
            self.position += 1;
            self.skip_comments();
        }
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn save(&self) -> Savepoint {
        Savepoint {
            position: self.position,
            last_end: self.last_end,
            last_line: self.last_line,
        }
    }

    pub fn restore(&mut self, savepoint: Savepoint) {
        self.position = savepoint.position;
        self.last_end = savepoint.last_end;
        self.last_line = savepoint.last_line;
    }

    /// Byte offset where the next node would start.
    pub fn start(&self) -> usize {
        self.peek().map_or(self.last_end, |t| t.start)
    }

    /// End offset of the most recently consumed token.
    pub fn prev_end(&self) -> usize {
        self.last_end
    }

    pub fn line(&self) -> u64 {
        self.peek().map_or(self.last_line, |t| t.line)
    }

    pub fn location(&self) -> Span {
        self.peek()
            .map_or(Span::new(self.last_end, self.last_end), Token::span)
    }

    pub fn error_here(&self, kind: SyntaxErrorKind) -> SyntaxError {
        kind.at(self.location(), self.line())
    }

    pub fn expected(&self, what: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => self.error_here(SyntaxErrorKind::ExpectedButGot {
                expected: what.to_owned(),
                got: token.value.clone(),
            }),
            None => self.error_here(SyntaxErrorKind::UnexpectedEof),
        }
    }

    pub fn next_or_error(&mut self) -> Result<&'a Token> {
        let token = self
            .peek()
            .ok_or_else(|| self.error_here(SyntaxErrorKind::UnexpectedEof))?;
        self.bump();
        Ok(token)
    }

    pub fn peek_is_punct(&self, value: &str) -> bool {
        self.peek().filter(|t| t.is_punct(value)).is_some()
    }

    pub fn peek_is_operator(&self, value: &str) -> bool {
        self.peek().filter(|t| t.is_operator(value)).is_some()
    }

    pub fn bump_punct(&mut self, value: &str) -> bool {
        let hit = self.peek_is_punct(value);
        if hit {
            self.bump();
        }
        hit
    }

    pub fn bump_operator(&mut self, value: &str) -> bool {
        let hit = self.peek_is_operator(value);
        if hit {
            self.bump();
        }
        hit
    }

    pub fn expect_punct(&mut self, value: &str) -> Result<()> {
        if self.bump_punct(value) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{value}'")))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<(Identifier, Span)> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.bump();
                Ok((token.value.clone(), token.span()))
            }
            Some(token) => {
                Err(self.error_here(SyntaxErrorKind::ExpectedIdentifier(token.value.clone())))
            }
            None => Err(self.error_here(SyntaxErrorKind::UnexpectedEof)),
        }
    }
}
