use crate::ast::Span;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyntaxError>;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, but got '{got}'")]
    ExpectedButGot { expected: String, got: String },
    #[error("expected identifier, but got '{0}'")]
    ExpectedIdentifier(String),
    #[error("expected expression, but got '{0}'")]
    ExpectedExpression(String),
    #[error("unexpected token '{0}' at program level")]
    UnexpectedTopLevel(String),
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unrecognized input '{0}'")]
    Unrecognized(String),
    #[error("reached unexpected end of file")]
    UnexpectedEof,
    #[error("parser failed: {0}")]
    Internal(String),
}

/// A syntax diagnostic with the offending token's position attached.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: Span,
    pub line: u64,
}

impl SyntaxErrorKind {
    pub(super) fn at(self, location: Span, line: u64) -> SyntaxError {
        SyntaxError {
            kind: self,
            location,
            line,
        }
    }
}

impl SyntaxError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for SyntaxError {}
