use crate::ast::Span;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CodegenErrorKind {
    #[error("unsupported operator '{0}' in this position")]
    UnsupportedOperator(String),
    #[error("break statement outside of loop")]
    BreakOutsideLoop,
    #[error("continue statement outside of loop")]
    ContinueOutsideLoop,
    #[error("code generation failed: {0}")]
    Internal(String),
}

/// A code-generation diagnostic anchored to the offending node's span.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub location: Span,
}

impl CodegenErrorKind {
    pub(crate) fn at(self, location: Span) -> CodegenError {
        CodegenError {
            kind: self,
            location,
        }
    }
}

impl CodegenError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for CodegenError {}
