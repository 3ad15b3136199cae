use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    /// Blocks downstream stages.
    Error,
    /// Reported but does not gate the pipeline.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SemanticErrorKind {
    #[error("Redeclaration of '{0}'")]
    Redeclaration(String),
    #[error("Undeclared identifier '{0}'")]
    UndeclaredIdentifier(String),
    #[error("Call to undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    #[error("Function '{name}' called with {got} arguments, but expected {expected}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("Type mismatch in assignment: cannot assign {source_ty} to {target}")]
    AssignmentTypeMismatch { target: String, source_ty: String },
    #[error("Type mismatch in argument {index} of call to '{name}': expected {expected}, but got {got}")]
    ArgumentTypeMismatch {
        name: String,
        index: usize,
        expected: String,
        got: String,
    },
    #[error("Variable '{0}' used before initialization")]
    UsedBeforeInit(String),
    #[error("Unused variable '{0}'")]
    UnusedVariable(String),
    #[error("No 'main' function defined")]
    MissingMain,
    #[error("break statement outside of loop")]
    BreakOutsideLoop,
    #[error("continue statement outside of loop")]
    ContinueOutsideLoop,
    #[error("semantic analysis failed: {0}")]
    Internal(String),
}

/// A semantic diagnostic: a classified message pinned to a source line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: u64,
}

impl SemanticErrorKind {
    pub(super) fn at(self, line: u64) -> SemanticError {
        SemanticError { kind: self, line }
    }
}

impl SemanticError {
    pub(super) fn internal(message: String) -> Self {
        SemanticErrorKind::Internal(message).at(1)
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            SemanticErrorKind::UnusedVariable(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable machine-readable tag for the diagnostic class.
    pub fn code(&self) -> &'static str {
        use SemanticErrorKind as K;
        match self.kind {
            K::Redeclaration(_) => "redeclaration",
            K::UndeclaredIdentifier(_) => "undeclared-identifier",
            K::UndefinedFunction(_) => "undefined-function",
            K::NotAFunction(_) => "not-a-function",
            K::ArgumentCount { .. } => "argument-count",
            K::AssignmentTypeMismatch { .. } => "assignment-type-mismatch",
            K::ArgumentTypeMismatch { .. } => "argument-type-mismatch",
            K::UsedBeforeInit(_) => "used-before-initialization",
            K::UnusedVariable(_) => "unused-variable",
            K::MissingMain => "missing-main",
            K::BreakOutsideLoop => "break-outside-loop",
            K::ContinueOutsideLoop => "continue-outside-loop",
            K::Internal(_) => "internal",
        }
    }

    /// A longer explanation suitable for display next to the message.
    pub fn description(&self) -> &'static str {
        use SemanticErrorKind as K;
        match self.kind {
            K::Redeclaration(_) => "Each name may be declared only once per scope.",
            K::UndeclaredIdentifier(_) => {
                "The name does not resolve to any declaration in the enclosing scopes."
            }
            K::UndefinedFunction(_) => {
                "The called name is not declared as a function anywhere in scope."
            }
            K::NotAFunction(_) => "Only functions can be called.",
            K::ArgumentCount { .. } => {
                "The number of call arguments must match the declared parameter count."
            }
            K::AssignmentTypeMismatch { .. } => {
                "The assigned value's type is not compatible with the target's type."
            }
            K::ArgumentTypeMismatch { .. } => {
                "An argument's type is not compatible with the declared parameter type."
            }
            K::UsedBeforeInit(_) => {
                "The variable is read before any value has been assigned to it."
            }
            K::UnusedVariable(_) => "The variable is declared but its value is never read.",
            K::MissingMain => "An executable program needs a 'main' function as its entry point.",
            K::BreakOutsideLoop => "break is only meaningful inside a loop body.",
            K::ContinueOutsideLoop => "continue is only meaningful inside a loop body.",
            K::Internal(_) => "The analyzer hit an unexpected internal fault.",
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity(), self.kind)
    }
}

impl std::error::Error for SemanticError {}
