pub(super) type Result<T> = std::result::Result<T, DriverError>;

pub enum DriverError {
    SyntaxErrors(usize),
    SemanticErrors(usize),
    IoError(String),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "io error: {e}"),
            Self::SyntaxErrors(n) => write!(f, "{n} syntax error(s); stopping before analysis"),
            Self::SemanticErrors(n) => {
                write!(f, "{n} semantic error(s); stopping before code generation")
            }
        }
    }
}

impl std::fmt::Debug for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for DriverError {}

macro_rules! from_error {
    ($e:ty, $variant:path) => {
        impl From<$e> for DriverError {
            fn from(e: $e) -> Self {
                $variant(e.to_string())
            }
        }
    };
}

from_error!(std::io::Error, Self::IoError);
