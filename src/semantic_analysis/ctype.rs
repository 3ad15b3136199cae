use crate::ast::{DeclarationSpecifiers, Specifier};
use std::fmt;

/// The analyzer's view of a C type.
///
/// Qualifiers (`const`, `volatile`) are dropped on construction, so type
/// equality already ignores them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CType {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Pointer(Box<CType>),
    Array(Box<CType>),
    /// A `struct`/`union`/`enum` tag or typedef name.
    Named(String),
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Char => write!(f, "char"),
            Self::Short => write!(f, "short"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Pointer(inner) => write!(f, "{inner}*"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

impl CType {
    /// Reads the base type out of a specifier list, ignoring qualifiers.
    /// `unsigned`/`signed` without a width keyword default to `int`.
    pub fn from_specifiers(specifiers: &DeclarationSpecifiers) -> Self {
        let mut base = None;
        for specifier in &specifiers.specifiers {
            match specifier {
                Specifier::Type(name) => {
                    let candidate = match name.as_str() {
                        "void" => Self::Void,
                        "char" => Self::Char,
                        "short" => Self::Short,
                        "long" => Self::Long,
                        "float" => Self::Float,
                        "double" => Self::Double,
                        _ => Self::Int,
                    };
                    // `long int` keeps `long`; `unsigned int` keeps `int`.
                    let keep_previous = candidate == Self::Int && base.is_some();
                    if !keep_previous {
                        base = Some(candidate);
                    }
                }
                Specifier::Complex { tag, .. } => base = Some(Self::Named(tag.clone())),
                Specifier::Qualifier(_) => {}
            }
        }
        base.unwrap_or(Self::Int)
    }

    /// Applies declarator shape on top of the base type.
    pub fn with_declarator(base: Self, pointer: bool, array: bool) -> Self {
        let mut ty = base;
        if pointer {
            ty = Self::Pointer(Box::new(ty));
        }
        if array {
            ty = Self::Array(Box::new(ty));
        }
        ty
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Char | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    /// Array-to-pointer decay; other types are unchanged.
    #[must_use]
    pub fn decay(&self) -> Self {
        match self {
            Self::Array(inner) => Self::Pointer(inner.clone()),
            other => other.clone(),
        }
    }

    /// Type after one `*`: strips a pointer or array level.
    pub fn deref(&self) -> Option<Self> {
        match self {
            Self::Pointer(inner) | Self::Array(inner) => Some((**inner).clone()),
            _ => None,
        }
    }

    /// Promotion rank: `double > float > long > int`; the narrow integer
    /// types sit at `int` rank.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Char | Self::Short | Self::Int => Some(1),
            Self::Long => Some(2),
            Self::Float => Some(3),
            Self::Double => Some(4),
            _ => None,
        }
    }

    /// Result type of an arithmetic binary expression. Pointer arithmetic
    /// yields the pointer type.
    pub fn promote(left: &Self, right: &Self) -> Self {
        if left.is_pointer() {
            return left.clone();
        }
        if right.is_pointer() {
            return right.clone();
        }
        let rank = left.rank().unwrap_or(1).max(right.rank().unwrap_or(1));
        match rank {
            4 => Self::Double,
            3 => Self::Float,
            2 => Self::Long,
            _ => Self::Int,
        }
    }

    /// Assignment/argument compatibility: equality, any numeric pair,
    /// `void*` against any pointer, recursively compatible pointee types,
    /// and arrays decaying to pointers.
    pub fn compat(target: &Self, source: &Self) -> bool {
        let target = target.decay();
        let source = source.decay();
        if target == source {
            return true;
        }
        if target.is_numeric() && source.is_numeric() {
            return true;
        }
        match (&target, &source) {
            (Self::Pointer(t), Self::Pointer(s)) => {
                **t == Self::Void || **s == Self::Void || Self::compat(t, s)
            }
            _ => false,
        }
    }
}
