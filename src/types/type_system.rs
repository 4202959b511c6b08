//! Type System for Jander
//!
//! The closed set of semantic types and the rules for compatibility,
//! promotion and comparison. Everything here is pure.

use std::fmt;

/// Ordered record field map.
///
/// Field order is declaration order, which is also the order the C struct
/// is emitted in. Cloning produces an independent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, Type)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field; returns false if the name was already present
    pub fn insert(&mut self, name: impl Into<String>, ty: Type) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, ty));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Semantic type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer,
    Real,
    Literal,
    Logical,
    Pointer(Box<Type>),
    Record(Fields),
    /// Arrays carry no static size
    Array(Box<Type>),
    /// `ret` is `None` for procedures
    Function { params: Vec<Type>, ret: Option<Box<Type>> },
    /// Poison value for anything already reported as wrong
    Invalid,
}

impl Type {
    /// Create a pointer type
    pub fn pointer(to: Type) -> Self {
        Self::Pointer(Box::new(to))
    }

    /// Create an array type
    pub fn array(element: Type) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    /// Integer, real, literal or logical
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Integer | Self::Real | Self::Literal | Self::Logical)
    }

    /// Pointee of a pointer, `Invalid` for anything else
    pub fn pointee(&self) -> Type {
        match self {
            Self::Pointer(inner) => (**inner).clone(),
            _ => Self::Invalid,
        }
    }

    /// Element type of an array, `Invalid` for anything else
    pub fn element(&self) -> Type {
        match self {
            Self::Array(inner) => (**inner).clone(),
            _ => Self::Invalid,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "inteiro"),
            Self::Real => write!(f, "real"),
            Self::Literal => write!(f, "literal"),
            Self::Logical => write!(f, "logico"),
            Self::Pointer(inner) => write!(f, "^{}", inner),
            Self::Record(_) => write!(f, "registro"),
            Self::Array(inner) => write!(f, "{}[]", inner),
            Self::Function { ret: Some(ret), .. } => write!(f, "funcao: {}", ret),
            Self::Function { ret: None, .. } => write!(f, "procedimento"),
            Self::Invalid => write!(f, "invalido"),
        }
    }
}

// ==================== Type Rules ====================

/// Whether a value of type `source` cannot be stored into `target`.
///
/// Any two pointers are compatible, any two numerics are compatible, and
/// otherwise only identical types are.
pub fn types_incompatible(target: &Type, source: &Type) -> bool {
    match (target, source) {
        (Type::Invalid, _) | (_, Type::Invalid) => true,
        (Type::Pointer(_), Type::Pointer(_)) => false,
        (Type::Pointer(_), _) | (_, Type::Pointer(_)) => true,
        (t, s) if t.is_numeric() && s.is_numeric() => false,
        (t, s) => t != s,
    }
}

/// Result type of an arithmetic operator over two numerics
pub fn promote(left: &Type, right: &Type) -> Type {
    match (left, right) {
        (Type::Integer, Type::Integer) => Type::Integer,
        (Type::Real, r) if r.is_numeric() => Type::Real,
        (l, Type::Real) if l.is_numeric() => Type::Real,
        _ => Type::Invalid,
    }
}

/// Whether two operands may appear on either side of a relational operator
pub fn comparable(left: &Type, right: &Type) -> bool {
    match (left, right) {
        (Type::Logical, _) | (_, Type::Logical) => false,
        (Type::Literal, Type::Literal) => true,
        (l, r) => l.is_numeric() && r.is_numeric(),
    }
}

/// Result type of a relational comparison
pub fn compare(left: &Type, right: &Type) -> Type {
    if comparable(left, right) {
        Type::Logical
    } else {
        Type::Invalid
    }
}
