//! Resolved types attached to every expression of the typed tree.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A fully resolved Pika type.
///
/// Type variables and promotions are resolved upstream; the generator only
/// ever sees concrete types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Boolean,
    Character,
    Integer,
    Floating,
    String,
    /// Exact fraction, carried as a (numerator, denominator) word pair.
    Rational,
    Array(Box<Type>),
    Lambda {
        parameters: Vec<Type>,
        result: Box<Type>,
    },
    Void,
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn lambda(parameters: Vec<Type>, result: Type) -> Type {
        Type::Lambda {
            parameters,
            result: Box::new(result),
        }
    }

    /// Size in bytes of a value of this type in memory.
    pub fn size(&self) -> i32 {
        match self {
            Type::Boolean | Type::Character => 1,
            Type::Integer | Type::String | Type::Array(_) | Type::Lambda { .. } => 4,
            Type::Floating => 8,
            Type::Rational => 8,
            Type::Void => 0,
        }
    }

    /// Whether arrays of this type hold pointers that discard must follow.
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// Element type of an array, panicking for anything else.
    pub fn element(&self) -> &Type {
        match self {
            Type::Array(element) => element,
            other => panic!("{} has no element type (type checker bug)", other),
        }
    }

    /// Parameter and result types of a lambda, panicking for anything else.
    pub fn signature(&self) -> (&[Type], &Type) {
        match self {
            Type::Lambda { parameters, result } => (parameters, result),
            other => panic!("{} is not callable (type checker bug)", other),
        }
    }

    /// Number of operand-stack words a value of this type occupies.
    pub fn stack_words(&self) -> usize {
        match self {
            Type::Void => 0,
            Type::Rational => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "bool"),
            Type::Character => write!(f, "char"),
            Type::Integer => write!(f, "int"),
            Type::Floating => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Rational => write!(f, "rat"),
            Type::Array(element) => write!(f, "[{}]", element),
            Type::Lambda { parameters, result } => {
                write!(f, "<")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, "> -> {}", result)
            }
            Type::Void => write!(f, "void"),
        }
    }
}
