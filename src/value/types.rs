use strum::Display;

use super::Value;

/// The type of a runtime value. `Any` never describes a concrete value; it
/// only appears as a conversion target, and asking to cast into it is an
/// internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Type {
    Integer,
    Real,
    Boolean,
    String,
    Exception,
    Nil,
    Any,
}

impl Type {
    /// Promotion order for binary operands: Boolean < Integer < Real <
    /// String. Types outside the order never promote.
    pub fn precedence(self) -> Option<u8> {
        match self {
            Type::Boolean => Some(0),
            Type::Integer => Some(1),
            Type::Real => Some(2),
            Type::String => Some(3),
            Type::Exception | Type::Nil | Type::Any => None,
        }
    }
}

pub fn type_of(value: &Value) -> Type {
    match value {
        Value::Integer(_) => Type::Integer,
        Value::Real(_) => Type::Real,
        Value::Boolean(_) => Type::Boolean,
        Value::String(_) => Type::String,
        Value::Exception(_) => Type::Exception,
        Value::Nil => Type::Nil,
    }
}
