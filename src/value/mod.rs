mod cast;
mod convert;
mod truthiness;
mod types;

pub use cast::cast;
pub use convert::into_type;
pub use truthiness::{falsey, truthy};
pub use types::{type_of, Type};

use std::fmt::Display;
use std::rc::Rc;

use crate::exception::Exception;

/// A runtime value. Scalar variants are unboxed; strings and exceptions are
/// reference-counted so stack and globals stay cheap to clone.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(Rc<str>),
    Exception(Rc<Exception>),
    Nil,
}

/// Structural equality, used by tests and the constant pool. Language-level
/// equality (with numeric promotion) lives in the operations module.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Nil, Value::Nil) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{}", value),
            Value::Boolean(true) => write!(f, "true"),
            Value::Boolean(false) => write!(f, "false"),
            Value::String(value) => write!(f, "{}", value),
            Value::Exception(exception) => write!(f, "{}", exception),
            Value::Nil => write!(f, "nil"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}
impl From<Exception> for Value {
    fn from(exception: Exception) -> Self {
        Value::Exception(Rc::new(exception))
    }
}
