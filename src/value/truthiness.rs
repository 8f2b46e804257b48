use super::Value;

/// Whether a value counts as true in a condition. Zero, the empty string and
/// nil are false; exceptions are always true so a caught error never
/// silently disappears in a conditional.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Integer(i) => *i != 0,
        Value::Real(r) => *r != 0.0,
        Value::Boolean(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Exception(_) => true,
        Value::Nil => false,
    }
}

pub fn falsey(value: &Value) -> bool {
    !truthy(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::Exception;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_values_are_false() {
        assert_eq!(truthy(&Value::Integer(0)), false);
        assert_eq!(truthy(&Value::Real(0.0)), false);
        assert_eq!(truthy(&Value::from("")), false);
        assert_eq!(truthy(&Value::Boolean(false)), false);
        assert_eq!(truthy(&Value::Nil), false);
    }

    #[test]
    fn non_zero_values_are_true() {
        assert_eq!(truthy(&Value::Integer(-1)), true);
        assert_eq!(truthy(&Value::Real(0.25)), true);
        assert_eq!(truthy(&Value::from("false")), true);
        assert_eq!(truthy(&Value::Boolean(true)), true);
    }

    #[test]
    fn exceptions_are_always_true() {
        let exception = Value::from(Exception::runtime("oops"));
        assert_eq!(truthy(&exception), true);
        assert_eq!(falsey(&exception), false);
    }
}
