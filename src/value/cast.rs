use super::{truthy, type_of, Type, Value};
use crate::{exception::Exception, fault::Interrupt, fault::RuntimeFault};

/// Strictly convert a value to another type. Only the promotions the
/// operator table relies on are permitted; everything else is a TypeError.
/// Casting into Any is an internal error and faults.
pub fn cast(value: Value, to: Type) -> Result<Value, Interrupt> {
    let from = type_of(&value);
    if from == to {
        return Ok(value);
    }
    if to == Type::Any {
        return Err(RuntimeFault::new(format!("Cannot cast {} into Any", from)).into());
    }
    if to == Type::Boolean {
        return Ok(Value::Boolean(truthy(&value)));
    }
    match (value, to) {
        (Value::Boolean(b), Type::Integer) => Ok(Value::Integer(b as i64)),
        (Value::Boolean(b), Type::Real) => Ok(Value::Real(if b { 1.0 } else { 0.0 })),
        (Value::Integer(i), Type::Real) => Ok(Value::Real(i as f64)),
        // reals round down, so -2.5 becomes -3
        (Value::Real(r), Type::Integer) => Ok(Value::Integer(r.floor() as i64)),
        (value, to) => Err(Exception::type_error(
            format!("Cannot cast {} into {}", from, to),
            value,
            to,
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionKind;
    use pretty_assertions::assert_eq;

    fn cast_ok(value: Value, to: Type) -> Value {
        cast(value, to).unwrap()
    }

    #[test]
    fn identity_casts_pass_through() {
        assert_eq!(cast_ok(Value::Integer(3), Type::Integer), Value::Integer(3));
        assert_eq!(cast_ok(Value::from("s"), Type::String), Value::from("s"));
        assert_eq!(cast_ok(Value::Nil, Type::Nil), Value::Nil);
    }

    #[test]
    fn numeric_promotions() {
        assert_eq!(cast_ok(Value::Boolean(true), Type::Integer), Value::Integer(1));
        assert_eq!(cast_ok(Value::Boolean(false), Type::Real), Value::Real(0.0));
        assert_eq!(cast_ok(Value::Integer(2), Type::Real), Value::Real(2.0));
        assert_eq!(cast_ok(Value::Real(2.75), Type::Integer), Value::Integer(2));
        assert_eq!(cast_ok(Value::Real(-2.5), Type::Integer), Value::Integer(-3));
    }

    #[test]
    fn everything_casts_to_boolean_by_truthiness() {
        assert_eq!(cast_ok(Value::Integer(0), Type::Boolean), Value::Boolean(false));
        assert_eq!(cast_ok(Value::from("x"), Type::Boolean), Value::Boolean(true));
        assert_eq!(cast_ok(Value::Nil, Type::Boolean), Value::Boolean(false));
    }

    #[test]
    fn string_to_number_is_a_type_error() {
        match cast(Value::from("12"), Type::Integer) {
            Err(Interrupt::Exception(exception)) => {
                assert!(matches!(exception.kind, ExceptionKind::Type { .. }));
                assert_eq!(exception.message, "Cannot cast String into Integer");
            }
            other => panic!("expected TypeError, got {:?}", other),
        }
    }

    #[test]
    fn cast_to_any_faults() {
        assert!(matches!(
            cast(Value::Integer(1), Type::Any),
            Err(Interrupt::Fault(_))
        ));
    }
}
