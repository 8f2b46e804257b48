//! The binary and unary operator table. Operands promote to the higher
//! precedence type (Boolean < Integer < Real < String) where the operator
//! allows it; anything else is a TypeError carrying both operand types.

use std::cmp::Ordering;

use crate::{
    exception::Exception,
    fault::Interrupt,
    value::{falsey, type_of, Type, Value},
};

pub fn add(a: Value, b: Value) -> Result<Value, Interrupt> {
    match (&a, &b) {
        (Value::String(left), Value::String(right)) => {
            Ok(Value::from(format!("{}{}", left, right)))
        }
        _ => match numeric_operands("+", a, b)? {
            Nums::Integers(x, y) => Ok(Value::Integer(x + y)),
            Nums::Reals(x, y) => Ok(Value::Real(x + y)),
        },
    }
}

pub fn sub(a: Value, b: Value) -> Result<Value, Interrupt> {
    match numeric_operands("-", a, b)? {
        Nums::Integers(x, y) => Ok(Value::Integer(x - y)),
        Nums::Reals(x, y) => Ok(Value::Real(x - y)),
    }
}

pub fn mul(a: Value, b: Value) -> Result<Value, Interrupt> {
    match numeric_operands("*", a, b)? {
        Nums::Integers(x, y) => Ok(Value::Integer(x * y)),
        Nums::Reals(x, y) => Ok(Value::Real(x * y)),
    }
}

/// Division always promotes to Real, so `1 / 2` is `0.5`. The divisor is
/// checked before the promotion happens, which keeps the original operands
/// intact on the resulting ZeroDivisionError.
pub fn div(a: Value, b: Value) -> Result<Value, Interrupt> {
    if !is_numeric(&a) || !is_numeric(&b) {
        return Err(promotion_type_error("/", a, b));
    }
    if is_zero(&b) {
        return Err(Exception::zero_division(a, b).into());
    }
    let x = as_real(a);
    let y = as_real(b);
    Ok(Value::Real(x / y))
}

/// Equality is total: values of non-promotable types are simply unequal,
/// never an error. Only Integer and Real promote for comparison.
pub fn eq(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(values_equal(&a, &b)))
}

pub fn ne(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(!values_equal(&a, &b)))
}

pub fn gt(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(matches!(
        order_operands(">", a, b)?,
        Some(Ordering::Greater)
    )))
}

pub fn ge(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(matches!(
        order_operands(">=", a, b)?,
        Some(Ordering::Greater) | Some(Ordering::Equal)
    )))
}

pub fn lt(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(matches!(
        order_operands("<", a, b)?,
        Some(Ordering::Less)
    )))
}

pub fn le(a: Value, b: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(matches!(
        order_operands("<=", a, b)?,
        Some(Ordering::Less) | Some(Ordering::Equal)
    )))
}

pub fn neg(a: Value) -> Result<Value, Interrupt> {
    match a {
        Value::Integer(i) => Ok(Value::Integer(-i)),
        Value::Real(r) => Ok(Value::Real(-r)),
        Value::Boolean(b) => Ok(Value::Integer(-(b as i64))),
        a => {
            let from = type_of(&a);
            Err(Exception::type_error(
                format!("Unsupported operand type for -: {}", from),
                a,
                Type::Real,
            )
            .into())
        }
    }
}

/// Logical negation goes through truthiness, so it applies to any value.
pub fn not(a: Value) -> Result<Value, Interrupt> {
    Ok(Value::Boolean(falsey(&a)))
}

enum Nums {
    Integers(i64, i64),
    Reals(f64, f64),
}

fn numeric_operands(op: &str, a: Value, b: Value) -> Result<Nums, Interrupt> {
    if !is_numeric(&a) || !is_numeric(&b) {
        return Err(promotion_type_error(op, a, b));
    }
    if matches!(&a, Value::Real(_)) || matches!(&b, Value::Real(_)) {
        Ok(Nums::Reals(as_real(a), as_real(b)))
    } else {
        Ok(Nums::Integers(as_integer(a), as_integer(b)))
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(
        value,
        Value::Integer(_) | Value::Real(_) | Value::Boolean(_)
    )
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Integer(i) => *i == 0,
        Value::Real(r) => *r == 0.0,
        Value::Boolean(b) => !b,
        _ => false,
    }
}

fn as_integer(value: Value) -> i64 {
    match value {
        Value::Integer(i) => i,
        Value::Real(r) => r.floor() as i64,
        Value::Boolean(b) => b as i64,
        _ => 0,
    }
}

fn as_real(value: Value) -> f64 {
    match value {
        Value::Integer(i) => i as f64,
        Value::Real(r) => r,
        Value::Boolean(b) => b as i64 as f64,
        _ => 0.0,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Real(y)) | (Value::Real(y), Value::Integer(x)) => {
            *x as f64 == *y
        }
        _ => a == b,
    }
}

fn order_operands(op: &str, a: Value, b: Value) -> Result<Option<Ordering>, Interrupt> {
    match (&a, &b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(Some(x.cmp(y))),
        (Value::Integer(x), Value::Real(y)) => Ok((*x as f64).partial_cmp(y)),
        (Value::Real(x), Value::Integer(y)) => Ok(x.partial_cmp(&(*y as f64))),
        (Value::Real(x), Value::Real(y)) => Ok(x.partial_cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Ok(Some(x.cmp(y))),
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        _ => Err(promotion_type_error(op, a, b)),
    }
}

/// The standard shape for operand type mismatches. The value carried on the
/// exception is the operand that failed to promote.
fn promotion_type_error(op: &str, a: Value, b: Value) -> Interrupt {
    let type_a = type_of(&a);
    let type_b = type_of(&b);
    let message = format!("Unsupported operand types for {}: {} and {}", op, type_a, type_b);
    let (value, to_type) = match (type_a.precedence(), type_b.precedence()) {
        (Some(pa), Some(pb)) if pa <= pb => (a, type_b),
        (Some(_), Some(_)) => (b, type_a),
        (None, _) => (a, type_b),
        (_, None) => (b, type_a),
    };
    Exception::type_error(message, value, to_type).into()
}
