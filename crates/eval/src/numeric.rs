//! Value comparison for predicate evaluation.
//!
//! JSON numbers are compared as `rust_decimal::Decimal` so that `5`,
//! `5.0` and `5.00` are the same number and no binary float rounding
//! leaks into BIGGER/SMALLER. Numbers outside Decimal's range fall back
//! to `f64`.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Number, Value};

/// Convert a JSON number to Decimal, if it fits.
pub fn to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Order two JSON numbers.
pub fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    match (to_decimal(left), to_decimal(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

/// Equality used by EQUALS: numeric for number pairs, structural otherwise.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r) == Some(Ordering::Equal),
        _ => left == right,
    }
}

/// Ordering used by BIGGER and SMALLER.
///
/// Defined for number/number, string/string and bool/bool pairs. Every
/// other pairing (including null) is incomparable and returns `None`.
pub fn order_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_and_decimals_are_equal() {
        assert!(values_equal(&json!(5), &json!(5.0)));
        assert!(values_equal(&json!(0.1), &json!(0.10)));
        assert!(!values_equal(&json!(5), &json!(5.1)));
    }

    #[test]
    fn structural_equality_for_non_numbers() {
        assert!(values_equal(&json!("a"), &json!("a")));
        assert!(values_equal(&json!({"x": [1]}), &json!({"x": [1]})));
        assert!(!values_equal(&json!("5"), &json!(5)));
        assert!(!values_equal(&json!(null), &json!(0)));
    }

    #[test]
    fn decimal_ordering_is_exact() {
        assert_eq!(
            order_values(&json!(0.3), &json!(0.1 + 0.2)),
            Some(Ordering::Less)
        );
        assert_eq!(order_values(&json!(10), &json!(5)), Some(Ordering::Greater));
        assert_eq!(order_values(&json!(-1), &json!(u64::MAX)), Some(Ordering::Less));
    }

    #[test]
    fn string_and_bool_ordering() {
        assert_eq!(order_values(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(order_values(&json!(true), &json!(false)), Some(Ordering::Greater));
    }

    #[test]
    fn mixed_types_are_incomparable() {
        assert_eq!(order_values(&json!(null), &json!(5)), None);
        assert_eq!(order_values(&json!("10"), &json!(5)), None);
        assert_eq!(order_values(&json!([1]), &json!([0])), None);
    }

    #[test]
    fn huge_floats_fall_back_to_f64() {
        assert_eq!(
            order_values(&json!(1e300), &json!(1e299)),
            Some(Ordering::Greater)
        );
    }
}
