//! Constant folding over literal values with JavaScript semantics.
//!
//! These functions operate purely on `SchemaLiteral`s and know nothing about
//! syntax or unions. A `None` result means the operation cannot be folded
//! (it would throw at runtime, or mixes `bigint` with other kinds); callers
//! keep such expressions symbolic.

use crate::schema::SchemaLiteral;
use std::cmp::Ordering;
use tsn_host::{BinaryOperator, UnaryOperator};

// =============================================================================
// Coercions
// =============================================================================

/// `Number::toString()` for radix 10.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e3`.
    let formatted = format!("{:e}", value.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let exp_sign = if n - 1 < 0 { '-' } else { '+' };
        let exp = (n - 1).abs();
        if k == 1 {
            format!("{digits}e{exp_sign}{exp}")
        } else {
            let (first, rest) = digits.split_at(1);
            format!("{first}.{rest}e{exp_sign}{exp}")
        }
    };
    format!("{sign}{body}")
}

/// `ToString` applied to a primitive literal.
pub fn to_js_string(value: &SchemaLiteral) -> String {
    match value {
        SchemaLiteral::String(s) => s.clone(),
        SchemaLiteral::Number(n) => number_to_string(*n),
        SchemaLiteral::BigInt(digits) => digits.clone(),
        SchemaLiteral::Boolean(b) => b.to_string(),
        SchemaLiteral::Null => "null".to_string(),
        SchemaLiteral::Undefined => "undefined".to_string(),
    }
}

/// `StringToNumber`: whitespace-trimmed decimal, hex/octal/binary, `Infinity`.
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let prefixed = |prefix: &[&str], radix: u32| {
        prefix
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .map(|digits| radix_digits_to_number(digits, radix))
    };
    if let Some(v) = prefixed(&["0x", "0X"], 16)
        .or_else(|| prefixed(&["0o", "0O"], 8))
        .or_else(|| prefixed(&["0b", "0B"], 2))
    {
        return v;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) =>
        {
            trimmed.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

/// Digits after a `0x`/`0o`/`0b` prefix. Accumulates in `f64`, so literals
/// wider than 64 bits still give the nearest finite value.
fn radix_digits_to_number(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            return f64::NAN;
        };
        value = value * f64::from(radix) + f64::from(digit);
    }
    value
}

/// `ToNumber`; `None` for `bigint`, which throws when implicitly converted.
pub fn to_number(value: &SchemaLiteral) -> Option<f64> {
    match value {
        SchemaLiteral::String(s) => Some(string_to_number(s)),
        SchemaLiteral::Number(n) => Some(*n),
        SchemaLiteral::BigInt(_) => None,
        SchemaLiteral::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        SchemaLiteral::Null => Some(0.0),
        SchemaLiteral::Undefined => Some(f64::NAN),
    }
}

pub fn is_truthy(value: &SchemaLiteral) -> bool {
    match value {
        SchemaLiteral::String(s) => !s.is_empty(),
        SchemaLiteral::Number(n) => *n != 0.0 && !n.is_nan(),
        SchemaLiteral::BigInt(digits) => parse_bigint(digits).is_none_or(|v| v != 0),
        SchemaLiteral::Boolean(b) => *b,
        SchemaLiteral::Null | SchemaLiteral::Undefined => false,
    }
}

pub fn type_of(value: &SchemaLiteral) -> &'static str {
    match value {
        SchemaLiteral::String(_) => "string",
        SchemaLiteral::Number(_) => "number",
        SchemaLiteral::BigInt(_) => "bigint",
        SchemaLiteral::Boolean(_) => "boolean",
        SchemaLiteral::Null => "object",
        SchemaLiteral::Undefined => "undefined",
    }
}

/// `ToInt32`.
pub fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

/// `ToUint32`.
pub fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Parse bigint literal text (`123`, `0x1f`, `1_000`, optional `n` suffix)
/// into an `i128`. Values that do not fit are left unfoldable.
pub fn parse_bigint(text: &str) -> Option<i128> {
    let cleaned = text.strip_suffix('n').unwrap_or(text).replace('_', "");
    let negative = cleaned.starts_with('-');
    let text = cleaned.trim_start_matches('-');
    let value = match text.get(..2) {
        Some("0x" | "0X") => i128::from_str_radix(&text[2..], 16).ok()?,
        Some("0o" | "0O") => i128::from_str_radix(&text[2..], 8).ok()?,
        Some("0b" | "0B") => i128::from_str_radix(&text[2..], 2).ok()?,
        _ => text.parse().ok()?,
    };
    Some(if negative { -value } else { value })
}

/// Canonical decimal text for bigint literal source text.
pub fn normalize_bigint(text: &str) -> String {
    parse_bigint(text).map_or_else(
        || text.strip_suffix('n').unwrap_or(text).to_string(),
        |v| v.to_string(),
    )
}

// =============================================================================
// Binary
// =============================================================================

pub fn fold_binary(
    op: BinaryOperator,
    left: &SchemaLiteral,
    right: &SchemaLiteral,
) -> Option<SchemaLiteral> {
    use BinaryOperator as Op;
    match op {
        Op::LogicalAnd => Some(if is_truthy(left) { right } else { left }.clone()),
        Op::LogicalOr => Some(if is_truthy(left) { left } else { right }.clone()),
        Op::NullishCoalescing => Some(if left.is_nullish() { right } else { left }.clone()),
        Op::Comma => Some(right.clone()),
        Op::Add => fold_add(left, right),
        Op::Subtract
        | Op::Multiply
        | Op::Divide
        | Op::Remainder
        | Op::Exponent
        | Op::BitwiseAnd
        | Op::BitwiseOr
        | Op::BitwiseXor
        | Op::LeftShift
        | Op::RightShift
        | Op::UnsignedRightShift => fold_numeric(op, left, right),
        Op::StrictEquals => Some(SchemaLiteral::Boolean(strict_equals(left, right))),
        Op::StrictNotEquals => Some(SchemaLiteral::Boolean(!strict_equals(left, right))),
        Op::Equals => loose_equals(left, right).map(SchemaLiteral::Boolean),
        Op::NotEquals => loose_equals(left, right).map(|eq| SchemaLiteral::Boolean(!eq)),
        Op::LessThan | Op::GreaterThan | Op::LessThanEquals | Op::GreaterThanEquals => {
            let result = match (op, compare(left, right)?) {
                (_, None) => false,
                (Op::LessThan, Some(o)) => o == Ordering::Less,
                (Op::GreaterThan, Some(o)) => o == Ordering::Greater,
                (Op::LessThanEquals, Some(o)) => o != Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            };
            Some(SchemaLiteral::Boolean(result))
        }
        // `in` and `instanceof` need an object on the right.
        Op::In | Op::InstanceOf => None,
    }
}

fn fold_add(left: &SchemaLiteral, right: &SchemaLiteral) -> Option<SchemaLiteral> {
    if matches!(left, SchemaLiteral::String(_)) || matches!(right, SchemaLiteral::String(_)) {
        return Some(SchemaLiteral::String(format!(
            "{}{}",
            to_js_string(left),
            to_js_string(right)
        )));
    }
    fold_numeric(BinaryOperator::Add, left, right)
}

fn fold_numeric(
    op: BinaryOperator,
    left: &SchemaLiteral,
    right: &SchemaLiteral,
) -> Option<SchemaLiteral> {
    match (left, right) {
        (SchemaLiteral::BigInt(a), SchemaLiteral::BigInt(b)) => {
            fold_bigint(op, parse_bigint(a)?, parse_bigint(b)?)
                .map(|v| SchemaLiteral::BigInt(v.to_string()))
        }
        (SchemaLiteral::BigInt(_), _) | (_, SchemaLiteral::BigInt(_)) => None,
        _ => fold_number(op, to_number(left)?, to_number(right)?).map(SchemaLiteral::Number),
    }
}

fn fold_number(op: BinaryOperator, a: f64, b: f64) -> Option<f64> {
    use BinaryOperator as Op;
    let shift = |b: f64| to_uint32(b) & 31;
    Some(match op {
        Op::Add => a + b,
        Op::Subtract => a - b,
        Op::Multiply => a * b,
        Op::Divide => a / b,
        Op::Remainder => a % b,
        Op::Exponent => {
            if b.is_nan() || (a.abs() == 1.0 && b.is_infinite()) {
                f64::NAN
            } else {
                a.powf(b)
            }
        }
        Op::BitwiseAnd => f64::from(to_int32(a) & to_int32(b)),
        Op::BitwiseOr => f64::from(to_int32(a) | to_int32(b)),
        Op::BitwiseXor => f64::from(to_int32(a) ^ to_int32(b)),
        Op::LeftShift => f64::from(to_int32(a).wrapping_shl(shift(b))),
        Op::RightShift => f64::from(to_int32(a).wrapping_shr(shift(b))),
        Op::UnsignedRightShift => f64::from(to_uint32(a).wrapping_shr(shift(b))),
        _ => return None,
    })
}

fn fold_bigint(op: BinaryOperator, a: i128, b: i128) -> Option<i128> {
    use BinaryOperator as Op;
    match op {
        Op::Add => a.checked_add(b),
        Op::Subtract => a.checked_sub(b),
        Op::Multiply => a.checked_mul(b),
        Op::Divide => a.checked_div(b),
        Op::Remainder => a.checked_rem(b),
        Op::Exponent => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        Op::BitwiseAnd => Some(a & b),
        Op::BitwiseOr => Some(a | b),
        Op::BitwiseXor => Some(a ^ b),
        Op::LeftShift => bigint_shift_left(a, b),
        Op::RightShift => bigint_shift_right(a, b),
        // `>>>` throws for bigint.
        _ => None,
    }
}

/// `a << b`; a negative count shifts right. `None` when the result does not
/// fit in 128 bits.
fn bigint_shift_left(a: i128, b: i128) -> Option<i128> {
    if b < 0 {
        return bigint_shift_right(a, b.checked_neg()?);
    }
    let Ok(count) = u32::try_from(b) else {
        return (a == 0).then_some(0);
    };
    if count >= 128 {
        return (a == 0).then_some(0);
    }
    let shifted = a << count;
    (shifted >> count == a).then_some(shifted)
}

/// `a >> b`, rounding toward negative infinity; a negative count shifts left.
fn bigint_shift_right(a: i128, b: i128) -> Option<i128> {
    if b < 0 {
        return bigint_shift_left(a, b.checked_neg()?);
    }
    let count = u32::try_from(b).map_or(127, |c| c.min(127));
    Some(a >> count)
}

pub fn strict_equals(left: &SchemaLiteral, right: &SchemaLiteral) -> bool {
    match (left, right) {
        (SchemaLiteral::Number(a), SchemaLiteral::Number(b)) => a == b,
        (SchemaLiteral::String(a), SchemaLiteral::String(b)) => a == b,
        (SchemaLiteral::BigInt(a), SchemaLiteral::BigInt(b)) => {
            match (parse_bigint(a), parse_bigint(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            }
        }
        (SchemaLiteral::Boolean(a), SchemaLiteral::Boolean(b)) => a == b,
        (SchemaLiteral::Null, SchemaLiteral::Null)
        | (SchemaLiteral::Undefined, SchemaLiteral::Undefined) => true,
        _ => false,
    }
}

/// `==`. `None` when a bigint operand could not be parsed.
pub fn loose_equals(left: &SchemaLiteral, right: &SchemaLiteral) -> Option<bool> {
    use SchemaLiteral as L;
    if std::mem::discriminant(left) == std::mem::discriminant(right) {
        return Some(strict_equals(left, right));
    }
    Some(match (left, right) {
        (L::Null | L::Undefined, L::Null | L::Undefined) => true,
        (L::Null | L::Undefined, _) | (_, L::Null | L::Undefined) => false,
        (L::BigInt(a), other) | (other, L::BigInt(a)) => {
            let big = parse_bigint(a)? as f64;
            match other {
                L::String(s) => parse_bigint(s.trim()).is_some_and(|v| v as f64 == big),
                _ => to_number(other).is_some_and(|n| n == big),
            }
        }
        _ => to_number(left)? == to_number(right)?,
    })
}

/// Abstract relational comparison. The inner `None` is the "undefined"
/// outcome (a `NaN` operand), which makes every relational operator false.
fn compare(left: &SchemaLiteral, right: &SchemaLiteral) -> Option<Option<Ordering>> {
    if let (SchemaLiteral::String(a), SchemaLiteral::String(b)) = (left, right) {
        return Some(Some(a.encode_utf16().cmp(b.encode_utf16())));
    }
    if let (SchemaLiteral::BigInt(a), SchemaLiteral::BigInt(b)) = (left, right) {
        return Some(Some(parse_bigint(a)?.cmp(&parse_bigint(b)?)));
    }
    let as_number = |value: &SchemaLiteral| match value {
        SchemaLiteral::BigInt(digits) => parse_bigint(digits).map(|v| v as f64),
        other => to_number(other),
    };
    Some(as_number(left)?.partial_cmp(&as_number(right)?))
}

// =============================================================================
// Unary
// =============================================================================

/// Fold a prefix (`postfix == false`) or postfix unary operator. Postfix
/// `++`/`--` produce the operand's old value coerced to a number.
pub fn fold_unary(op: UnaryOperator, operand: &SchemaLiteral, postfix: bool) -> Option<SchemaLiteral> {
    use UnaryOperator as Op;
    if let SchemaLiteral::BigInt(digits) = operand {
        let v = parse_bigint(digits)?;
        let result = match op {
            Op::Minus => v.checked_neg()?,
            Op::Tilde => !v,
            Op::PlusPlus if !postfix => v.checked_add(1)?,
            Op::MinusMinus if !postfix => v.checked_sub(1)?,
            Op::PlusPlus | Op::MinusMinus => v,
            // Unary plus throws on bigint.
            Op::Plus => return None,
            Op::Exclamation | Op::TypeOf | Op::Void => return fold_unary_generic(op, operand),
        };
        return Some(SchemaLiteral::BigInt(result.to_string()));
    }
    match op {
        Op::Plus => to_number(operand).map(SchemaLiteral::Number),
        Op::Minus => to_number(operand).map(|n| SchemaLiteral::Number(-n)),
        Op::Tilde => to_number(operand).map(|n| SchemaLiteral::Number(f64::from(!to_int32(n)))),
        Op::PlusPlus | Op::MinusMinus => {
            let n = to_number(operand)?;
            let delta = if matches!(op, Op::PlusPlus) { 1.0 } else { -1.0 };
            Some(SchemaLiteral::Number(if postfix { n } else { n + delta }))
        }
        Op::Exclamation | Op::TypeOf | Op::Void => fold_unary_generic(op, operand),
    }
}

fn fold_unary_generic(op: UnaryOperator, operand: &SchemaLiteral) -> Option<SchemaLiteral> {
    match op {
        UnaryOperator::Exclamation => Some(SchemaLiteral::Boolean(!is_truthy(operand))),
        UnaryOperator::TypeOf => Some(SchemaLiteral::String(type_of(operand).to_string())),
        UnaryOperator::Void => Some(SchemaLiteral::Undefined),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/literal_ops_tests.rs"]
mod literal_ops_tests;
