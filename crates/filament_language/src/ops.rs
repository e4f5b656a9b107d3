//! Static operator and function tables.
//!
//! The parser resolves names against these tables and the interpreter
//! dispatches through them. Both are plain `static` slices of definitions
//! carrying a callback, so an embedding can swap in its own tables without
//! touching the core.

#![allow(clippy::cast_precision_loss)]

use filament_foundation::{Error, ErrorKind, Result, Value, ValueType};

/// Operator associativity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Assoc {
    /// Left-to-right grouping (`a - b - c` is `(a - b) - c`).
    Left,
    /// Right-to-left grouping (`a ^ b ^ c` is `a ^ (b ^ c)`).
    Right,
}

/// Callback applying a binary operator to two values.
pub type OperatorFn = fn(Value, Value) -> Result<Value>;

/// One entry in the operator table.
#[derive(Clone, Copy)]
pub struct OperatorDef {
    /// Operator name, matched case-insensitively and by exact length.
    pub name: &'static str,
    /// Binding strength; higher binds tighter.
    pub precedence: u8,
    /// Associativity among equal-precedence neighbors.
    pub assoc: Assoc,
    /// The operator callback.
    pub apply: OperatorFn,
}

/// Accepted argument counts for a function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(u8),
    /// This many arguments or more.
    AtLeast(u8),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n as usize,
            Self::AtLeast(n) => count >= n as usize,
        }
    }

    /// Describes this arity for error messages.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Exact(n) => format!("{n}"),
            Self::AtLeast(n) => format!("at least {n}"),
        }
    }
}

/// Callback applying a function to its argument values.
pub type FunctionFn = fn(&[Value]) -> Result<Value>;

/// One entry in the function table.
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Function name, matched case-insensitively.
    pub name: &'static str,
    /// Accepted argument counts, checked at parse time.
    pub arity: Arity,
    /// The function callback.
    pub apply: FunctionFn,
}

/// The built-in operator table.
///
/// Precedence reproduces the usual arithmetic ordering; `^` is the only
/// right-associative operator. `and`/`or` are word aliases for `&&`/`||`.
pub static OPERATORS: &[OperatorDef] = &[
    OperatorDef { name: "^", precedence: 7, assoc: Assoc::Right, apply: op_pow },
    OperatorDef { name: "*", precedence: 6, assoc: Assoc::Left, apply: op_mul },
    OperatorDef { name: "/", precedence: 6, assoc: Assoc::Left, apply: op_div },
    OperatorDef { name: "%", precedence: 6, assoc: Assoc::Left, apply: op_rem },
    OperatorDef { name: "+", precedence: 5, assoc: Assoc::Left, apply: op_add },
    OperatorDef { name: "-", precedence: 5, assoc: Assoc::Left, apply: op_sub },
    OperatorDef { name: "<", precedence: 4, assoc: Assoc::Left, apply: op_lt },
    OperatorDef { name: "<=", precedence: 4, assoc: Assoc::Left, apply: op_le },
    OperatorDef { name: ">", precedence: 4, assoc: Assoc::Left, apply: op_gt },
    OperatorDef { name: ">=", precedence: 4, assoc: Assoc::Left, apply: op_ge },
    OperatorDef { name: "==", precedence: 3, assoc: Assoc::Left, apply: op_eq },
    OperatorDef { name: "!=", precedence: 3, assoc: Assoc::Left, apply: op_ne },
    OperatorDef { name: "&&", precedence: 2, assoc: Assoc::Left, apply: op_and },
    OperatorDef { name: "and", precedence: 2, assoc: Assoc::Left, apply: op_and },
    OperatorDef { name: "||", precedence: 1, assoc: Assoc::Left, apply: op_or },
    OperatorDef { name: "or", precedence: 1, assoc: Assoc::Left, apply: op_or },
];

/// The built-in function table.
pub static FUNCTIONS: &[FunctionDef] = &[
    FunctionDef { name: "min", arity: Arity::AtLeast(1), apply: fn_min },
    FunctionDef { name: "max", arity: Arity::AtLeast(1), apply: fn_max },
    FunctionDef { name: "coalesce", arity: Arity::AtLeast(1), apply: fn_coalesce },
    FunctionDef { name: "round", arity: Arity::Exact(1), apply: fn_round },
    FunctionDef { name: "floor", arity: Arity::Exact(1), apply: fn_floor },
    FunctionDef { name: "ceil", arity: Arity::Exact(1), apply: fn_ceil },
    FunctionDef { name: "abs", arity: Arity::Exact(1), apply: fn_abs },
    FunctionDef { name: "clamp", arity: Arity::Exact(3), apply: fn_clamp },
];

/// Resolves an operator name to its table index, case-insensitively.
#[must_use]
pub fn operator_index(table: &[OperatorDef], name: &str) -> Option<u8> {
    table
        .iter()
        .position(|def| def.name.eq_ignore_ascii_case(name))
        .and_then(|i| u8::try_from(i).ok())
}

/// Resolves a function name to its table index, case-insensitively.
#[must_use]
pub fn function_index(table: &[FunctionDef], name: &str) -> Option<u8> {
    table
        .iter()
        .position(|def| def.name.eq_ignore_ascii_case(name))
        .and_then(|i| u8::try_from(i).ok())
}

// =============================================================================
// Numeric helpers
// =============================================================================

/// Extracts a numeric value as `f64`, rejecting null.
fn numeric(value: Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::type_mismatch(ValueType::Int, value.value_type()))
}

fn overflow(operation: &str) -> Error {
    Error::new(ErrorKind::Overflow {
        operation: operation.to_string(),
    })
}

/// Comparison result as the DSL's 0/1 integer convention.
fn bool_value(b: bool) -> Value {
    Value::Int(i64::from(b))
}

// =============================================================================
// Operator callbacks
// =============================================================================

fn op_add(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_add(y).map(Value::Int).ok_or_else(|| overflow("+"))
        }
        _ => Ok(Value::Float(numeric(a)? + numeric(b)?)),
    }
}

fn op_sub(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_sub(y).map(Value::Int).ok_or_else(|| overflow("-"))
        }
        _ => Ok(Value::Float(numeric(a)? - numeric(b)?)),
    }
}

fn op_mul(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_mul(y).map(Value::Int).ok_or_else(|| overflow("*"))
        }
        _ => Ok(Value::Float(numeric(a)? * numeric(b)?)),
    }
}

fn op_div(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                x.checked_div(y).map(Value::Int).ok_or_else(|| overflow("/"))
            }
        }
        _ => {
            let divisor = numeric(b)?;
            if divisor == 0.0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                Ok(Value::Float(numeric(a)? / divisor))
            }
        }
    }
}

fn op_rem(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                x.checked_rem(y).map(Value::Int).ok_or_else(|| overflow("%"))
            }
        }
        _ => {
            let divisor = numeric(b)?;
            if divisor == 0.0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                Ok(Value::Float(numeric(a)? % divisor))
            }
        }
    }
}

fn op_pow(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) if y >= 0 => {
            let exp = u32::try_from(y).map_err(|_| overflow("^"))?;
            x.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow("^"))
        }
        _ => Ok(Value::Float(numeric(a)?.powf(numeric(b)?))),
    }
}

fn op_lt(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(numeric(a)? < numeric(b)?))
}

fn op_le(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(numeric(a)? <= numeric(b)?))
}

fn op_gt(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(numeric(a)? > numeric(b)?))
}

fn op_ge(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(numeric(a)? >= numeric(b)?))
}

/// Equality: null equals only null; numbers compare with coercion.
fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => a.as_f64() == b.as_f64(),
    }
}

fn op_eq(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(values_equal(a, b)))
}

fn op_ne(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(!values_equal(a, b)))
}

fn op_and(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(a.is_truthy() && b.is_truthy()))
}

fn op_or(a: Value, b: Value) -> Result<Value> {
    Ok(bool_value(a.is_truthy() || b.is_truthy()))
}

// =============================================================================
// Function callbacks
// =============================================================================

/// Folds the numerically smallest/largest argument, keeping its original
/// representation.
fn fold_extreme(args: &[Value], prefer_less: bool) -> Result<Value> {
    let mut best = args[0];
    let mut best_key = numeric(best)?;
    for &arg in &args[1..] {
        let key = numeric(arg)?;
        if (prefer_less && key < best_key) || (!prefer_less && key > best_key) {
            best = arg;
            best_key = key;
        }
    }
    Ok(best)
}

fn fn_min(args: &[Value]) -> Result<Value> {
    fold_extreme(args, true)
}

fn fn_max(args: &[Value]) -> Result<Value> {
    fold_extreme(args, false)
}

fn fn_coalesce(args: &[Value]) -> Result<Value> {
    Ok(args
        .iter()
        .copied()
        .find(|v| !v.is_null())
        .unwrap_or(Value::Null))
}

fn fn_round(args: &[Value]) -> Result<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        v => Ok(Value::Float(numeric(v)?.round())),
    }
}

fn fn_floor(args: &[Value]) -> Result<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        v => Ok(Value::Float(numeric(v)?.floor())),
    }
}

fn fn_ceil(args: &[Value]) -> Result<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        v => Ok(Value::Float(numeric(v)?.ceil())),
    }
}

fn fn_abs(args: &[Value]) -> Result<Value> {
    match args[0] {
        Value::Int(n) => n.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs")),
        v => Ok(Value::Float(numeric(v)?.abs())),
    }
}

fn fn_clamp(args: &[Value]) -> Result<Value> {
    let x = numeric(args[0])?;
    let lo = numeric(args[1])?;
    let hi = numeric(args[2])?;
    if x < lo {
        Ok(args[1])
    } else if x > hi {
        Ok(args[2])
    } else {
        Ok(args[0])
    }
}
