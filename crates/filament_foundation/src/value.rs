//! The scalar value type rules compute with.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A runtime value produced or consumed during rule evaluation.
///
/// The rule language is deliberately small: every expression yields an
/// integer, a float, or null. Values are `Copy` and carry no heap state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// The null value (absence of a reading).
    Null,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
}

/// Type descriptor for a [`Value`], used in error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// The null type.
    Null,
    /// Integer type.
    Int,
    /// Float type.
    Float,
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
        }
    }

    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value is truthy.
    ///
    /// A value is truthy when it is numeric and non-zero; null is falsy.
    #[must_use]
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Null => false,
            Self::Int(n) => n != 0,
            Self::Float(f) => f != 0.0,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64`, coercing integers.
    ///
    /// Returns `None` for null.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Int(n) => Some(n as f64),
            Self::Float(f) => Some(f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}
