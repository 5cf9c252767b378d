//! Undefined-aware numeric value.
//!
//! Every numeric cell in a candle or feature table is either a finite number
//! or `Undefined`. Undefined propagates through all arithmetic, so a missing
//! input can never silently turn into a zero downstream.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    Number(f64),
    #[default]
    Undefined,
}

impl Value {
    /// Build from a raw float. NaN and infinities become `Undefined`.
    pub fn new(x: f64) -> Self {
        if x.is_finite() {
            Value::Number(x)
        } else {
            Value::Undefined
        }
    }

    /// Coerce a raw text cell. Anything that does not parse as a finite
    /// float becomes `Undefined` rather than an error.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map(Value::new)
            .unwrap_or(Value::Undefined)
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_undefined(&self) -> bool {
        !self.is_defined()
    }

    pub fn to_option(self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(x),
            Value::Undefined => None,
        }
    }

    /// Natural log; undefined for zero, negative or undefined input.
    pub fn ln(self) -> Self {
        match self {
            Value::Number(x) if x > 0.0 => Value::new(x.ln()),
            _ => Value::Undefined,
        }
    }

    /// Maps an exact zero to `Undefined`, leaving everything else untouched.
    pub fn zero_as_undefined(self) -> Self {
        match self {
            Value::Number(x) if x == 0.0 => Value::Undefined,
            other => other,
        }
    }

    fn zip_with(self, rhs: Value, f: impl FnOnce(f64, f64) -> f64) -> Value {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Value::new(f(a, b)),
            _ => Value::Undefined,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::new(x)
    }
}

impl From<Option<f64>> for Value {
    fn from(x: Option<f64>) -> Self {
        x.map(Value::new).unwrap_or(Value::Undefined)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{x}"),
            Value::Undefined => f.write_str("undefined"),
        }
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Div for Value {
    type Output = Value;

    /// Division by zero is undefined, never infinite.
    fn div(self, rhs: Value) -> Value {
        match rhs {
            Value::Number(b) if b == 0.0 => Value::Undefined,
            _ => self.zip_with(rhs, |a, b| a / b),
        }
    }
}

impl Div<f64> for Value {
    type Output = Value;

    fn div(self, rhs: f64) -> Value {
        self / Value::new(rhs)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<f64>::deserialize(deserializer).map(Value::from)
    }
}
