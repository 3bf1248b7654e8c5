//! Typed command arguments and results.
//!
//! Every command descriptor carries a [`ValueType`]. The protocol engine uses
//! [`ValueType::encode`] to render a Set argument into wire text and
//! [`ValueType::decode`] to turn the text captured from a Get response into a
//! [`Value`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LaserError, LaserResult};

/// Declared type of a command's argument (Set) or result (Get).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// The command takes no argument.
    #[default]
    None,
    /// Signed decimal integer.
    Integer,
    /// Decimal floating point number.
    Float,
    /// Free text without whitespace (IP addresses, firmware revisions).
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::None => "none",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

/// A value sent to or received from the laser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer reading or argument.
    Integer(i64),
    /// Floating point reading or argument.
    Float(f64),
    /// Text reading or argument.
    Text(String),
    /// Outcome of a Set command; always `true` on success.
    Bool(bool),
}

impl Value {
    /// Returns the integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a numeric payload widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the text payload, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a Set outcome.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl ValueType {
    /// Render `value` as wire text for this type.
    ///
    /// Returns `Ok(None)` for [`ValueType::None`], which carries no argument.
    /// Arguments are coerced first: a float given to an integer command is
    /// truncated toward zero, an integer given to a float command is widened,
    /// and text is parsed.
    pub fn encode(self, value: &Value) -> LaserResult<Option<String>> {
        let rendered = match self {
            ValueType::None => return Ok(None),
            ValueType::Integer => self.coerce_integer(value)?.to_string(),
            ValueType::Float => format_float(self.coerce_float(value)?),
            ValueType::String => value.to_string(),
        };
        Ok(Some(rendered))
    }

    /// Parse text captured from a Get response.
    pub fn decode(self, text: &str) -> LaserResult<Value> {
        match self {
            ValueType::Integer => text
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| self.format_error(text)),
            ValueType::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.format_error(text)),
            ValueType::String | ValueType::None => Ok(Value::Text(text.to_string())),
        }
    }

    fn coerce_integer(self, value: &Value) -> LaserResult<i64> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
            Value::Text(s) => s.trim().parse().map_err(|_| self.format_error(s)),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(self.format_error(&other.to_string())),
        }
    }

    fn coerce_float(self, value: &Value) -> LaserResult<f64> {
        let f = match value {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.trim().parse().map_err(|_| self.format_error(s))?,
            Value::Bool(b) => f64::from(u8::from(*b)),
        };
        if !f.is_finite() {
            return Err(self.format_error(&value.to_string()));
        }
        Ok(f)
    }

    fn format_error(self, text: &str) -> LaserError {
        LaserError::ValueFormat {
            value: text.to_string(),
            value_type: self,
        }
    }
}

/// Shortest round-trip text, always with a fractional part for integral values.
pub(crate) fn format_float(f: f64) -> String {
    let mut s = f.to_string();
    if f.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        assert_eq!(ValueType::Integer.encode(&Value::Integer(100)).unwrap(), Some("100".into()));
        assert_eq!(ValueType::Integer.encode(&Value::Float(12.9)).unwrap(), Some("12".into()));
        assert_eq!(ValueType::Integer.encode(&Value::from("-7")).unwrap(), Some("-7".into()));
    }

    #[test]
    fn test_encode_float() {
        assert_eq!(ValueType::Float.encode(&Value::Integer(100)).unwrap(), Some("100.0".into()));
        assert_eq!(ValueType::Float.encode(&Value::Float(12.5)).unwrap(), Some("12.5".into()));
        assert_eq!(ValueType::Float.encode(&Value::from("0.25")).unwrap(), Some("0.25".into()));
    }

    #[test]
    fn test_encode_string_is_verbatim() {
        let rendered = ValueType::String.encode(&Value::from("192.168.0.10")).unwrap();
        assert_eq!(rendered, Some("192.168.0.10".into()));
    }

    #[test]
    fn test_encode_none_has_no_argument() {
        assert_eq!(ValueType::None.encode(&Value::Integer(1)).unwrap(), None);
    }

    #[test]
    fn test_encode_rejects_bad_text() {
        let err = ValueType::Integer.encode(&Value::from("ten")).unwrap_err();
        assert!(matches!(
            err,
            LaserError::ValueFormat { value_type: ValueType::Integer, .. }
        ));
    }

    #[test]
    fn test_encode_rejects_non_finite_float() {
        assert!(ValueType::Float.encode(&Value::Float(f64::NAN)).is_err());
        assert!(ValueType::Integer.encode(&Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_decode() {
        assert_eq!(ValueType::Integer.decode("42").unwrap(), Value::Integer(42));
        assert_eq!(ValueType::Float.decode("12.34").unwrap(), Value::Float(12.34));
        assert_eq!(ValueType::Float.decode("3").unwrap(), Value::Float(3.0));
        assert_eq!(
            ValueType::String.decode("255.255.255.0").unwrap(),
            Value::Text("255.255.255.0".into())
        );
    }

    #[test]
    fn test_decode_failure_reports_text_and_type() {
        match ValueType::Integer.decode("12.5") {
            Err(LaserError::ValueFormat { value, value_type }) => {
                assert_eq!(value, "12.5");
                assert_eq!(value_type, ValueType::Integer);
            }
            other => panic!("expected ValueFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(100.0).to_string(), "100.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
    }
}
