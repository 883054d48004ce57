//! Declared value types of leaf fields and their coercion rules.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

/// Scalar element type of a typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateOnly,
}

/// Expected type of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Scalar(ScalarType),
    /// Any JSON value, passed through unchanged.
    Json,
    /// Array whose elements are all of one scalar type.
    Array(ScalarType),
}

impl ScalarType {
    fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        // `STRING(255)`, `DECIMAL(10, 2)` and friends carry a size suffix.
        let base = upper.split('(').next().unwrap_or("").trim();
        match base {
            "STRING" | "TEXT" | "CHAR" | "CITEXT" | "UUID" | "ENUM" => Some(ScalarType::String),
            "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => {
                Some(ScalarType::Integer)
            }
            "FLOAT" | "DOUBLE" | "REAL" | "DECIMAL" | "NUMBER" => Some(ScalarType::Float),
            "BOOLEAN" => Some(ScalarType::Boolean),
            "DATE" => Some(ScalarType::Date),
            "DATEONLY" => Some(ScalarType::DateOnly),
            _ => None,
        }
    }

    /// Catalog key of the message reported when coercion fails.
    pub fn message_key(&self) -> &'static str {
        match self {
            ScalarType::String => "isString",
            ScalarType::Integer => "isInt",
            ScalarType::Float => "isFloat",
            ScalarType::Boolean => "isBoolean",
            ScalarType::Date | ScalarType::DateOnly => "isDate",
        }
    }

    /// Coerce a single value, `None` when it cannot represent this type.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ScalarType::String => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            ScalarType::Integer => coerce_integer(value).map(|i| Value::Number(i.into())),
            ScalarType::Float => coerce_float(value)
                .and_then(Number::from_f64)
                .map(Value::Number),
            ScalarType::Boolean => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) => match s.trim() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(Value::Bool(true)),
                    Some(0) => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            ScalarType::Date => parse_datetime(value).map(|dt| {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }),
            ScalarType::DateOnly => parse_datetime(value)
                .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string())),
        }
    }
}

impl DataType {
    pub const STRING: DataType = DataType::Scalar(ScalarType::String);
    pub const INTEGER: DataType = DataType::Scalar(ScalarType::Integer);
    pub const FLOAT: DataType = DataType::Scalar(ScalarType::Float);
    pub const BOOLEAN: DataType = DataType::Scalar(ScalarType::Boolean);
    pub const DATE: DataType = DataType::Scalar(ScalarType::Date);
    pub const DATEONLY: DataType = DataType::Scalar(ScalarType::DateOnly);

    /// Parse a declarative type name such as `STRING`, `INTEGER(11)` or
    /// `ARRAY(STRING)`. Names are case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if upper == "JSON" || upper == "JSONB" {
            return Some(DataType::Json);
        }
        if let Some(inner) = upper
            .strip_prefix("ARRAY(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return ScalarType::from_name(inner).map(DataType::Array);
        }
        ScalarType::from_name(&upper).map(DataType::Scalar)
    }

    /// Catalog key of the message reported when coercion fails.
    pub fn message_key(&self) -> &'static str {
        match self {
            DataType::Scalar(s) => s.message_key(),
            DataType::Json => "default",
            DataType::Array(_) => "isArray",
        }
    }

    /// Coerce a validated value to this type.
    ///
    /// Arrays are coerced element-wise; a single bad element fails the whole
    /// value.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            DataType::Scalar(s) => s.coerce(value),
            DataType::Json => Some(value.clone()),
            DataType::Array(s) => value
                .as_array()?
                .iter()
                .map(|item| s.coerce(item))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "STRING",
            ScalarType::Integer => "INTEGER",
            ScalarType::Float => "FLOAT",
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Date => "DATE",
            ScalarType::DateOnly => "DATEONLY",
        };
        f.write_str(name)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(s) => write!(f, "{s}"),
            DataType::Json => f.write_str("JSON"),
            DataType::Array(s) => write!(f, "ARRAY({s})"),
        }
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Some(f as i64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        }
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        _ => None,
    }
}

/// Parse a date-ish string for the `isDate`/`isAfter`/`isBefore` checks.
pub(crate) fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    parse_datetime(&Value::String(s.to_string()))
}
