use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::{self, BoxFuture, FutureExt};
use regex_lite::Regex;
use serde_json::Value;

use super::format;
use super::{ArgsProblem, BoxError, ConstraintEvaluator, Verdict};
use crate::data_type::parse_date_str;

/// Built-in evaluator for the usual ORM-style constraint names.
///
/// All checks are synchronous and resolve immediately. Format checks are
/// applied to the textual form of the value: strings as-is, numbers and
/// booleans stringified. Arrays and objects fail every format check.
///
/// Format constraints (`isEmail`, `isInt`, ...) are disabled when their
/// argument is `false`.
///
/// Patterns for `is` / `not` are compiled once, when the schema is bound,
/// and shared by every clone of the evaluator.
#[derive(Debug, Clone, Default)]
pub struct StandardEvaluator {
    patterns: Arc<RwLock<HashMap<String, Regex>>>,
}

impl StandardEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every constraint this evaluator understands.
    pub const NAMES: &'static [&'static str] = &[
        "is",
        "not",
        "isIn",
        "notIn",
        "min",
        "max",
        "len",
        "notEmpty",
        "equals",
        "contains",
        "notContains",
        "isEmail",
        "isUrl",
        "isIP",
        "isIPv4",
        "isIPv6",
        "isUUID",
        "isDate",
        "isAfter",
        "isBefore",
        "isAlpha",
        "isAlphanumeric",
        "isNumeric",
        "isInt",
        "isFloat",
        "isDecimal",
        "isHexadecimal",
        "isLowercase",
        "isUppercase",
        "isCreditCard",
    ];

    /// Compile `args` unless it is already cached.
    fn cache_pattern(&self, args: &Value) -> Result<(), String> {
        let key = args.to_string();
        if self.patterns.read().unwrap_or_else(PoisonError::into_inner).contains_key(&key) {
            return Ok(());
        }
        let re = compile_pattern(args)?;
        self.patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, re);
        Ok(())
    }

    fn pattern_matches(&self, args: &Value, text: &str) -> Result<bool, String> {
        let key = args.to_string();
        if let Some(re) = self.patterns.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return Ok(re.is_match(text));
        }
        let re = compile_pattern(args)?;
        let matched = re.is_match(text);
        self.patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, re);
        Ok(matched)
    }

    #[cfg(test)]
    fn cached_patterns(&self) -> usize {
        self.patterns.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn evaluate_now(&self, name: &str, value: &Value, args: &Value) -> Result<Verdict, BoxError> {
        if is_format_check(name) && *args == Value::Bool(false) {
            return Ok(Verdict::Pass);
        }
        let text = as_text(value);
        let text_check = |pred: fn(&str) -> bool| -> Verdict {
            Verdict::from_bool(text.as_deref().map(pred).unwrap_or(false), name)
        };

        let verdict = match name {
            "is" | "not" => {
                let matched = match text.as_deref() {
                    Some(s) => self.pattern_matches(args, s).map_err(BoxError::from)?,
                    None => false,
                };
                Verdict::from_bool(if name == "is" { matched } else { !matched }, name)
            }
            "isIn" | "notIn" => {
                let list = list_arg(args).ok_or("membership list must be an array")?;
                let found = match &text {
                    Some(t) => list.iter().any(|v| as_text(v).as_deref() == Some(t.as_str())),
                    None => list.iter().any(|v| v == value),
                };
                Verdict::from_bool(if name == "isIn" { found } else { !found }, name)
            }
            "min" | "max" => {
                let bound = num_arg(args).ok_or("bound must be a number")?;
                let ok = match as_number(value) {
                    Some(n) if name == "min" => n >= bound,
                    Some(n) => n <= bound,
                    None => false,
                };
                Verdict::from_bool(ok, name)
            }
            "len" => {
                let (min, max) = len_bounds(args).map_err(BoxError::from)?;
                let len = match value {
                    Value::String(s) => Some(s.chars().count()),
                    Value::Array(a) => Some(a.len()),
                    _ => text.as_ref().map(|t| t.chars().count()),
                };
                let ok = match len {
                    Some(l) => l as f64 >= min && max.map(|m| l as f64 <= m).unwrap_or(true),
                    None => false,
                };
                Verdict::from_bool(ok, name)
            }
            "notEmpty" => {
                let ok = match value {
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Array(a) => !a.is_empty(),
                    Value::Object(o) => !o.is_empty(),
                    Value::Null => false,
                    _ => true,
                };
                Verdict::from_bool(ok, name)
            }
            "equals" => {
                let expected = as_text(args);
                Verdict::from_bool(text.is_some() && text == expected, name)
            }
            "contains" | "notContains" => {
                let needle = as_text(args).ok_or("substring must be a scalar")?;
                let found = text.as_deref().map(|t| t.contains(&needle)).unwrap_or(false);
                Verdict::from_bool(if name == "contains" { found } else { !found }, name)
            }
            "isIP" => {
                let ok = match ip_version(args) {
                    Some(4) => text.as_deref().map(format::is_ipv4).unwrap_or(false),
                    Some(6) => text.as_deref().map(format::is_ipv6).unwrap_or(false),
                    _ => text
                        .as_deref()
                        .map(|t| format::is_ipv4(t) || format::is_ipv6(t))
                        .unwrap_or(false),
                };
                Verdict::from_bool(ok, name)
            }
            "isUUID" => {
                let ok = match (uuid_version(args), text.as_deref()) {
                    (Some(v), Some(t)) => format::is_uuid_version(t, v),
                    (None, Some(t)) => format::is_uuid(t),
                    _ => false,
                };
                Verdict::from_bool(ok, name)
            }
            "isDate" => text_check(|t| parse_date_str(t).is_some()),
            "isAfter" | "isBefore" => {
                let pivot = as_text(args)
                    .and_then(|a| parse_date_str(&a))
                    .ok_or("pivot must be a date")?;
                let ok = match text.as_deref().and_then(parse_date_str) {
                    Some(d) if name == "isAfter" => d > pivot,
                    Some(d) => d < pivot,
                    None => false,
                };
                Verdict::from_bool(ok, name)
            }
            "isEmail" => text_check(format::is_email),
            "isUrl" => text_check(format::is_url),
            "isIPv4" => text_check(format::is_ipv4),
            "isIPv6" => text_check(format::is_ipv6),
            "isAlpha" => text_check(format::is_alpha),
            "isAlphanumeric" => text_check(format::is_alphanumeric),
            "isNumeric" => text_check(format::is_numeric),
            "isInt" => text_check(format::is_int),
            "isFloat" => text_check(format::is_float),
            "isDecimal" => text_check(format::is_decimal),
            "isHexadecimal" => text_check(format::is_hexadecimal),
            "isLowercase" => text_check(|t| t == t.to_lowercase()),
            "isUppercase" => text_check(|t| t == t.to_uppercase()),
            "isCreditCard" => text_check(format::is_credit_card),
            other => return Err(format!("unsupported constraint `{other}`").into()),
        };
        Ok(verdict)
    }
}

impl ConstraintEvaluator for StandardEvaluator {
    fn check_args(&self, name: &str, args: &Value) -> Result<(), ArgsProblem> {
        let invalid = |reason: &str| Err(ArgsProblem::Invalid(reason.to_string()));
        match name {
            "is" | "not" => self.cache_pattern(args).map_err(ArgsProblem::Invalid),
            "isIn" | "notIn" => match list_arg(args) {
                Some(_) => Ok(()),
                None => invalid("expected an array of allowed values"),
            },
            "min" | "max" => match num_arg(args) {
                Some(_) => Ok(()),
                None => invalid("expected a number"),
            },
            "len" => len_bounds(args).map(|_| ()).map_err(ArgsProblem::Invalid),
            "equals" | "contains" | "notContains" => match as_text(args) {
                Some(_) => Ok(()),
                None => invalid("expected a string or number"),
            },
            "isAfter" | "isBefore" => match as_text(args).and_then(|a| parse_date_str(&a)) {
                Some(_) => Ok(()),
                None => invalid("expected a date"),
            },
            "isIP" => match args {
                Value::Bool(_) => Ok(()),
                _ if matches!(ip_version(args), Some(4) | Some(6)) => Ok(()),
                _ => invalid("expected 4, 6 or true"),
            },
            "isUUID" => match args {
                Value::Bool(_) => Ok(()),
                Value::String(s) if s.eq_ignore_ascii_case("all") => Ok(()),
                _ if uuid_version(args).is_some() => Ok(()),
                _ => invalid("expected a version between 1 and 8, \"all\" or true"),
            },
            _ if Self::NAMES.contains(&name) => Ok(()),
            _ => Err(ArgsProblem::Unknown),
        }
    }

    fn evaluate<'a>(
        &'a self,
        name: &'a str,
        value: &'a Value,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Verdict, BoxError>> {
        future::ready(self.evaluate_now(name, value, args)).boxed()
    }
}

fn is_format_check(name: &str) -> bool {
    (name.starts_with("is")
        && !matches!(name, "isIn" | "isAfter" | "isBefore" | "isIP" | "isUUID"))
        || name == "notEmpty"
}

/// Textual form of a scalar value.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// A scalar number, a numeric string, or a one-element list of either.
fn num_arg(args: &Value) -> Option<f64> {
    match args {
        Value::Array(items) if items.len() == 1 => as_number(&items[0]),
        other => as_number(other),
    }
}

/// `[a, b]` or the ORM form `[[a, b]]`.
fn list_arg(args: &Value) -> Option<&Vec<Value>> {
    match args {
        Value::Array(items) => match items.as_slice() {
            [Value::Array(inner)] => Some(inner),
            _ => Some(items),
        },
        _ => None,
    }
}

fn len_bounds(args: &Value) -> Result<(f64, Option<f64>), String> {
    let err = || "expected [min] or [min, max]".to_string();
    match args {
        Value::Array(items) => match items.as_slice() {
            [min] => Ok((as_number(min).ok_or_else(err)?, None)),
            [min, max] => Ok((
                as_number(min).ok_or_else(err)?,
                Some(as_number(max).ok_or_else(err)?),
            )),
            _ => Err(err()),
        },
        other => Ok((as_number(other).ok_or_else(err)?, None)),
    }
}

fn ip_version(args: &Value) -> Option<u64> {
    match args {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn uuid_version(args: &Value) -> Option<u32> {
    let v = match args {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (1..=8).contains(&v).then_some(v as u32)
}

/// `"pattern"` or `["pattern", "flags"]`. Supported flags: `i`, `m`, `s`;
/// `g` is accepted and ignored.
fn compile_pattern(args: &Value) -> Result<Regex, String> {
    let (pattern, flags) = match args {
        Value::String(p) => (p.as_str(), ""),
        Value::Array(items) => match items.as_slice() {
            [Value::String(p)] => (p.as_str(), ""),
            [Value::String(p), Value::String(f)] => (p.as_str(), f.as_str()),
            _ => return Err("expected a pattern string or [pattern, flags]".to_string()),
        },
        _ => return Err("expected a pattern string or [pattern, flags]".to_string()),
    };
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' => inline.push(flag),
            'g' => {}
            other => return Err(format!("unsupported regex flag `{other}`")),
        }
    }
    let source = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{inline}){pattern}")
    };
    Regex::new(&source).map_err(|e| e.to_string())
}
