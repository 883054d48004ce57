//! Message templates and placeholder substitution.
//!
//! A [`MessageCatalog`] maps a message key (a constraint name, `default`,
//! `allowNull`, or a type key such as `isInt`) and a locale to a template.
//! Templates use `{{name}}` placeholders, filled by [`render`].
//!
//! Templates are only consulted while a schema is bound; validation itself
//! never touches the catalog.
//!
//! # Example
//!
//! ```
//! use reqvld::i18n::{render, Catalog, MessageCatalog};
//!
//! let catalog = Catalog::builtin();
//! let template = catalog.lookup("min", "es").unwrap();
//! let msg = render(&template, &[("fieldName", "precio".to_string()), ("args", "0".to_string())]);
//! assert_eq!(msg, "El campo precio debe ser mayor o igual a 0");
//! ```

use std::collections::HashMap;

use serde_json::Value;

/// Key used when no template exists for a constraint.
pub const DEFAULT_KEY: &str = "default";
/// Key of the message reported for a missing non-nullable value.
pub const ALLOW_NULL_KEY: &str = "allowNull";
/// Locale consulted when the requested locale has no template at all.
pub const FALLBACK_LOCALE: &str = "en";

const GENERIC_TEMPLATE: &str = "Field {{fieldName}} has an invalid format.";

/// Source of message templates.
pub trait MessageCatalog: Send + Sync {
    /// Return the template for `key` in `locale`, or `None` if there is none.
    fn lookup(&self, key: &str, locale: &str) -> Option<String>;
}

/// A [`MessageCatalog`] backed by nested maps: locale → key → template.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locales: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    /// An empty catalog. Every lookup misses and messages fall back to the
    /// built-in generic template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in English and Spanish sets.
    pub fn builtin() -> Self {
        Self::new()
            .with_locale("en", english())
            .with_locale("es", spanish())
    }

    /// Add or replace a whole locale.
    pub fn with_locale(mut self, locale: impl Into<String>, templates: HashMap<String, String>) -> Self {
        self.locales.insert(locale.into(), templates);
        self
    }

    /// Add or replace one template.
    pub fn with_template(
        mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.locales
            .entry(locale.into())
            .or_default()
            .insert(key.into(), template.into());
        self
    }

    pub fn locales(&self) -> Vec<&str> {
        self.locales.keys().map(String::as_str).collect()
    }
}

impl MessageCatalog for Catalog {
    fn lookup(&self, key: &str, locale: &str) -> Option<String> {
        self.locales.get(locale)?.get(key).cloned()
    }
}

/// A [`MessageCatalog`] that delegates to a closure.
///
/// # Example
/// ```
/// use reqvld::i18n::{FnCatalog, MessageCatalog};
///
/// let catalog = FnCatalog::new(|key, _locale| match key {
///     "allowNull" => Some("{{fieldName}} is required".into()),
///     _ => None,
/// });
/// assert!(catalog.lookup("allowNull", "en").is_some());
/// ```
pub struct FnCatalog<F> {
    f: F,
}

impl<F> FnCatalog<F>
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> MessageCatalog for FnCatalog<F>
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, key: &str, locale: &str) -> Option<String> {
        (self.f)(key, locale)
    }
}

/// Resolve a template, falling back from `key` to `default`, then from
/// `locale` to [`FALLBACK_LOCALE`], then to a built-in generic template.
pub fn resolve_template(catalog: &dyn MessageCatalog, key: &str, locale: &str) -> String {
    let mut locales = vec![locale];
    if locale != FALLBACK_LOCALE {
        locales.push(FALLBACK_LOCALE);
    }
    locales
        .iter()
        .find_map(|loc| {
            catalog
                .lookup(key, loc)
                .or_else(|| catalog.lookup(DEFAULT_KEY, loc))
        })
        .unwrap_or_else(|| GENERIC_TEMPLATE.to_string())
}

/// Apply parameter substitution to a template string.
///
/// Replaces `{{name}}` placeholders with values from `params`. Unknown
/// placeholders are left as they are.
pub fn render(template: &str, params: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Placeholder parameters for a constraint message.
///
/// `args` renders a scalar argument, a one-element list as its element, and
/// longer lists comma-joined. Each list element is also exposed as `argN`
/// and `argsN`.
pub fn message_params(field_name: &str, model_name: &str, args: &Value) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("fieldName", field_name.to_string()),
        ("modelName", model_name.to_string()),
    ];
    match args {
        Value::Array(items) => {
            let joined = match items.as_slice() {
                [single] => display_arg(single),
                _ => items.iter().map(display_arg).collect::<Vec<_>>().join(", "),
            };
            params.push(("args", joined));
            for (i, item) in items.iter().enumerate() {
                if let Some((short, long)) = positional_keys(i) {
                    let shown = display_arg(item);
                    params.push((short, shown.clone()));
                    params.push((long, shown));
                }
            }
        }
        Value::Null => {}
        other => params.push(("args", display_arg(other))),
    }
    params
}

/// Only the first eight positions get placeholders.
fn positional_keys(index: usize) -> Option<(&'static str, &'static str)> {
    const ARG: [&str; 8] = ["arg0", "arg1", "arg2", "arg3", "arg4", "arg5", "arg6", "arg7"];
    const ARGS: [&str; 8] = [
        "args0", "args1", "args2", "args3", "args4", "args5", "args6", "args7",
    ];
    Some((*ARG.get(index)?, *ARGS.get(index)?))
}

fn display_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_arg).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Built-in translation sets
// ---------------------------------------------------------------------------

fn table(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// English templates.
pub fn english() -> HashMap<String, String> {
    table(&[
        ("default", "Field {{fieldName}} has an invalid format."),
        ("allowNull", "Field {{fieldName}} is required."),
        ("len", "Field {{fieldName}} must have between {{args0}} and {{args1}} characters."),
        ("min", "Field {{fieldName}} must be greater than or equal to {{args}}."),
        ("max", "Field {{fieldName}} must be less than or equal to {{args}}."),
        ("isIn", "Field {{fieldName}} must be one of: {{args}}."),
        ("notIn", "Field {{fieldName}} must not be one of: {{args}}."),
        ("is", "Field {{fieldName}} does not match the expected pattern."),
        ("not", "Field {{fieldName}} matches a forbidden pattern."),
        ("notEmpty", "Field {{fieldName}} must not be empty."),
        ("equals", "Field {{fieldName}} must be equal to {{args}}."),
        ("contains", "Field {{fieldName}} must contain {{args}}."),
        ("notContains", "Field {{fieldName}} must not contain {{args}}."),
        ("isEmail", "Field {{fieldName}} must be a valid email address."),
        ("isUrl", "Field {{fieldName}} must be a valid URL."),
        ("isIP", "Field {{fieldName}} must be a valid IP address."),
        ("isIPv4", "Field {{fieldName}} must be a valid IPv4 address."),
        ("isIPv6", "Field {{fieldName}} must be a valid IPv6 address."),
        ("isUUID", "Field {{fieldName}} must be a valid UUID."),
        ("isAfter", "Field {{fieldName}} must be a date after {{args}}."),
        ("isBefore", "Field {{fieldName}} must be a date before {{args}}."),
        ("isAlpha", "Field {{fieldName}} must contain only letters."),
        ("isAlphanumeric", "Field {{fieldName}} must contain only letters and digits."),
        ("isNumeric", "Field {{fieldName}} must contain only digits."),
        ("isInt", "Field {{fieldName}} must be an integer."),
        ("isFloat", "Field {{fieldName}} must be a floating point number."),
        ("isDecimal", "Field {{fieldName}} must be a decimal number."),
        ("isHexadecimal", "Field {{fieldName}} must be a hexadecimal number."),
        ("isLowercase", "Field {{fieldName}} must be lowercase."),
        ("isUppercase", "Field {{fieldName}} must be uppercase."),
        ("isCreditCard", "Field {{fieldName}} must be a valid credit card number."),
        ("isString", "Field {{fieldName}} must be a string."),
        ("isBoolean", "Field {{fieldName}} must be a boolean."),
        ("isDate", "Field {{fieldName}} must be a valid date."),
        ("isArray", "Field {{fieldName}} must be an array."),
        ("isObject", "Field {{fieldName}} must be an object."),
        ("parse", "The input is not valid JSON."),
    ])
}

/// Spanish templates.
pub fn spanish() -> HashMap<String, String> {
    table(&[
        ("default", "EL campo {{fieldName}} no tiene el formato correcto."),
        ("allowNull", "Se requiere el campo {{fieldName}}"),
        ("len", "El campo {{fieldName}} debe tener entre {{args0}} y {{args1}} caracteres."),
        ("min", "El campo {{fieldName}} debe ser mayor o igual a {{args}}"),
        ("max", "El campo {{fieldName}} debe ser menor o igual a {{args}}"),
        ("isIn", "El campo {{fieldName}} debe ser uno de los siguientes valores: {{args0}}"),
        ("notIn", "El campo {{fieldName}} no debe ser ninguno de los siguientes valores: {{args0}}"),
        ("notEmpty", "El campo {{fieldName}} no debe estar vacío."),
        ("isEmail", "El campo {{fieldName}} debe ser un correo electrónico válido."),
        ("isUrl", "El campo {{fieldName}} debe ser una URL válida."),
        ("isUUID", "El campo {{fieldName}} debe ser un UUID válido."),
        ("isInt", "El campo {{fieldName}} debe ser un número entero."),
        ("isFloat", "El campo {{fieldName}} debe ser un número en coma flotante."),
        ("isString", "El campo {{fieldName}} debe ser una cadena de texto."),
        ("isBoolean", "El campo {{fieldName}} debe ser un valor booleano."),
        ("isDate", "El campo {{fieldName}} debe ser una fecha válida."),
        ("isArray", "El campo {{fieldName}} debe ser una lista."),
        ("isObject", "El campo {{fieldName}} debe ser un objeto."),
        ("parse", "Los datos de entrada no son un JSON válido."),
    ])
}
