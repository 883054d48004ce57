use serde_json::Value;

/// Types that can be turned into the JSON value a schema validates.
///
/// Implemented for JSON text (`str`, `String`), raw bytes (`[u8]`) and
/// `serde_json::Value`. [`BoundSchema::check_json`](crate::BoundSchema::check_json)
/// reports a parse failure as a single error at the root path, with the
/// message rendered for the schema's locale.
pub trait JsonInput {
    fn to_json_value(&self) -> Result<Value, serde_json::Error>;
}

impl JsonInput for Value {
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        Ok(self.clone())
    }
}

impl JsonInput for str {
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self)
    }
}

impl JsonInput for String {
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        self.as_str().to_json_value()
    }
}

impl JsonInput for [u8] {
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(self)
    }
}
