/// Chat reply recovery
///
/// Models are instructed to answer with a bare JSON object but regularly wrap
/// it in prose or a code fence. Recovery takes the widest `{ ... }` span in
/// the reply, which survives nested objects because the span runs from the
/// first opening brace to the last closing one.
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseFormatError {
    #[error("response JSON could not be parsed: {0}")]
    InvalidJson(String),

    #[error("no JSON object found in response")]
    NoJsonObject,
}

pub fn recover_object(raw: &str) -> Result<Map<String, Value>, ResponseFormatError> {
    if let Ok(Value::Object(mapping)) = serde_json::from_str::<Value>(raw) {
        return Ok(mapping);
    }

    let start = raw.find('{');
    let end = raw.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ResponseFormatError::NoJsonObject);
    };
    if start >= end {
        return Err(ResponseFormatError::NoJsonObject);
    }

    let candidate = &raw[start..=end];
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(mapping)) => Ok(mapping),
        Ok(other) => Err(ResponseFormatError::InvalidJson(format!(
            "expected an object, got {other}"
        ))),
        Err(err) => Err(ResponseFormatError::InvalidJson(err.to_string())),
    }
}
