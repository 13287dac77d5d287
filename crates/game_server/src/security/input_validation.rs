//! Input validation for inbound text frames.

use super::SecurityError;
use crate::config::SecurityConfig;
use serde_json::Value;

/// Validates a client frame and returns the fields of the message it holds.
///
/// A frame must be a JSON array within the configured size, depth, string
/// and collection limits. Chat sanitization happens later in the world; this
/// only rejects frames no client would ever send.
pub fn validate_frame(frame: &str, config: &SecurityConfig) -> Result<Vec<Value>, SecurityError> {
    // Check message size
    if frame.len() > config.max_message_size {
        return Err(SecurityError::MessageTooLarge(frame.len()));
    }

    let json: Value = serde_json::from_str(frame).map_err(|_| SecurityError::InvalidJson)?;

    validate_json_value(&json, 0, config)?;

    match json {
        Value::Array(fields) => Ok(fields),
        _ => Err(SecurityError::NotAnArray),
    }
}

/// Recursively validates a JSON value
fn validate_json_value(value: &Value, depth: usize, config: &SecurityConfig) -> Result<(), SecurityError> {
    if depth > config.max_json_depth {
        return Err(SecurityError::InvalidMessageFormat(
            "JSON nesting too deep".to_string()
        ));
    }

    match value {
        Value::String(s) => {
            if s.chars().count() > config.max_string_length {
                return Err(SecurityError::InvalidMessageFormat(
                    format!("String too long: {} characters", s.chars().count())
                ));
            }
            validate_string_content(s)?;
        }
        Value::Array(arr) => {
            if arr.len() > config.max_collection_size {
                return Err(SecurityError::InvalidMessageFormat(
                    format!("Array too large: {} elements", arr.len())
                ));
            }
            for item in arr {
                validate_json_value(item, depth + 1, config)?;
            }
        }
        Value::Object(obj) => {
            if obj.len() > config.max_collection_size {
                return Err(SecurityError::InvalidMessageFormat(
                    format!("Object too large: {} keys", obj.len())
                ));
            }
            for (key, val) in obj {
                validate_string_content(key)?;
                validate_json_value(val, depth + 1, config)?;
            }
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }

    Ok(())
}

/// Rejects strings carrying null bytes or a burst of control characters
fn validate_string_content(s: &str) -> Result<(), SecurityError> {
    if s.contains('\0') {
        return Err(SecurityError::MaliciousContent);
    }

    let control_char_count = s
        .chars()
        .filter(|c| c.is_control() && *c != '\n' && *c != '\r' && *c != '\t')
        .count();
    if control_char_count > 5 {
        return Err(SecurityError::MaliciousContent);
    }

    Ok(())
}
