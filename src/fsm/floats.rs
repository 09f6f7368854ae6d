//! Float typing for backend-bound action parameters.
//!
//! The FSM backend requires certain numeric fields to be float-typed
//! even when their values are integral: an action that waits `5`
//! seconds must serialize as `5.0`, never `5`. serde_json distinguishes
//! integer and float numbers natively, so the pass converts integral
//! values under the configured keys into float numbers in place, and
//! serialization then emits the decimal point with no textual rewrite.
//! Import runs the inverse pass, normalizing whole floats under the
//! same keys back to integers so round-tripped documents compare equal.
//!
//! The key list is configuration, not an assumption: additional action
//! types can extend [`FloatKeyTable`] without touching the transcoder.

use serde_json::{Number, Value};

/// Keys whose values carry the backend's float-typing requirement.
///
/// `scalar_keys` apply to a directly-held number (`"duration": 5`);
/// `array_keys` apply to every numeric element of a held array
/// (`"target_joints": [0, -26, 20]`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatKeyTable {
    scalar_keys: Vec<String>,
    array_keys: Vec<String>,
}

impl Default for FloatKeyTable {
    fn default() -> Self {
        Self {
            scalar_keys: vec!["duration".to_string(), "timeout".to_string()],
            array_keys: vec!["target_joints".to_string(), "checkpoints".to_string()],
        }
    }
}

impl FloatKeyTable {
    #[must_use]
    pub fn is_scalar_key(&self, key: &str) -> bool {
        self.scalar_keys.iter().any(|k| k == key)
    }

    #[must_use]
    pub fn is_array_key(&self, key: &str) -> bool {
        self.array_keys.iter().any(|k| k == key)
    }

    #[must_use]
    pub fn with_scalar_key(mut self, key: impl Into<String>) -> Self {
        self.scalar_keys.push(key.into());
        self
    }

    #[must_use]
    pub fn with_array_key(mut self, key: impl Into<String>) -> Self {
        self.array_keys.push(key.into());
        self
    }
}

fn as_float_number(number: &Number) -> Option<Number> {
    if number.is_f64() {
        return None; // already fractional or float-typed
    }
    number.as_f64().and_then(Number::from_f64)
}

fn as_integer_number(number: &Number) -> Option<Number> {
    if !number.is_f64() {
        return None;
    }
    let value = number.as_f64()?;
    if value.fract() != 0.0 || !value.is_finite() {
        return None;
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(Number::from(value as i64))
}

/// Recursively convert integral values under the table's keys into
/// float numbers, so serialization prints them with a decimal point.
/// Non-integral values pass through unchanged.
pub fn tag_floats(value: &mut Value, table: &FloatKeyTable) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                match entry {
                    Value::Number(n) if table.is_scalar_key(key) => {
                        if let Some(float) = as_float_number(n) {
                            *entry = Value::Number(float);
                        }
                    }
                    Value::Array(items) if table.is_array_key(key) => {
                        for item in items.iter_mut() {
                            if let Value::Number(n) = item {
                                if let Some(float) = as_float_number(n) {
                                    *item = Value::Number(float);
                                }
                            } else {
                                tag_floats(item, table);
                            }
                        }
                    }
                    _ => tag_floats(entry, table),
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                tag_floats(item, table);
            }
        }
        _ => {}
    }
}

/// Inverse of [`tag_floats`]: whole-valued floats under the table's
/// keys become plain integers again on import.
pub fn untag_floats(value: &mut Value, table: &FloatKeyTable) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                match entry {
                    Value::Number(n) if table.is_scalar_key(key) => {
                        if let Some(int) = as_integer_number(n) {
                            *entry = Value::Number(int);
                        }
                    }
                    Value::Array(items) if table.is_array_key(key) => {
                        for item in items.iter_mut() {
                            if let Value::Number(n) = item {
                                if let Some(int) = as_integer_number(n) {
                                    *item = Value::Number(int);
                                }
                            } else {
                                untag_floats(item, table);
                            }
                        }
                    }
                    _ => untag_floats(entry, table),
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                untag_floats(item, table);
            }
        }
        _ => {}
    }
}
