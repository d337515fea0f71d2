//! Manually supplied permission sets.
//!
//! Two document shapes are accepted and may be mixed:
//!
//! ```json
//! { "read": ["data1", "data2"], "write": ["data1"] }
//! { "data1": { "read": true, "write": false } }
//! ```
//!
//! An array value keys the entry by action; an object value keys it by
//! object, with `true` granting the inner action.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::{AuthzError, AuthzResult};

/// Permission data as handed over by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionData {
    /// Already-parsed JSON.
    Structured(Value),

    /// Serialized JSON text.
    Serialized(String),
}

impl From<Value> for PermissionData {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for PermissionData {
    fn from(text: String) -> Self {
        Self::Serialized(text)
    }
}

impl From<&str> for PermissionData {
    fn from(text: &str) -> Self {
        Self::Serialized(text.to_string())
    }
}

/// Locally evaluated permission set: action → granted objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permission {
    grants: BTreeMap<String, BTreeSet<String>>,
}

impl Permission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current content with `data`.
    ///
    /// On error the previous content is kept.
    pub fn load(&mut self, data: &PermissionData) -> AuthzResult<()> {
        let parsed;
        let value = match data {
            PermissionData::Structured(value) => value,
            PermissionData::Serialized(text) => {
                parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                    AuthzError::InvalidPermission {
                        message: format!("failed to parse permission data: {}", e),
                    }
                })?;
                &parsed
            }
        };

        let map = value.as_object().ok_or_else(|| AuthzError::InvalidPermission {
            message: "permission data must be a JSON object".to_string(),
        })?;

        self.grants = normalize(map)?;
        Ok(())
    }

    /// Whether `action` is granted on `object`.
    pub fn check(&self, action: &str, object: &str) -> bool {
        self.grants
            .get(action)
            .is_some_and(|objects| objects.contains(object))
    }

    /// Current grants in action-keyed form, objects sorted.
    pub fn to_object(&self) -> Value {
        let map: Map<String, Value> = self
            .grants
            .iter()
            .map(|(action, objects)| {
                let objects = objects.iter().cloned().map(Value::String).collect();
                (action.clone(), Value::Array(objects))
            })
            .collect();
        Value::Object(map)
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

fn normalize(map: &Map<String, Value>) -> AuthzResult<BTreeMap<String, BTreeSet<String>>> {
    let mut grants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (key, value) in map {
        match value {
            Value::Array(objects) => {
                let entry = grants.entry(key.clone()).or_default();
                for object in objects {
                    let object = object.as_str().ok_or_else(|| AuthzError::InvalidPermission {
                        message: format!("objects for action '{}' must be strings", key),
                    })?;
                    entry.insert(object.to_string());
                }
            }
            Value::Object(actions) => {
                for (action, granted) in actions {
                    let granted = granted.as_bool().ok_or_else(|| AuthzError::InvalidPermission {
                        message: format!("grant '{}' on '{}' must be a boolean", action, key),
                    })?;
                    if granted {
                        grants
                            .entry(action.clone())
                            .or_default()
                            .insert(key.clone());
                    }
                }
            }
            _ => {
                return Err(AuthzError::InvalidPermission {
                    message: format!("entry '{}' must be an array or an object", key),
                })
            }
        }
    }

    Ok(grants)
}
