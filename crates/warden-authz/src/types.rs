//! Wire types for authorization data.

use serde::{Deserialize, Serialize};

use crate::error::{AuthzError, AuthzResult};

/// Response body returned by the policy endpoint.
///
/// Only `data` is consumed; it holds a serialized [`AuthPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResponse {
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,

    /// Serialized authorization payload.
    pub data: String,
}

/// Authorization payload: a model definition plus ordered rule entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// Policy model definition text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,

    /// Rule entries. First token is the kind (`p` or `g`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<Vec<Vec<String>>>,
}

impl AuthPayload {
    /// Parse a serialized payload.
    pub fn parse(text: &str) -> AuthzResult<Self> {
        serde_json::from_str(text).map_err(|e| AuthzError::InvalidPayload {
            message: format!("failed to parse authorization payload: {}", e),
        })
    }

    /// Rule entries in source order, tokens trimmed.
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.p.iter().flatten().map(|entry| Rule::from_tokens(entry))
    }
}

/// Kind of a rule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Ordinary policy rule.
    Policy,

    /// Grouping (role inheritance) rule.
    Grouping,

    /// Anything else. Skipped when loading.
    Other(String),
}

/// A trimmed rule entry split into kind and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub args: Vec<String>,
}

impl Rule {
    pub fn from_tokens(tokens: &[String]) -> Self {
        let mut tokens = tokens.iter().map(|t| t.trim().to_string());
        let kind = match tokens.next().as_deref() {
            Some("p") => RuleKind::Policy,
            Some("g") => RuleKind::Grouping,
            Some(other) => RuleKind::Other(other.to_string()),
            None => RuleKind::Other(String::new()),
        };

        Self {
            kind,
            args: tokens.collect(),
        }
    }
}
