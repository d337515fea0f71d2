//! Policy engine port.
//!
//! The authorizer never evaluates rules itself. It hands the model text to a
//! [`PolicyEngine`], feeds the resulting [`Enforcer`] the rule entries in
//! source order, and asks it for decisions.

use async_trait::async_trait;

use crate::error::AuthzResult;

#[cfg(feature = "casbin")]
mod casbin;

#[cfg(feature = "casbin")]
pub use self::casbin::CasbinEngine;

/// A decision query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforceRequest {
    /// `(subject, object, action)`.
    Basic {
        subject: String,
        object: String,
        action: String,
    },

    /// `(subject, domain, object, action)` for domain-aware models.
    Domain {
        subject: String,
        domain: String,
        object: String,
        action: String,
    },
}

impl EnforceRequest {
    pub fn new(subject: &str, object: &str, action: &str, domain: Option<&str>) -> Self {
        match domain {
            None => Self::Basic {
                subject: subject.to_string(),
                object: object.to_string(),
                action: action.to_string(),
            },
            Some(domain) => Self::Domain {
                subject: subject.to_string(),
                domain: domain.to_string(),
                object: object.to_string(),
                action: action.to_string(),
            },
        }
    }

    pub fn object(&self) -> &str {
        match self {
            Self::Basic { object, .. } | Self::Domain { object, .. } => object,
        }
    }
}

/// An evaluator built from one model definition.
#[async_trait]
pub trait Enforcer: Send + Sync {
    /// Add an ordinary policy rule.
    async fn add_policy(&mut self, rule: Vec<String>) -> AuthzResult<()>;

    /// Add a grouping (role inheritance) rule.
    async fn add_grouping_policy(&mut self, rule: Vec<String>) -> AuthzResult<()>;

    /// Evaluate a request.
    async fn enforce(&self, request: &EnforceRequest) -> AuthzResult<bool>;
}

/// Factory for enforcers.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Build an empty enforcer from a model definition.
    async fn new_enforcer(&self, model: &str) -> AuthzResult<Box<dyn Enforcer>>;
}
