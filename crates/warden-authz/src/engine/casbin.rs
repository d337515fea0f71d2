//! Policy engine backed by the `casbin` crate.

use async_trait::async_trait;
use casbin::prelude::{CoreApi, DefaultModel, MemoryAdapter, MgmtApi};

use super::{EnforceRequest, Enforcer, PolicyEngine};
use crate::error::{AuthzError, AuthzResult};

/// Builds in-memory casbin enforcers from model text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasbinEngine;

impl CasbinEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyEngine for CasbinEngine {
    async fn new_enforcer(&self, model: &str) -> AuthzResult<Box<dyn Enforcer>> {
        let model = DefaultModel::from_str(model)
            .await
            .map_err(AuthzError::engine)?;
        let inner = casbin::Enforcer::new(model, MemoryAdapter::default())
            .await
            .map_err(AuthzError::engine)?;

        Ok(Box::new(CasbinEnforcer { inner }))
    }
}

struct CasbinEnforcer {
    inner: casbin::Enforcer,
}

#[async_trait]
impl Enforcer for CasbinEnforcer {
    async fn add_policy(&mut self, rule: Vec<String>) -> AuthzResult<()> {
        self.inner
            .add_policy(rule)
            .await
            .map(|_| ())
            .map_err(AuthzError::engine)
    }

    async fn add_grouping_policy(&mut self, rule: Vec<String>) -> AuthzResult<()> {
        self.inner
            .add_grouping_policy(rule)
            .await
            .map(|_| ())
            .map_err(AuthzError::engine)
    }

    async fn enforce(&self, request: &EnforceRequest) -> AuthzResult<bool> {
        let decision = match request {
            EnforceRequest::Basic {
                subject,
                object,
                action,
            } => self
                .inner
                .enforce((subject.as_str(), object.as_str(), action.as_str())),
            EnforceRequest::Domain {
                subject,
                domain,
                object,
                action,
            } => self.inner.enforce((
                subject.as_str(),
                domain.as_str(),
                object.as_str(),
                action.as_str(),
            )),
        };

        decision.map_err(AuthzError::engine)
    }
}
