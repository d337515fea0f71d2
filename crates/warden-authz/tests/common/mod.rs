//! Test doubles for the authorizer's collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warden_authz::{
    AuthzError, AuthzResult, EnforceRequest, Enforcer, MemoryCache, PolicyCache, PolicyEngine,
    PolicyFetcher,
};

pub const MODEL: &str = "[request_definition]\nr = sub, obj, act";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a payload string from rule entries.
pub fn payload(rules: &[&[&str]]) -> String {
    serde_json::json!({ "m": MODEL, "p": rules }).to_string()
}

/// Fetcher answering from a fixed table and counting calls per user.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<String, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, user: &str, payload: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(user.to_string(), Ok(payload.into()));
    }

    pub fn fail(&self, user: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(user.to_string(), Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, user: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == user).count()
    }
}

#[async_trait]
impl PolicyFetcher for ScriptedFetcher {
    async fn fetch(&self, user: &str) -> AuthzResult<String> {
        self.calls.lock().unwrap().push(user.to_string());
        match self.responses.lock().unwrap().get(user) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(message)) => Err(AuthzError::Network {
                message: message.clone(),
            }),
            None => Err(AuthzError::Network {
                message: format!("no scripted response for {}", user),
            }),
        }
    }
}

/// Memory cache that counts loads and saves.
#[derive(Default)]
pub struct CountingCache {
    inner: MemoryCache,
    pub loads: AtomicUsize,
    pub saves: Mutex<Vec<(String, u64)>>,
}

impl CountingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> Vec<(String, u64)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyCache for CountingCache {
    async fn load(&self, key: &str) -> AuthzResult<Option<String>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, payload: &str, ttl_secs: u64) -> AuthzResult<()> {
        self.saves
            .lock()
            .unwrap()
            .push((key.to_string(), ttl_secs));
        self.inner.save(key, payload, ttl_secs).await
    }

    async fn evict(&self, key: &str) -> AuthzResult<()> {
        self.inner.evict(key).await
    }
}

/// One call observed by the recording engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    NewEnforcer(String),
    AddPolicy(Vec<String>),
    AddGroupingPolicy(Vec<String>),
    Enforce(EnforceRequest),
}

/// Engine whose enforcers allow exactly the requests matching an added `p`
/// rule, and record every call in a shared log.
#[derive(Default)]
pub struct RecordingEngine {
    log: Arc<Mutex<Vec<EngineCall>>>,
    builds: AtomicUsize,
    fail_rule: Mutex<Option<String>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Objects passed to `enforce`, in call order.
    pub fn enforced_objects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Enforce(req) => Some(req.object().to_string()),
                _ => None,
            })
            .collect()
    }

    /// Make `add_policy` fail for rules whose first argument is `subject`.
    pub fn fail_on_rule_for(&self, subject: &str) {
        *self.fail_rule.lock().unwrap() = Some(subject.to_string());
    }
}

#[async_trait]
impl PolicyEngine for RecordingEngine {
    async fn new_enforcer(&self, model: &str) -> AuthzResult<Box<dyn Enforcer>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .push(EngineCall::NewEnforcer(model.to_string()));
        Ok(Box::new(RecordingEnforcer {
            log: Arc::clone(&self.log),
            policies: Vec::new(),
            fail_rule: self.fail_rule.lock().unwrap().clone(),
        }))
    }
}

struct RecordingEnforcer {
    log: Arc<Mutex<Vec<EngineCall>>>,
    policies: Vec<Vec<String>>,
    fail_rule: Option<String>,
}

#[async_trait]
impl Enforcer for RecordingEnforcer {
    async fn add_policy(&mut self, rule: Vec<String>) -> AuthzResult<()> {
        if self.fail_rule.is_some() && self.fail_rule.as_ref() == rule.first() {
            return Err(AuthzError::Engine {
                message: "rejected rule".to_string(),
            });
        }
        self.log
            .lock()
            .unwrap()
            .push(EngineCall::AddPolicy(rule.clone()));
        self.policies.push(rule);
        Ok(())
    }

    async fn add_grouping_policy(&mut self, rule: Vec<String>) -> AuthzResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(EngineCall::AddGroupingPolicy(rule));
        Ok(())
    }

    async fn enforce(&self, request: &EnforceRequest) -> AuthzResult<bool> {
        self.log
            .lock()
            .unwrap()
            .push(EngineCall::Enforce(request.clone()));
        let wanted: Vec<&str> = match request {
            EnforceRequest::Basic {
                subject,
                object,
                action,
            } => vec![subject.as_str(), object.as_str(), action.as_str()],
            EnforceRequest::Domain {
                subject,
                domain,
                object,
                action,
            } => vec![
                subject.as_str(),
                domain.as_str(),
                object.as_str(),
                action.as_str(),
            ],
        };
        Ok(self
            .policies
            .iter()
            .any(|p| p.iter().map(String::as_str).eq(wanted.iter().copied())))
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
