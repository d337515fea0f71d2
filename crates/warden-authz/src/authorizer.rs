//! The authorizer: mode state machine, permission/enforcer lifecycle and the
//! decision API.
//!
//! In [`Mode::Manual`] the host pushes a permission set and decisions are
//! answered locally. In [`Mode::Auto`] the host names the active user; the
//! authorizer loads that user's authorization payload (cache first, then the
//! remote endpoint), builds a fresh enforcer from it and answers decisions
//! through the policy engine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{FileCache, MemoryCache, PolicyCache};
use crate::config::{AuthorizerConfig, DEFAULT_CACHE_EXPIRED_TIME, DEFAULT_TIMEOUT_SECS};
use crate::engine::{EnforceRequest, Enforcer, PolicyEngine};
use crate::error::{AuthzError, AuthzResult};
use crate::fetch::{HttpFetcher, PolicyFetcher};
use crate::mode::Mode;
use crate::permission::{Permission, PermissionData};
use crate::types::{AuthPayload, RuleKind};

/// Collaborators used in auto mode.
#[derive(Clone)]
struct AutoBackend {
    fetcher: Arc<dyn PolicyFetcher>,
    cache: Arc<dyn PolicyCache>,
    engine: Arc<dyn PolicyEngine>,
}

/// Client-side authorizer.
///
/// Mutating operations take `&mut self`; share an instance across tasks behind
/// a `tokio::sync::RwLock` so that `set_user` calls are serialized.
pub struct Authorizer {
    mode: Mode,
    endpoint: Option<String>,
    request_headers: BTreeMap<String, String>,
    cache_expired_time: u64,
    user: Option<String>,
    permission: Option<Permission>,
    enforcer: Option<Arc<dyn Enforcer>>,
    backend: Option<AutoBackend>,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("mode", &self.mode)
            .field("endpoint", &self.endpoint)
            .field("request_headers", &self.request_headers.keys())
            .field("cache_expired_time", &self.cache_expired_time)
            .field("user", &self.user)
            .field("permission", &self.permission)
            .field("enforcer", &self.enforcer.is_some())
            .finish()
    }
}

impl Authorizer {
    pub fn builder(mode: Mode) -> AuthorizerBuilder {
        AuthorizerBuilder::new(mode)
    }

    /// A manual-mode authorizer with no permissions yet.
    pub fn manual() -> Self {
        Self {
            mode: Mode::Manual,
            endpoint: None,
            request_headers: BTreeMap::new(),
            cache_expired_time: DEFAULT_CACHE_EXPIRED_TIME,
            user: None,
            permission: None,
            enforcer: None,
            backend: None,
        }
    }

    /// Build from configuration. Uses a [`FileCache`] when `cache_dir` is set.
    pub fn from_config(config: &AuthorizerConfig) -> AuthzResult<Self> {
        let mode: Mode = config.mode.parse()?;

        let mut builder = Self::builder(mode)
            .request_headers(config.request_headers.clone())
            .cache_expired_time(config.cache_expired_time)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(dir) = &config.cache_dir {
            builder = builder.cache(Arc::new(FileCache::with_dir(dir.clone())));
        }

        builder.build()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn request_headers(&self) -> &BTreeMap<String, String> {
        &self.request_headers
    }

    /// Cache TTL in seconds.
    pub fn cache_expired_time(&self) -> u64 {
        self.cache_expired_time
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Snapshot of the current enforcer. Stays valid across reloads.
    pub fn enforcer(&self) -> Option<Arc<dyn Enforcer>> {
        self.enforcer.clone()
    }

    /// Load a permission set, replacing the previous one.
    ///
    /// The permission store is created on the first successful call.
    pub fn set_permission(&mut self, data: impl Into<PermissionData>) -> AuthzResult<()> {
        let data = data.into();
        match self.permission.as_mut() {
            Some(permission) => permission.load(&data)?,
            None => {
                let mut permission = Permission::new();
                permission.load(&data)?;
                self.permission = Some(permission);
            }
        }
        debug!(mode = %self.mode, "permission set loaded");
        Ok(())
    }

    /// Current permission set in action-keyed form.
    pub fn get_permission(&self) -> AuthzResult<Value> {
        self.permission
            .as_ref()
            .map(Permission::to_object)
            .ok_or_else(|| AuthzError::NotConfigured {
                message: "permission is not set".to_string(),
            })
    }

    /// Switch the active user and load their authorization data.
    ///
    /// A no-op outside auto mode and when `user` is already the active user;
    /// repeated calls with the same identity never refetch.
    pub async fn set_user(&mut self, user: &str) -> AuthzResult<()> {
        if self.mode != Mode::Auto || self.user.as_deref() == Some(user) {
            return Ok(());
        }

        self.user = Some(user.to_string());
        let payload = self.load_payload(user).await?;
        self.init_enforcer(&payload).await
    }

    /// Drop the cached payload for the active user and load it again.
    pub async fn refresh(&mut self) -> AuthzResult<()> {
        if self.mode != Mode::Auto {
            return Ok(());
        }
        let Some(user) = self.user.clone() else {
            return Ok(());
        };

        self.backend()?.cache.evict(&user).await?;
        let payload = self.load_payload(&user).await?;
        self.init_enforcer(&payload).await
    }

    /// Forget the active user. Decisions fail until the next `set_user`.
    pub fn clear_user(&mut self) {
        if self.mode != Mode::Auto {
            return;
        }
        if let Some(user) = self.user.take() {
            debug!(user = %user, "cleared active user");
        }
        self.enforcer = None;
    }

    /// Build a fresh enforcer from a serialized payload and swap it in.
    ///
    /// Rule entries are applied strictly in order. Kinds other than `p` and
    /// `g` are skipped. On any error the previous enforcer stays in place.
    pub async fn init_enforcer(&mut self, payload: &str) -> AuthzResult<()> {
        let engine = Arc::clone(&self.backend()?.engine);

        let payload = AuthPayload::parse(payload)?;
        let model = payload.m.as_deref().ok_or(AuthzError::MissingModel)?;

        let mut enforcer = engine.new_enforcer(model).await?;

        let (mut policies, mut groupings, mut skipped) = (0usize, 0usize, 0usize);
        for rule in payload.rules() {
            match rule.kind {
                RuleKind::Policy => {
                    enforcer.add_policy(rule.args).await?;
                    policies += 1;
                }
                RuleKind::Grouping => {
                    enforcer.add_grouping_policy(rule.args).await?;
                    groupings += 1;
                }
                RuleKind::Other(kind) => {
                    debug!(kind = %kind, "skipping rule entry of unknown kind");
                    skipped += 1;
                }
            }
        }

        self.enforcer = Some(Arc::from(enforcer));
        info!(
            user = self.user.as_deref().unwrap_or_default(),
            policies, groupings, skipped, "enforcer initialized"
        );
        Ok(())
    }

    /// Whether the active user may perform `action` on `object`.
    ///
    /// Manual mode answers `false` until a permission set is loaded and
    /// ignores `domain`. Auto mode requires an initialized enforcer and sends
    /// the 4-argument form when `domain` is given.
    pub async fn can(&self, action: &str, object: &str, domain: Option<&str>) -> AuthzResult<bool> {
        match self.mode {
            Mode::Manual => Ok(self
                .permission
                .as_ref()
                .is_some_and(|p| p.check(action, object))),
            Mode::Auto => {
                let enforcer = self
                    .enforcer
                    .as_ref()
                    .ok_or(AuthzError::EnforcerNotInitialized)?;
                let subject = self.user.as_deref().unwrap_or_default();
                let request = EnforceRequest::new(subject, object, action, domain);
                enforcer.enforce(&request).await
            }
            Mode::Cookies => Err(AuthzError::UnsupportedMode {
                mode: self.mode.to_string(),
            }),
        }
    }

    /// Negation of [`can`](Self::can). Errors are propagated.
    pub async fn cannot(
        &self,
        action: &str,
        object: &str,
        domain: Option<&str>,
    ) -> AuthzResult<bool> {
        self.can(action, object, domain).await.map(|allowed| !allowed)
    }

    /// True iff every object is allowed. Stops at the first denial.
    pub async fn can_all<S: AsRef<str>>(
        &self,
        action: &str,
        objects: &[S],
        domain: Option<&str>,
    ) -> AuthzResult<bool> {
        for object in objects {
            if !self.can(action, object.as_ref(), domain).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True iff at least one object is allowed. Stops at the first grant.
    pub async fn can_any<S: AsRef<str>>(
        &self,
        action: &str,
        objects: &[S],
        domain: Option<&str>,
    ) -> AuthzResult<bool> {
        for object in objects {
            if self.can(action, object.as_ref(), domain).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn backend(&self) -> AuthzResult<&AutoBackend> {
        self.backend.as_ref().ok_or_else(|| AuthzError::NotConfigured {
            message: format!("policy engine is not available in {} mode", self.mode),
        })
    }

    /// Cached payload for `user`, or a fresh fetch that is then cached.
    async fn load_payload(&self, user: &str) -> AuthzResult<String> {
        let backend = self.backend()?;

        if let Some(payload) = backend.cache.load(user).await? {
            debug!(user, "using cached authorization data");
            return Ok(payload);
        }

        let payload = backend.fetcher.fetch(user).await?;
        backend
            .cache
            .save(user, &payload, self.cache_expired_time)
            .await?;
        debug!(user, ttl_secs = self.cache_expired_time, "fetched authorization data");
        Ok(payload)
    }
}

/// Builder for [`Authorizer`]. Validation happens in [`build`](Self::build).
pub struct AuthorizerBuilder {
    mode: Mode,
    endpoint: Option<String>,
    request_headers: BTreeMap<String, String>,
    cache_expired_time: Option<i64>,
    timeout: Duration,
    fetcher: Option<Arc<dyn PolicyFetcher>>,
    cache: Option<Arc<dyn PolicyCache>>,
    engine: Option<Arc<dyn PolicyEngine>>,
}

impl AuthorizerBuilder {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            endpoint: None,
            request_headers: BTreeMap::new(),
            cache_expired_time: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fetcher: None,
            cache: None,
            engine: None,
        }
    }

    /// Policy endpoint (required in auto mode).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn request_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.request_headers.extend(headers);
        self
    }

    /// Cache TTL in seconds. Non-positive values keep the default of 60.
    pub fn cache_expired_time(mut self, secs: i64) -> Self {
        self.cache_expired_time = Some(secs);
        self
    }

    /// Timeout for the default HTTP fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn PolicyFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn PolicyCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn PolicyEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> AuthzResult<Authorizer> {
        match self.mode {
            Mode::Manual => Ok(Authorizer::manual()),
            Mode::Cookies => Err(AuthzError::UnsupportedMode {
                mode: self.mode.to_string(),
            }),
            Mode::Auto => self.build_auto(),
        }
    }

    fn build_auto(self) -> AuthzResult<Authorizer> {
        let endpoint = self
            .endpoint
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthzError::Config {
                message: "endpoint is required in auto mode".to_string(),
            })?;

        let cache_expired_time = match self.cache_expired_time {
            Some(secs) if secs > 0 => secs.unsigned_abs(),
            Some(secs) => {
                warn!(
                    cache_expired_time = secs,
                    default = DEFAULT_CACHE_EXPIRED_TIME,
                    "ignoring non-positive cache TTL"
                );
                DEFAULT_CACHE_EXPIRED_TIME
            }
            None => DEFAULT_CACHE_EXPIRED_TIME,
        };

        let fetcher: Arc<dyn PolicyFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::with_timeout(
                &endpoint,
                &self.request_headers,
                self.timeout,
            )?),
        };
        let cache: Arc<dyn PolicyCache> = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        let engine = match self.engine {
            Some(engine) => engine,
            None => default_engine()?,
        };

        Ok(Authorizer {
            mode: Mode::Auto,
            endpoint: Some(endpoint),
            request_headers: self.request_headers,
            cache_expired_time,
            user: None,
            permission: None,
            enforcer: None,
            backend: Some(AutoBackend {
                fetcher,
                cache,
                engine,
            }),
        })
    }
}

#[cfg(feature = "casbin")]
fn default_engine() -> AuthzResult<Arc<dyn PolicyEngine>> {
    Ok(Arc::new(crate::engine::CasbinEngine::new()))
}

#[cfg(not(feature = "casbin"))]
fn default_engine() -> AuthzResult<Arc<dyn PolicyEngine>> {
    Err(AuthzError::Config {
        message: "no policy engine configured".to_string(),
    })
}
