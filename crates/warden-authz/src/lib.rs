//! Client-side authorization front.
//!
//! An [`Authorizer`] answers "may the current user perform this action on
//! this object (optionally within this domain)?" in one of two modes:
//!
//! - **manual**: the host pushes a permission set, checks run locally
//! - **auto**: the host names the user; authorization data is fetched from a
//!   remote endpoint, cached per user, and evaluated by a policy engine
//!
//! # Quick Start
//!
//! ```no_run
//! use warden_authz::{Authorizer, Mode};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut authorizer = Authorizer::builder(Mode::Auto)
//!     .endpoint("https://auth.example.com/casbin")
//!     .request_header("Authorization", "Bearer token")
//!     .cache_expired_time(120)
//!     .build()?;
//!
//! authorizer.set_user("alice").await?;
//! if authorizer.can("read", "data1", None).await? {
//!     println!("alice may read data1");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Collaborators
//!
//! The policy engine, the remote fetcher and the cache are traits
//! ([`PolicyEngine`], [`PolicyFetcher`], [`PolicyCache`]) injected through
//! [`AuthorizerBuilder`]. Defaults: [`CasbinEngine`] (feature `casbin`),
//! [`HttpFetcher`], [`MemoryCache`].
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `WARDEN_MODE` | `manual` (default), `auto` or `cookies` |
//! | `WARDEN_ENDPOINT` | Policy endpoint URL (auto mode) |
//! | `WARDEN_REQUEST_HEADERS` | `Name: value` pairs separated by `;` |
//! | `WARDEN_CACHE_TTL` | Cache TTL in seconds (default: 60) |
//! | `WARDEN_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `WARDEN_CACHE_DIR` | On-disk cache directory (default: in-memory) |

pub mod authorizer;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod mode;
pub mod permission;
pub mod types;

// Re-export main types
pub use authorizer::{Authorizer, AuthorizerBuilder};
pub use cache::{CacheMeta, FileCache, MemoryCache, PolicyCache};
pub use config::{AuthorizerConfig, DEFAULT_CACHE_EXPIRED_TIME, DEFAULT_TIMEOUT_SECS};
#[cfg(feature = "casbin")]
pub use engine::CasbinEngine;
pub use engine::{EnforceRequest, Enforcer, PolicyEngine};
pub use error::{AuthzError, AuthzResult, ErrorKind};
pub use fetch::{HttpFetcher, PolicyFetcher, WARDEN_USER_AGENT};
pub use mode::Mode;
pub use permission::{Permission, PermissionData};
pub use types::{AuthPayload, PolicyResponse, Rule, RuleKind};
