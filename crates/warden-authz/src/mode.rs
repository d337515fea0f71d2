//! Authorizer operating mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

/// How the authorizer obtains its authorization data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Permissions are pushed by the host via `set_permission`.
    Manual,

    /// Policy data is fetched per user from a remote endpoint and cached.
    Auto,

    /// Reserved. Construction always fails.
    Cookies,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::Cookies => "cookies",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            "cookies" => Ok(Self::Cookies),
            other => Err(AuthzError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}
