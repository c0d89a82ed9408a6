use std::collections::BTreeSet;

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::module::{Module, normalize_all};

/// Identity of an authenticated user, as issued by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// User record returned by the identity collaborator.
///
/// Grants arrive as raw strings; this crate owns their normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(alias = "is_admin", default)]
    pub is_admin: bool,
    #[serde(alias = "allowed_modules", default)]
    pub allowed_modules: Vec<String>,
}

/// Why the identity collaborator could not produce a profile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    #[error("session is no longer authorized")]
    Unauthorized,

    #[error("malformed profile: {0}")]
    Malformed(String),
}

/// Access snapshot for one authenticated user.
///
/// # Invariants
/// - `allowed_modules` only ever holds catalog members (unknown grants are
///   dropped when the snapshot is built).
/// - Iteration order is the catalog order, never insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAccess {
    is_admin: bool,
    allowed_modules: BTreeSet<Module>,
}

impl UserAccess {
    pub fn new(is_admin: bool, allowed_modules: impl IntoIterator<Item = Module>) -> Self {
        Self {
            is_admin,
            allowed_modules: allowed_modules.into_iter().collect(),
        }
    }

    /// Build a snapshot from raw grant strings.
    pub fn from_raw<I, S>(is_admin: bool, raw_modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(is_admin, normalize_all(raw_modules))
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::from_raw(profile.is_admin, &profile.allowed_modules)
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn allowed_modules(&self) -> &BTreeSet<Module> {
        &self.allowed_modules
    }

    pub fn is_granted(&self, module: Module) -> bool {
        self.allowed_modules.contains(&module)
    }
}

impl From<&UserProfile> for UserAccess {
    fn from(profile: &UserProfile) -> Self {
        Self::from_profile(profile)
    }
}
