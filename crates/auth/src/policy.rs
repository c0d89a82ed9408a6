//! Module access policy.
//!
//! - No IO
//! - No panics
//! - Total over its inputs: every call yields allow or deny

use serde::{Deserialize, Serialize};

use crate::access::UserAccess;
use crate::module::Module;

/// How far the admin flag supersedes the explicit grant list.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminBypass {
    /// Admins reach every module, grants or not.
    #[default]
    All,
    /// Admins reach every module except [`Module::Control`], which still
    /// needs an explicit `CONTROL` grant.
    ExceptControl,
}

impl AdminBypass {
    /// Whether the bypass alone (no grant) admits an admin to `module`.
    pub fn covers(self, module: Module) -> bool {
        match self {
            AdminBypass::All => true,
            AdminBypass::ExceptControl => module != Module::Control,
        }
    }
}

/// Why a decision went the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    NotAuthenticated,
    AdminBypass,
    ControlRequiresGrant,
    ExplicitGrant,
    MissingGrant,
}

/// Outcome of a policy check, suitable for audit or diagnostic display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub module: Module,
    pub granted: bool,
    pub reason: DecisionReason,
}

impl AccessDecision {
    fn allow(module: Module, reason: DecisionReason) -> Self {
        Self { module, granted: true, reason }
    }

    fn deny(module: Module, reason: DecisionReason) -> Self {
        Self { module, granted: false, reason }
    }
}

/// Decides whether a user snapshot may use a module.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    admin_bypass: AdminBypass,
}

impl AccessPolicy {
    pub fn new(admin_bypass: AdminBypass) -> Self {
        Self { admin_bypass }
    }

    pub fn admin_bypass(&self) -> AdminBypass {
        self.admin_bypass
    }

    /// `None` means "not logged in".
    pub fn can_access(&self, module: Module, access: Option<&UserAccess>) -> bool {
        self.explain(module, access).granted
    }

    /// Same decision as [`AccessPolicy::can_access`], with the reason attached.
    pub fn explain(&self, module: Module, access: Option<&UserAccess>) -> AccessDecision {
        let Some(access) = access else {
            return AccessDecision::deny(module, DecisionReason::NotAuthenticated);
        };

        if access.is_admin() {
            if self.admin_bypass.covers(module) {
                return AccessDecision::allow(module, DecisionReason::AdminBypass);
            }
            // Outside the bypass an admin is held to the grant list like anyone else.
            return if access.is_granted(module) {
                AccessDecision::allow(module, DecisionReason::ExplicitGrant)
            } else {
                AccessDecision::deny(module, DecisionReason::ControlRequiresGrant)
            };
        }

        if access.is_granted(module) {
            AccessDecision::allow(module, DecisionReason::ExplicitGrant)
        } else {
            AccessDecision::deny(module, DecisionReason::MissingGrant)
        }
    }
}
