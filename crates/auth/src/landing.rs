use serde::{Deserialize, Serialize};

use crate::access::UserAccess;
use crate::module::Module;
use crate::policy::AccessPolicy;

/// Where admins land after login.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLanding {
    /// Admins go through the same priority scan as everyone else.
    #[default]
    Scan,
    /// Admins always land on this module.
    Fixed(Module),
}

/// Picks the landing module from a fixed business priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRouteResolver {
    priority: Vec<Module>,
    admin_landing: AdminLanding,
}

impl DefaultRouteResolver {
    pub fn new(priority: Vec<Module>, admin_landing: AdminLanding) -> Self {
        Self {
            priority,
            admin_landing,
        }
    }

    pub fn priority(&self) -> &[Module] {
        &self.priority
    }

    pub fn admin_landing(&self) -> AdminLanding {
        self.admin_landing
    }

    /// First module in priority order the policy allows, if any.
    ///
    /// The priority list is the only tie-break, so the answer is stable for
    /// a given snapshot.
    pub fn landing_module(&self, policy: &AccessPolicy, access: &UserAccess) -> Option<Module> {
        if let (true, AdminLanding::Fixed(module)) = (access.is_admin(), self.admin_landing) {
            return Some(module);
        }
        self.priority
            .iter()
            .copied()
            .find(|m| policy.can_access(*m, Some(access)))
    }
}
