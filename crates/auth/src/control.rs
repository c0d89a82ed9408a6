use serde::Serialize;

use crate::access::UserAccess;
use crate::config::NavigationConfig;
use crate::module::Module;
use crate::policy::AccessDecision;

/// A navigation menu entry the user may follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub module: Module,
    pub path: String,
}

/// Outward-facing access operations over one validated [`NavigationConfig`].
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    config: NavigationConfig,
}

impl AccessControl {
    pub fn new(config: NavigationConfig) -> Self {
        Self { config }
    }

    pub fn standard() -> Self {
        Self::new(NavigationConfig::standard())
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn no_access_path(&self) -> &str {
        &self.config.paths().no_access
    }

    pub fn login_path(&self) -> &str {
        &self.config.paths().login
    }

    pub fn setup_path(&self) -> &str {
        &self.config.paths().setup
    }

    pub fn can_access(&self, module: Module, access: Option<&UserAccess>) -> bool {
        self.config.policy().can_access(module, access)
    }

    pub fn explain(&self, module: Module, access: Option<&UserAccess>) -> AccessDecision {
        self.config.policy().explain(module, access)
    }

    /// `None` means the path is unguarded.
    pub fn module_for_path(&self, location: &str) -> Option<Module> {
        self.config.route_index().module_for_path(location)
    }

    pub fn path_for_module(&self, module: Module) -> &str {
        self.config.route_index().path_for_module(module)
    }

    /// Unguarded paths are always allowed, even without a session.
    pub fn is_path_allowed(&self, location: &str, access: Option<&UserAccess>) -> bool {
        match self.module_for_path(location) {
            None => true,
            Some(module) => self.can_access(module, access),
        }
    }

    /// Landing page after login, or the no-access path when nothing is reachable.
    pub fn default_route(&self, access: &UserAccess) -> &str {
        match self.config.resolver().landing_module(self.config.policy(), access) {
            Some(module) => self.path_for_module(module),
            None => {
                tracing::info!(
                    is_admin = access.is_admin(),
                    "no accessible module; landing on no-access page"
                );
                self.no_access_path()
            }
        }
    }

    /// Accessible modules in catalog order, with their canonical paths.
    pub fn menu(&self, access: &UserAccess) -> Vec<MenuEntry> {
        Module::ALL
            .into_iter()
            .filter(|m| self.can_access(*m, Some(access)))
            .map(|module| MenuEntry {
                module,
                path: self.path_for_module(module).to_string(),
            })
            .collect()
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landing::AdminLanding;
    use crate::policy::AdminBypass;
    use proptest::prelude::*;

    fn user(modules: &[&str]) -> UserAccess {
        UserAccess::from_raw(false, modules)
    }

    #[test]
    fn invoices_only_user_lands_on_invoices() {
        let control = AccessControl::standard();
        assert_eq!(control.default_route(&user(&["INVOICES"])), "/invoices");
    }

    #[test]
    fn user_without_grants_lands_on_no_access() {
        let control = AccessControl::standard();
        assert_eq!(control.default_route(&user(&[])), "/no-access");
        assert_eq!(control.default_route(&user(&["PAYROLL", ""])), "/no-access");
    }

    #[test]
    fn sales_requests_outrank_expenses() {
        let control = AccessControl::standard();
        assert_eq!(
            control.default_route(&user(&["expenses", "sales_requests"])),
            "/sales-requests"
        );
    }

    #[test]
    fn admin_landing_variants() {
        let scan = AccessControl::standard();
        let admin = UserAccess::new(true, Vec::<Module>::new());
        assert_eq!(scan.default_route(&admin), "/dashboard");

        let fixed = AccessControl::new(
            NavigationConfig::standard()
                .with_admin_landing(AdminLanding::Fixed(Module::Reports))
                .unwrap(),
        );
        assert_eq!(fixed.default_route(&admin), "/reports");
    }

    #[test]
    fn no_access_is_a_fixed_point() {
        let control = AccessControl::standard();
        assert_eq!(control.module_for_path("/no-access"), None);
        assert!(control.is_path_allowed("/no-access", None));
        assert!(control.is_path_allowed("/no-access", Some(&user(&[]))));
        assert!(control.is_path_allowed("/no-access?from=%2Faccounts", Some(&user(&[]))));
    }

    #[test]
    fn guarded_paths_follow_the_policy() {
        let control = AccessControl::standard();
        let clerk = user(&["PAYMENTS"]);
        assert!(control.is_path_allowed("/sales/payments", Some(&clerk)));
        assert!(!control.is_path_allowed("/accounts", Some(&clerk)));
        assert!(!control.is_path_allowed("/sales", Some(&clerk)));
        assert!(!control.is_path_allowed("/payments", None));
    }

    #[test]
    fn menu_lists_accessible_modules_in_catalog_order() {
        let control = AccessControl::standard();
        let menu = control.menu(&user(&["reports", "INVOICES", "bogus"]));
        assert_eq!(
            menu,
            vec![
                MenuEntry { module: Module::Invoices, path: "/invoices".to_string() },
                MenuEntry { module: Module::Reports, path: "/reports".to_string() },
            ]
        );
    }

    #[test]
    fn menu_for_admin_respects_control_exception() {
        let control = AccessControl::new(
            NavigationConfig::standard()
                .with_admin_bypass(AdminBypass::ExceptControl)
                .unwrap(),
        );
        let menu = control.menu(&UserAccess::new(true, Vec::<Module>::new()));
        assert_eq!(menu.len(), Module::COUNT - 1);
        assert!(menu.iter().all(|e| e.module != Module::Control));
    }

    fn arb_access() -> impl Strategy<Value = UserAccess> {
        (
            any::<bool>(),
            prop::collection::vec(0usize..Module::COUNT, 0..Module::COUNT),
        )
            .prop_map(|(is_admin, idx)| UserAccess::new(is_admin, idx.into_iter().map(|i| Module::ALL[i])))
    }

    proptest! {
        /// Property: the landing page is either the no-access page or a page
        /// the user is allowed to open.
        #[test]
        fn default_route_is_reachable(access in arb_access(), except_control in any::<bool>()) {
            let bypass = if except_control { AdminBypass::ExceptControl } else { AdminBypass::All };
            let control = AccessControl::new(NavigationConfig::standard().with_admin_bypass(bypass).unwrap());
            let route = control.default_route(&access);
            prop_assert!(route == "/no-access" || control.is_path_allowed(route, Some(&access)));
        }

        /// Property: same snapshot, same landing page.
        #[test]
        fn default_route_is_deterministic(access in arb_access()) {
            let control = AccessControl::standard();
            let shuffled = UserAccess::new(
                access.is_admin(),
                access.allowed_modules().iter().rev().copied(),
            );
            prop_assert_eq!(control.default_route(&access), control.default_route(&shuffled));
        }

        /// Property: every canonical path maps back to its module.
        #[test]
        fn canonical_paths_round_trip(idx in 0usize..Module::COUNT) {
            let control = AccessControl::standard();
            let m = Module::ALL[idx];
            prop_assert_eq!(control.module_for_path(control.path_for_module(m)), Some(m));
        }
    }
}
