//! Navigation tables and their validation.
//!
//! All tables are built once at startup and never mutated. The built-in set is
//! [`NavigationConfig::standard`]; a deployment may replace it with a JSON file
//! named by `LEDGERDESK_NAV_CONFIG`.

use std::collections::{BTreeMap, BTreeSet};
use std::env::VarError;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::UserAccess;
use crate::landing::{AdminLanding, DefaultRouteResolver};
use crate::module::Module;
use crate::policy::{AccessPolicy, AdminBypass};
use crate::routes::{ModuleRouteMap, RouteModuleIndex, RouteRule, is_under, normalize_path};

/// Environment variable naming a JSON navigation config file.
pub const NAV_CONFIG_ENV: &str = "LEDGERDESK_NAV_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no canonical path for module {0}")]
    MissingCanonicalPath(Module),

    #[error("path '{0}' must start with '/' and carry no query, fragment or trailing slash")]
    InvalidPath(String),

    #[error("rule #{index} ({module} at '{prefix}') is unreachable: rule for '{covered_by}' comes first")]
    ShadowedRule {
        index: usize,
        module: Module,
        prefix: String,
        covered_by: String,
    },

    #[error("canonical path '{path}' of {module} resolves to {found:?}")]
    CanonicalPathMismatch {
        module: Module,
        path: String,
        found: Option<Module>,
    },

    #[error("reserved path '{path}' is guarded by {module}")]
    ReservedPathGuarded { path: String, module: Module },

    #[error("default route priority is empty")]
    EmptyPriority,

    #[error("module {0} appears more than once in the default route priority")]
    DuplicatePriority(Module),

    #[error("admins land on {0} but the admin bypass does not admit them there")]
    AdminLandingDenied(Module),

    #[error("invalid navigation config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths the guard treats specially; none may be guarded by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecialPaths {
    pub login: String,
    pub setup: String,
    pub no_access: String,
}

impl Default for SpecialPaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            setup: "/setup".to_string(),
            no_access: "/no-access".to_string(),
        }
    }
}

/// On-disk shape of the navigation tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationConfigFile {
    #[serde(default)]
    pub admin_bypass: AdminBypass,
    #[serde(default)]
    pub admin_landing: AdminLanding,
    pub rules: Vec<RouteRule>,
    pub canonical_paths: BTreeMap<Module, String>,
    pub default_priority: Vec<Module>,
    #[serde(default)]
    pub paths: SpecialPaths,
}

/// Validated, immutable navigation tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    policy: AccessPolicy,
    index: RouteModuleIndex,
    resolver: DefaultRouteResolver,
    paths: SpecialPaths,
}

impl NavigationConfig {
    /// The application's built-in tables.
    ///
    /// Rule order matters: every prefix that sits below another one is listed
    /// before it.
    pub fn standard() -> Self {
        use Module::*;

        let rules = [
            (Invoices, "/sales/invoices"),
            (Payments, "/sales/payments"),
            (Customers, "/sales/customers"),
            (SalesRequests, "/sales/requests"),
            (Dashboard, "/sales"),
            (Dashboard, "/dashboard"),
            (Invoices, "/invoices"),
            (Payments, "/payments"),
            (Items, "/inventory/items"),
            (Inventory, "/inventory"),
            (PurchaseOrders, "/purchase-orders"),
            (Suppliers, "/suppliers"),
            (ChartOfAccounts, "/accounts"),
            (Expenses, "/expenses"),
            (Reports, "/reports"),
            (Import, "/import"),
            (Banking, "/banking"),
            (Customers, "/customers"),
            (Items, "/items"),
            (SalesRequests, "/sales-requests"),
            (Control, "/control"),
        ]
        .into_iter()
        .map(|(module, prefix)| RouteRule::new(module, prefix))
        .collect();

        let canonical = ModuleRouteMap::from_fn(|m| {
            match m {
                Dashboard => "/dashboard",
                Invoices => "/invoices",
                Payments => "/payments",
                Inventory => "/inventory",
                PurchaseOrders => "/purchase-orders",
                Suppliers => "/suppliers",
                ChartOfAccounts => "/accounts",
                Expenses => "/expenses",
                Reports => "/reports",
                Import => "/import",
                Banking => "/banking",
                Customers => "/customers",
                Items => "/items",
                SalesRequests => "/sales-requests",
                Control => "/control",
            }
            .to_string()
        });

        let priority = vec![
            Dashboard,
            SalesRequests,
            Invoices,
            Payments,
            Customers,
            Expenses,
            Inventory,
            Items,
            PurchaseOrders,
            Suppliers,
            Banking,
            ChartOfAccounts,
            Reports,
            Import,
            Control,
        ];

        Self {
            policy: AccessPolicy::new(AdminBypass::default()),
            index: RouteModuleIndex::new(rules, canonical),
            resolver: DefaultRouteResolver::new(priority, AdminLanding::default()),
            paths: SpecialPaths::default(),
        }
    }

    /// Same tables with a different admin bypass.
    ///
    /// Re-validates, since a fixed admin landing may no longer be reachable.
    pub fn with_admin_bypass(self, admin_bypass: AdminBypass) -> Result<Self, ConfigError> {
        let config = Self {
            policy: AccessPolicy::new(admin_bypass),
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    /// Same tables with a different admin landing rule.
    pub fn with_admin_landing(self, admin_landing: AdminLanding) -> Result<Self, ConfigError> {
        let priority = self.resolver.priority().to_vec();
        let config = Self {
            resolver: DefaultRouteResolver::new(priority, admin_landing),
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(file: NavigationConfigFile) -> Result<Self, ConfigError> {
        let canonical = ModuleRouteMap::try_from_fn(|m| file.canonical_paths.get(&m).cloned())
            .map_err(ConfigError::MissingCanonicalPath)?;

        let config = Self {
            policy: AccessPolicy::new(file.admin_bypass),
            index: RouteModuleIndex::new(file.rules, canonical),
            resolver: DefaultRouteResolver::new(file.default_priority, file.admin_landing),
            paths: file.paths,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: NavigationConfigFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read navigation config: {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("load navigation config: {}", path.display()))
    }

    /// Load from `LEDGERDESK_NAV_CONFIG` if set, else the built-in tables.
    pub fn from_env_or_standard() -> anyhow::Result<Self> {
        Self::from_env_value(std::env::var(NAV_CONFIG_ENV))
    }

    fn from_env_value(value: Result<String, VarError>) -> anyhow::Result<Self> {
        match value {
            Ok(path) => {
                tracing::info!(path = %path, "loading navigation config");
                Self::from_path(path)
            }
            Err(VarError::NotPresent) => {
                tracing::info!("{NAV_CONFIG_ENV} not set; using built-in navigation tables");
                Ok(Self::standard())
            }
            Err(err @ VarError::NotUnicode(_)) => {
                Err(err).with_context(|| format!("read {NAV_CONFIG_ENV}"))
            }
        }
    }

    /// Export the tables in their on-disk shape.
    pub fn to_file(&self) -> NavigationConfigFile {
        NavigationConfigFile {
            admin_bypass: self.policy.admin_bypass(),
            admin_landing: self.resolver.admin_landing(),
            rules: self.index.rules().to_vec(),
            canonical_paths: self
                .index
                .canonical()
                .iter()
                .map(|(m, p)| (m, p.to_string()))
                .collect(),
            default_priority: self.resolver.priority().to_vec(),
            paths: self.paths.clone(),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn route_index(&self) -> &RouteModuleIndex {
        &self.index
    }

    pub fn resolver(&self) -> &DefaultRouteResolver {
        &self.resolver
    }

    pub fn paths(&self) -> &SpecialPaths {
        &self.paths
    }

    /// Check every table invariant.
    ///
    /// # Invariants
    /// - Every path is normalized and absolute.
    /// - No rule is covered by an earlier rule's prefix.
    /// - Every canonical path resolves back to its own module.
    /// - Login, setup and no-access paths are unguarded.
    /// - The priority list is non-empty and duplicate-free.
    /// - A fixed admin landing is reachable under the admin bypass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = self.index.rules();

        for rule in rules {
            check_path(&rule.prefix)?;
        }
        for (_, path) in self.index.canonical().iter() {
            check_path(path)?;
        }
        for path in [&self.paths.login, &self.paths.setup, &self.paths.no_access] {
            check_path(path)?;
        }

        for (index, rule) in rules.iter().enumerate() {
            if let Some(earlier) = rules[..index].iter().find(|e| is_under(&rule.prefix, &e.prefix)) {
                return Err(ConfigError::ShadowedRule {
                    index,
                    module: rule.module,
                    prefix: rule.prefix.clone(),
                    covered_by: earlier.prefix.clone(),
                });
            }
        }

        for (module, path) in self.index.canonical().iter() {
            let found = self.index.module_for_path(path);
            if found != Some(module) {
                return Err(ConfigError::CanonicalPathMismatch {
                    module,
                    path: path.to_string(),
                    found,
                });
            }
        }

        for path in [&self.paths.login, &self.paths.setup, &self.paths.no_access] {
            if let Some(module) = self.index.module_for_path(path) {
                return Err(ConfigError::ReservedPathGuarded {
                    path: path.clone(),
                    module,
                });
            }
        }

        let priority = self.resolver.priority();
        if priority.is_empty() {
            return Err(ConfigError::EmptyPriority);
        }
        let mut seen = BTreeSet::new();
        for module in priority {
            if !seen.insert(*module) {
                return Err(ConfigError::DuplicatePriority(*module));
            }
        }

        if let AdminLanding::Fixed(module) = self.resolver.admin_landing() {
            let bare_admin = UserAccess::new(true, Vec::<Module>::new());
            if !self.policy.can_access(module, Some(&bare_admin)) {
                return Err(ConfigError::AdminLandingDenied(module));
            }
        }

        Ok(())
    }
}

fn check_path(path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') && normalize_path(path) == path {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath(path.to_string()))
    }
}
