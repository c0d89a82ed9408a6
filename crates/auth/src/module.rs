//! Module catalog.
//!
//! A module is the unit of permission: one business area of the application
//! (invoices, inventory, ...). The catalog is closed; backend grant strings are
//! mapped onto it case-insensitively and anything else is dropped.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business module identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Module {
    Dashboard,
    Invoices,
    Payments,
    Inventory,
    PurchaseOrders,
    Suppliers,
    ChartOfAccounts,
    Expenses,
    Reports,
    Import,
    Banking,
    Customers,
    Items,
    SalesRequests,
    Control,
}

impl Module {
    /// Every catalog member, in declaration order.
    pub const ALL: [Module; 15] = [
        Module::Dashboard,
        Module::Invoices,
        Module::Payments,
        Module::Inventory,
        Module::PurchaseOrders,
        Module::Suppliers,
        Module::ChartOfAccounts,
        Module::Expenses,
        Module::Reports,
        Module::Import,
        Module::Banking,
        Module::Customers,
        Module::Items,
        Module::SalesRequests,
        Module::Control,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Canonical upper-case name, as the backend sends it.
    pub const fn as_str(self) -> &'static str {
        match self {
            Module::Dashboard => "DASHBOARD",
            Module::Invoices => "INVOICES",
            Module::Payments => "PAYMENTS",
            Module::Inventory => "INVENTORY",
            Module::PurchaseOrders => "PURCHASE_ORDERS",
            Module::Suppliers => "SUPPLIERS",
            Module::ChartOfAccounts => "CHART_OF_ACCOUNTS",
            Module::Expenses => "EXPENSES",
            Module::Reports => "REPORTS",
            Module::Import => "IMPORT",
            Module::Banking => "BANKING",
            Module::Customers => "CUSTOMERS",
            Module::Items => "ITEMS",
            Module::SalesRequests => "SALES_REQUESTS",
            Module::Control => "CONTROL",
        }
    }

    /// Position in [`Module::ALL`]; used for dense per-module tables.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown module '{0}'")]
pub struct UnknownModule(pub String);

/// Like [`normalize`], but an unknown name is an error instead of `None`.
impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Map a raw grant string onto the catalog.
///
/// Trims, uppercases, then requires an exact match. Unknown input yields
/// `None`, which callers treat as "skip this entry".
pub fn normalize(raw: &str) -> Option<Module> {
    let upper = raw.trim().to_ascii_uppercase();
    Module::ALL.into_iter().find(|m| m.as_str() == upper)
}

/// Normalize each entry, dropping the ones outside the catalog.
///
/// Relative order of survivors is kept; duplicates pass through.
pub fn normalize_all<I, S>(raws: I) -> Vec<Module>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raws.into_iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            let module = normalize(raw);
            if module.is_none() {
                tracing::debug!(grant = raw, "dropping unknown module grant");
            }
            module
        })
        .collect()
}
