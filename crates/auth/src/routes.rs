//! Path ↔ module index.
//!
//! Rules are scanned in order and the first match wins, so a rule whose prefix
//! lies under another rule's prefix must come first. `NavigationConfig`
//! validation rejects tables that break this.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Strip query string, fragment and trailing slashes from a location, and
/// collapse runs of `/` into one.
///
/// The root path stays `/`; an empty input is treated as the root. Borrows
/// unless slashes had to be collapsed.
pub fn normalize_path(location: &str) -> Cow<'_, str> {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = location[..end].trim_end_matches('/');
    if path.is_empty() {
        return Cow::Borrowed("/");
    }
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut collapsed = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(ch);
    }
    Cow::Owned(collapsed)
}

/// One ordered `(module, prefix)` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub module: Module,
    pub prefix: String,
}

impl RouteRule {
    pub fn new(module: Module, prefix: impl Into<String>) -> Self {
        Self {
            module,
            prefix: prefix.into(),
        }
    }

    /// Exact match or match on a segment boundary below the prefix.
    ///
    /// `path` must already be normalized.
    pub fn matches(&self, path: &str) -> bool {
        is_under(path, &self.prefix)
    }
}

pub(crate) fn is_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Total `Module -> canonical path` table, dense by catalog index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRouteMap {
    paths: Vec<String>,
}

impl ModuleRouteMap {
    pub fn from_fn<F>(path: F) -> Self
    where
        F: FnMut(Module) -> String,
    {
        Self {
            paths: Module::ALL.into_iter().map(path).collect(),
        }
    }

    /// Build from a lookup that must answer for every catalog member.
    ///
    /// Returns the first module the lookup has no path for.
    pub fn try_from_fn<F>(mut lookup: F) -> Result<Self, Module>
    where
        F: FnMut(Module) -> Option<String>,
    {
        let paths = Module::ALL
            .into_iter()
            .map(|m| lookup(m).ok_or(m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { paths })
    }

    pub fn get(&self, module: Module) -> &str {
        &self.paths[module.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, &str)> {
        Module::ALL.into_iter().zip(self.paths.iter().map(String::as_str))
    }
}

/// Ordered rules plus the canonical path table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteModuleIndex {
    rules: Vec<RouteRule>,
    canonical: ModuleRouteMap,
}

impl RouteModuleIndex {
    pub fn new(rules: Vec<RouteRule>, canonical: ModuleRouteMap) -> Self {
        Self { rules, canonical }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn canonical(&self) -> &ModuleRouteMap {
        &self.canonical
    }

    /// Module guarding `location`, or `None` when the path is unguarded.
    pub fn module_for_path(&self, location: &str) -> Option<Module> {
        self.rule_for_path(location).map(|rule| rule.module)
    }

    /// The rule that decides `location` (first match).
    pub fn rule_for_path(&self, location: &str) -> Option<&RouteRule> {
        let path = normalize_path(location);
        self.rules.iter().find(|rule| rule.matches(&path))
    }

    pub fn path_for_module(&self, module: Module) -> &str {
        self.canonical.get(module)
    }
}
