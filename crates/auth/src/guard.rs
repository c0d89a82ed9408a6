//! Route guard: the run-time enforcement point.
//!
//! Runs in two places that must agree: the shell's navigation listener
//! ([`RouteGuard::enforce`]) and each gated page before it mounts
//! ([`RouteGuard::gate_page`]). Both decide through [`AccessControl`].
//!
//! Every redirect is a *replace* navigation, so a refused location never stays
//! reachable through the back button.

use std::borrow::Cow;
use std::sync::Arc;

use crate::control::AccessControl;
use crate::module::Module;
use crate::routes::{is_under, normalize_path};
use crate::session::AccessState;

/// Hosting router seam.
pub trait Router {
    /// Current path plus query string.
    fn location(&self) -> String;

    /// Navigate without adding a history entry.
    fn replace(&mut self, location: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    LoginRequired,
    Denied(Module),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    pub reason: RedirectReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Access is still being resolved; keep the current screen and decide later.
    Wait,
    Redirect(Redirect),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    control: Arc<AccessControl>,
}

impl RouteGuard {
    pub fn new(control: Arc<AccessControl>) -> Self {
        Self { control }
    }

    pub fn control(&self) -> &AccessControl {
        &self.control
    }

    /// Decide one navigation to `location` (path plus optional query).
    pub fn check(&self, location: &str, state: &AccessState) -> GuardDecision {
        let path = normalize_path(location);

        let access = match state {
            AccessState::Pending => return GuardDecision::Wait,
            AccessState::Anonymous => {
                if self.is_public(&path) {
                    return GuardDecision::Allow;
                }
                return GuardDecision::Redirect(self.login_redirect());
            }
            AccessState::Known(access) => access.as_ref(),
        };

        if path == self.control.no_access_path() {
            return GuardDecision::Allow;
        }

        match self.control.module_for_path(location) {
            None => GuardDecision::Allow,
            Some(module) if self.control.can_access(module, Some(access)) => GuardDecision::Allow,
            Some(module) => GuardDecision::Redirect(self.denied_redirect(location, module)),
        }
    }

    /// Shell listener form: check the router's location and replace it if refused.
    pub fn enforce<R: Router>(&self, router: &mut R, state: &AccessState) -> GuardDecision {
        let location = router.location();
        let decision = self.check(&location, state);
        if let GuardDecision::Redirect(redirect) = &decision {
            tracing::info!(from = %location, to = %redirect.to, reason = ?redirect.reason, "route guard redirect");
            router.replace(&redirect.to);
        }
        decision
    }

    /// Page-mount form for a page that belongs to `page`.
    ///
    /// Agrees with [`RouteGuard::check`] for the location, and additionally
    /// refuses when the page's own module is not allowed.
    pub fn gate_page(&self, page: Module, location: &str, state: &AccessState) -> GuardDecision {
        let decision = self.check(location, state);
        if decision != GuardDecision::Allow {
            return decision;
        }
        if normalize_path(location) == self.control.no_access_path() {
            return decision;
        }

        match state {
            AccessState::Known(access) if !self.control.can_access(page, Some(access.as_ref())) => {
                GuardDecision::Redirect(self.denied_redirect(location, page))
            }
            // Anonymous only gets here on the login or setup pages.
            _ => decision,
        }
    }

    /// `<no-access>?from=<location>`, with `location` percent-encoded.
    pub fn no_access_location(&self, from: &str) -> String {
        format!("{}?from={}", self.control.no_access_path(), urlencoding::encode(from))
    }

    /// The original location carried by a no-access URL, decoded.
    pub fn no_access_origin(&self, location: &str) -> Option<String> {
        if normalize_path(location) != self.control.no_access_path() {
            return None;
        }
        let (_, query) = location.split_once('?')?;
        let query = query.split('#').next().unwrap_or_default();
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("from="))
            .and_then(|raw| urlencoding::decode(raw).ok())
            .map(Cow::into_owned)
    }

    /// Login and setup pages, including anything below them (setup steps,
    /// login callbacks), are open to anonymous visitors.
    fn is_public(&self, path: &str) -> bool {
        is_under(path, self.control.login_path()) || is_under(path, self.control.setup_path())
    }

    fn login_redirect(&self) -> Redirect {
        Redirect {
            to: self.control.login_path().to_string(),
            reason: RedirectReason::LoginRequired,
        }
    }

    fn denied_redirect(&self, location: &str, module: Module) -> Redirect {
        Redirect {
            to: self.no_access_location(location),
            reason: RedirectReason::Denied(module),
        }
    }
}
