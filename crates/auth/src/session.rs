//! Current-session access state.
//!
//! The only asynchronous boundary of the gating core: the profile refresh.
//! While it is in flight the state is [`AccessState::Pending`] and the guard
//! makes no redirect decision. A refresh that completes after logout (or after
//! a newer refresh started) is discarded.

use std::sync::Arc;

use crate::access::{ProfileError, UserAccess, UserProfile};

/// What the guard knows about the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AccessState {
    /// Not logged in, or identity could not be confirmed.
    #[default]
    Anonymous,
    /// A profile refresh is in flight; not yet decidable.
    Pending,
    /// Confirmed snapshot. An empty grant set here means "confirmed no access".
    Known(Arc<UserAccess>),
}

impl AccessState {
    pub fn access(&self) -> Option<&UserAccess> {
        match self {
            AccessState::Known(access) => Some(access.as_ref()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AccessState::Pending)
    }
}

/// Handle for one in-flight profile refresh.
///
/// Not `Clone`: a refresh settles at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a refresh ticket must be passed to complete_refresh"]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The profile was accepted; state is `Known`.
    Applied,
    /// The profile fetch failed; state is `Anonymous`.
    Failed,
    /// The refresh belonged to an older session and was ignored.
    Discarded,
}

/// Owner of the single current-session [`AccessState`].
///
/// The state is replaced wholesale on every transition, never edited in place.
#[derive(Debug, Default)]
pub struct SessionAccess {
    generation: u64,
    state: AccessState,
}

impl SessionAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AccessState {
        &self.state
    }

    /// Start a profile refresh (login or token refresh).
    ///
    /// Any refresh still in flight becomes stale.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.state = AccessState::Pending;
        tracing::debug!(generation = self.generation, "profile refresh started");
        RefreshTicket {
            generation: self.generation,
        }
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<UserProfile, ProfileError>,
    ) -> RefreshOutcome {
        if ticket.generation != self.generation {
            tracing::warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale profile refresh"
            );
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(profile) => {
                let access = UserAccess::from_profile(&profile);
                tracing::info!(
                    user_id = %profile.id,
                    is_admin = access.is_admin(),
                    modules = access.allowed_modules().len(),
                    "session access refreshed"
                );
                self.state = AccessState::Known(Arc::new(access));
                RefreshOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile refresh failed; treating session as anonymous");
                self.state = AccessState::Anonymous;
                RefreshOutcome::Failed
            }
        }
    }

    /// End the session. In-flight refreshes can no longer apply.
    pub fn logout(&mut self) {
        self.generation += 1;
        self.state = AccessState::Anonymous;
        tracing::info!("session logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::UserId;
    use crate::module::Module;

    fn profile(is_admin: bool, modules: &[&str]) -> UserProfile {
        UserProfile {
            id: UserId::new(),
            email: "user@example.com".to_string(),
            is_admin,
            allowed_modules: modules.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn starts_anonymous() {
        let session = SessionAccess::new();
        assert_eq!(session.state(), &AccessState::Anonymous);
        assert!(session.state().access().is_none());
    }

    #[test]
    fn refresh_is_pending_until_it_settles() {
        let mut session = SessionAccess::new();
        let ticket = session.begin_refresh();
        assert!(session.state().is_pending());

        let outcome = session.complete_refresh(ticket, Ok(profile(false, &["invoices", "nope"])));
        assert_eq!(outcome, RefreshOutcome::Applied);

        let access = session.state().access().unwrap();
        assert!(access.is_granted(Module::Invoices));
        assert_eq!(access.allowed_modules().len(), 1);
    }

    #[test]
    fn failed_refresh_is_anonymous_not_empty_access() {
        let mut session = SessionAccess::new();
        let ticket = session.begin_refresh();
        let outcome = session.complete_refresh(ticket, Err(ProfileError::Unauthorized));
        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(session.state(), &AccessState::Anonymous);
    }

    #[test]
    fn refresh_resolving_after_logout_is_discarded() {
        let mut session = SessionAccess::new();
        let ticket = session.begin_refresh();
        session.logout();

        let outcome = session.complete_refresh(ticket, Ok(profile(true, &[])));
        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert_eq!(session.state(), &AccessState::Anonymous);
    }

    #[test]
    fn superseded_refresh_is_discarded() {
        let mut session = SessionAccess::new();
        let first = session.begin_refresh();
        let second = session.begin_refresh();

        assert_eq!(
            session.complete_refresh(first, Ok(profile(true, &[]))),
            RefreshOutcome::Discarded
        );
        assert!(session.state().is_pending());

        assert_eq!(
            session.complete_refresh(second, Ok(profile(false, &["REPORTS"]))),
            RefreshOutcome::Applied
        );
        let access = session.state().access().unwrap();
        assert!(!access.is_admin());
        assert!(access.is_granted(Module::Reports));
    }

    #[test]
    fn refresh_replaces_rather_than_mutates_previous_snapshot() {
        let mut session = SessionAccess::new();
        let ticket = session.begin_refresh();
        let _ = session.complete_refresh(ticket, Ok(profile(false, &["ITEMS"])));
        let before = session.state().clone();

        let ticket = session.begin_refresh();
        let _ = session.complete_refresh(ticket, Ok(profile(false, &["BANKING"])));

        let old = before.access().unwrap();
        assert!(old.is_granted(Module::Items));
        assert!(!old.is_granted(Module::Banking));
        assert!(session.state().access().unwrap().is_granted(Module::Banking));
    }
}
