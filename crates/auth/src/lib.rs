//! `ledgerdesk-auth` — module-based authorization and navigation gating.
//!
//! Decides which pages a user may see from a closed module catalog, the
//! user's grants and a fixed route table. Pure and synchronous; decoupled from
//! HTTP, storage and rendering.

pub mod access;
pub mod config;
pub mod control;
pub mod guard;
pub mod landing;
pub mod module;
pub mod policy;
pub mod routes;
pub mod session;

pub use access::{ProfileError, UserAccess, UserId, UserProfile};
pub use config::{ConfigError, NavigationConfig, NavigationConfigFile, SpecialPaths};
pub use control::{AccessControl, MenuEntry};
pub use guard::{GuardDecision, Redirect, RedirectReason, RouteGuard, Router};
pub use landing::{AdminLanding, DefaultRouteResolver};
pub use module::{Module, UnknownModule, normalize, normalize_all};
pub use policy::{AccessDecision, AccessPolicy, AdminBypass, DecisionReason};
pub use routes::{ModuleRouteMap, RouteModuleIndex, RouteRule, normalize_path};
pub use session::{AccessState, RefreshOutcome, RefreshTicket, SessionAccess};
