//! Navigation model: the client's routes, which guard protects each one,
//! and the `Navigator` capability used to request redirects.

use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use crate::auth::{Admission, AuthenticatedOnly, Guard, SessionStatus, UnauthenticatedOnly};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Problems,
    Review,
    Settings,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Problems,
        Route::Review,
        Route::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/auth/login",
            Route::Register => "/auth/register",
            Route::Dashboard => "/dashboard",
            Route::Problems => "/problems",
            Route::Review => "/review",
            Route::Settings => "/settings",
        }
    }

    /// Look up a route by path; a trailing slash is ignored
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Guard protecting this route; `None` for pure redirects
    pub fn guard(&self) -> Option<&'static dyn Guard> {
        match self {
            Route::Root => None,
            Route::Login | Route::Register => Some(&UnauthenticatedOnly),
            Route::Dashboard | Route::Problems | Route::Review | Route::Settings => {
                Some(&AuthenticatedOnly)
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What the front end should do for a requested path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
    Pending,
    NotFound,
}

/// Apply the router table to `path` for the current session status
pub fn resolve(path: &str, status: &SessionStatus) -> Navigation {
    let Some(route) = Route::from_path(path) else {
        return Navigation::NotFound;
    };
    let navigation = match route.guard() {
        None => Navigation::Redirect(Route::Dashboard),
        Some(guard) => match guard.admit(status) {
            Admission::Allow => Navigation::Render(route),
            Admission::Redirect(target) => Navigation::Redirect(target),
            Admission::Pending => Navigation::Pending,
        },
    };
    debug!(path = path, ?navigation, "Route resolved");
    navigation
}

/// Receives redirects requested outside of normal navigation, such as the
/// forced return to login after a rejected credential.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Remembers the most recent redirect until the front end takes it
#[derive(Debug, Default)]
pub struct RedirectSlot {
    pending: Mutex<Option<Route>>,
}

impl RedirectSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<Route> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn peek(&self) -> Option<Route> {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for RedirectSlot {
    fn navigate(&self, route: Route) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(route);
    }
}
