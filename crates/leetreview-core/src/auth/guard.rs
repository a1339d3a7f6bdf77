use crate::routes::Route;

use super::SessionStatus;

/// Outcome of a navigation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Redirect(Route),
    /// Startup check still running; render nothing yet
    Pending,
}

/// Decides whether a view may be shown for the current session status.
/// Implementations hold no state of their own.
pub trait Guard: Send + Sync {
    fn admit(&self, status: &SessionStatus) -> Admission;
}

/// Views that need a signed-in user; everyone else goes to login
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedOnly;

impl Guard for AuthenticatedOnly {
    fn admit(&self, status: &SessionStatus) -> Admission {
        match status {
            SessionStatus::Loading => Admission::Pending,
            SessionStatus::Authenticated(_) => Admission::Allow,
            SessionStatus::Unauthenticated => Admission::Redirect(Route::Login),
        }
    }
}

/// Login and registration; signed-in users are sent to the dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct UnauthenticatedOnly;

impl Guard for UnauthenticatedOnly {
    fn admit(&self, status: &SessionStatus) -> Admission {
        match status {
            SessionStatus::Loading => Admission::Pending,
            SessionStatus::Authenticated(_) => Admission::Redirect(Route::Dashboard),
            SessionStatus::Unauthenticated => Admission::Allow,
        }
    }
}
