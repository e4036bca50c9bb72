//! Route guard for the client's fixed set of views.
//!
//! | Route    | Path        | Requires auth |
//! |----------|-------------|---------------|
//! | Login    | `/login`    | no            |
//! | Home     | `/`         | yes           |
//! | Pomodoro | `/pomodoro` | yes           |
//! | Data     | `/data`     | yes           |
//! | Settings | `/settings` | yes           |

use crate::session::SessionStore;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    Login,
    Home,
    Pomodoro,
    Data,
    Settings,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Login,
        Route::Home,
        Route::Pomodoro,
        Route::Data,
        Route::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/",
            Route::Pomodoro => "/pomodoro",
            Route::Data => "/data",
            Route::Settings => "/settings",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Home => "Home",
            Route::Pomodoro => "Pomodoro",
            Route::Data => "Data",
            Route::Settings => "Settings",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Matches a path, ignoring any query string, fragment and trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(Route),
}

/// Decides what happens when navigating to `target`.
pub fn guard(target: Route, is_logged_in: bool) -> Navigation {
    if target.requires_auth() && !is_logged_in {
        Navigation::Redirect(Route::Login)
    } else if target == Route::Login && is_logged_in {
        Navigation::Redirect(Route::Home)
    } else {
        Navigation::Allow
    }
}

/// Source of the logged-in flag the guard consults.
pub trait AuthState: Send + Sync {
    fn is_logged_in(&self) -> bool;
}

impl AuthState for SessionStore {
    fn is_logged_in(&self) -> bool {
        SessionStore::is_logged_in(self)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("No route matches {0}")]
    NotFound(String),
}

/// Runs the guard against live session state and remembers where the user
/// ended up.
pub struct Router {
    auth: Arc<dyn AuthState>,
    current: Mutex<Option<Route>>,
}

impl Router {
    pub fn new(auth: Arc<dyn AuthState>) -> Self {
        Self {
            auth,
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<Route> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigates to `path`, following guard redirects, and returns the route
    /// finally shown.
    pub fn navigate(&self, path: &str) -> Result<Route, RouterError> {
        let target = Route::from_path(path).ok_or_else(|| RouterError::NotFound(path.to_string()))?;
        let resolved = self.resolve(target);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(resolved);
        Ok(resolved)
    }

    /// Follows redirects until the guard allows a route. Every redirect
    /// target is allowed under the same flag, so this settles in one hop.
    pub fn resolve(&self, target: Route) -> Route {
        let is_logged_in = self.auth.is_logged_in();
        let mut route = target;
        for _ in 0..Route::ALL.len() {
            match guard(route, is_logged_in) {
                Navigation::Allow => return route,
                Navigation::Redirect(next) => {
                    debug!(from = route.path(), to = next.path(), "Route guard redirect");
                    route = next;
                }
            }
        }
        route
    }
}
