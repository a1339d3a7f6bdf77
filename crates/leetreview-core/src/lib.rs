//! Client core for the leetreview spaced-repetition service.
//!
//! - [`auth`]: token storage, the session manager and route guards
//! - [`api`]: the HTTP gateway and typed endpoint methods
//! - [`models`]: users, problems and review statistics
//! - [`routes`]: the navigation table and redirect capability
//! - [`config`]: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiError, Gateway};
pub use auth::{SessionError, SessionManager, SessionStatus, TokenStore};
pub use config::{Config, TokenBackend};
pub use routes::{Navigation, Navigator, RedirectSlot, Route};
