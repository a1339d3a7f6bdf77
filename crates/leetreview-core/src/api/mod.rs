//! REST API client module for the review service.
//!
//! `Gateway` is the single pipeline every call goes through: it prefixes
//! `/api`, attaches the stored bearer token and turns a `401` into a global
//! credential reset. Endpoint methods live next to it, grouped by resource:
//!
//! - `auth`: register, login, password reset, profile read/update
//! - `problems`: problem CRUD, review queue, completion, postponement, stats

pub mod auth;
pub mod error;
pub mod gateway;
pub mod problems;

pub use error::ApiError;
pub use gateway::{Gateway, UnauthorizedHandler, API_PREFIX, REQUEST_TIMEOUT_SECS};
pub use problems::MAX_POSTPONE_DAYS;
