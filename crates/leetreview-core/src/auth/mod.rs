//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the bearer credential (file, keychain, memory)
//! - `SessionManager`: login/register/logout/profile update and the session status
//! - `Guard`: route admission based on the session status
//!
//! Credentials have no local expiry; the server rejecting one (401) is the
//! only signal that it has become invalid.

pub mod guard;
pub mod session;
pub mod token_store;

pub use guard::{Admission, AuthenticatedOnly, Guard, UnauthenticatedOnly};
pub use session::{SessionError, SessionManager, SessionStatus};
pub use token_store::{
    Credential, FileTokenStore, KeyringTokenStore, MemoryTokenStore, StoreError, TokenStore,
    TOKEN_KEY,
};
