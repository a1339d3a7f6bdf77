//! Data models for the review service.
//!
//! - `User`, `UserUpdate`, `Registration`: account profile and auth payloads
//! - `Problem`, `ProblemPage`, `ProblemStats`: tracked problems and the review queue
//! - `ProblemQuery`, `ProblemUpdate`: list filters and edits

pub mod problem;
pub mod user;

pub use problem::{
    Difficulty, Problem, ProblemPage, ProblemQuery, ProblemStats, ProblemStatus, ProblemUpdate,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, REVIEW_STAGES,
};
pub use user::{
    is_valid_notification_time, normalize_notification_time, AccessToken, Acknowledgement,
    PasswordReset, Registration, User, UserUpdate, DEFAULT_NOTIFICATION_TIME, DEFAULT_TIMEZONE,
};
