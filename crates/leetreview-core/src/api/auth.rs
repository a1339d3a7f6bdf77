//! Account endpoints under `/auth`.

use reqwest::Method;

use crate::models::{
    AccessToken, Acknowledgement, PasswordReset, Registration, User, UserUpdate,
    is_valid_notification_time,
};

use super::{ApiError, Gateway};

impl Gateway {
    /// Create an account and receive its first token
    pub async fn register(&self, registration: &Registration) -> Result<AccessToken, ApiError> {
        if let Some(ref time) = registration.notification_time {
            check_notification_time(time)?;
        }
        self.request(Method::POST, "/auth/register", |rb| rb.json(registration))
            .await
    }

    /// Exchange email and password for a token (OAuth2 password form)
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, ApiError> {
        self.request(Method::POST, "/auth/token", |rb| {
            rb.form(&[("username", email), ("password", password)])
        })
        .await
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<Acknowledgement, ApiError> {
        self.request(Method::POST, "/auth/reset-password", |rb| rb.query(reset))
            .await
    }

    /// Partial profile update; the server takes the fields as query parameters
    /// and answers with the full record.
    pub async fn update_user(&self, update: &UserUpdate) -> Result<User, ApiError> {
        if let Some(ref time) = update.notification_time {
            check_notification_time(time)?;
        }
        self.request(Method::PUT, "/auth/users/me", |rb| rb.query(update))
            .await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/auth/users/me").await
    }
}

fn check_notification_time(value: &str) -> Result<(), ApiError> {
    if is_valid_notification_time(value) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Notification time must be HH:MM (24h), got '{}'",
            value
        )))
    }
}
