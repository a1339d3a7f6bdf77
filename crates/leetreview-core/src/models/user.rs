use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Server default for `notification_time` when registration omits it
pub const DEFAULT_NOTIFICATION_TIME: &str = "09:00";

/// Server default for `timezone` when registration omits it
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Profile of the signed-in user as returned by `/auth/users/me`.
///
/// `GET` renders `notification_time` as `HH:MM` while `PUT` echoes the raw
/// column (`HH:MM:SS`); both are normalized to `HH:MM`. Extra columns in the
/// `PUT` echo (ids, hashes, timestamps) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(deserialize_with = "hours_minutes")]
    pub notification_time: String,
    pub timezone: String,
}

fn hours_minutes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_notification_time(&raw))
}

/// Reduce `HH:MM:SS[.ffffff]` to `HH:MM`; anything unparseable is kept as-is
pub fn normalize_notification_time(raw: &str) -> String {
    ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Check that a notification time is a 24h `HH:MM` value
pub fn is_valid_notification_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

/// Partial profile update for `PUT /auth/users/me`.
/// Unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl UserUpdate {
    pub fn with_notification_time(mut self, value: impl Into<String>) -> Self {
        self.notification_time = Some(value.into());
        self
    }

    pub fn with_timezone(mut self, value: impl Into<String>) -> Self {
        self.timezone = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.notification_time.is_none() && self.timezone.is_none()
    }
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Query of `POST /auth/reset-password`
#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Token issued by `/auth/token` and `/auth/register`
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Generic `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
