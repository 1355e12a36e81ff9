//! Wire types for the notify service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard response from every email endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// The email templates the notify service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailKind {
    Welcome,
    SecurityCode,
    RecoveryCode,
    ServiceAlert,
    LoginLink,
    Generic,
}

impl EmailKind {
    pub const ALL: [Self; 6] = [
        Self::Welcome,
        Self::SecurityCode,
        Self::RecoveryCode,
        Self::ServiceAlert,
        Self::LoginLink,
        Self::Generic,
    ];

    /// Returns the path segment under `/api/email/`.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::SecurityCode => "security-code",
            Self::RecoveryCode => "recovery-code",
            Self::ServiceAlert => "service-alert",
            Self::LoginLink => "login-link",
            Self::Generic => "generic",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmailRequest {
    pub to: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCodeEmailRequest {
    pub to: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryCodeEmailRequest {
    pub to: String,
    pub user_name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAlertEmailRequest {
    pub to: String,
    pub alert_title: String,
    pub alert_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLinkEmailRequest {
    pub to: String,
    pub login_link: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericEmailRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
}
