//! Wire types for the auth service.

use serde::{Deserialize, Serialize};

/// Returned by `GET /api/session`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Body of `POST /api/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSessionRequest {
    pub session_id: String,
}

/// Returned by `POST /api/session`, `DELETE /api/session`, and `DELETE /api/2fa`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteSessionResponse {
    #[serde(default)]
    pub message: String,
}

/// Returned by `GET /api/2fa`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoFactorStatusResponse {
    pub two_factor_enabled: bool,
}

/// Returned by `POST /api/2fa`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingSessionResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Body of `POST /api/2fa/lockout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutRequest {
    pub user_id: String,
}

/// Returned by `POST /api/2fa/lockout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutResponse {
    pub duration: i64,
}

/// Returned by `GET /api/2fa/lockout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutStatusResponse {
    pub success: bool,
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lock_message: String,
    #[serde(default)]
    pub remaining_time: i64,
    #[serde(default)]
    pub attempt_count: i64,
    #[serde(default)]
    pub max_attempts: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_attempt_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Generic `{success, message, error}` body used by several 2FA endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Body of `POST /api/2fa/configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureTwoFactorRequest {
    pub secret: String,
    pub code: String,
    pub backup_codes: String,
}

/// Body of `POST /api/2fa/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyTwoFactorRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_url: String,
    #[serde(default)]
    pub remember_device: bool,
}

/// Returned by `POST /api/2fa/verify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyTwoFactorResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub lock_duration: i64,
}

/// Body of `POST /api/2fa/reset`. One of the two fields is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetTwoFactorRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backup_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

/// Body of `POST /api/2fa/backup-codes`: a current TOTP code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateBackupCodesRequest {
    pub code: String,
}

/// Returned by `POST /api/2fa/backup-codes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateBackupCodesResponse {
    pub success: bool,
    #[serde(default)]
    pub backup_codes: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Returned by `GET /api/2fa/trusted-device`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustedDeviceResponse {
    pub success: bool,
    pub is_trusted: bool,
    pub can_bypass_2fa: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Body of `POST /api/2fa/recovery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateRecoveryRequest {
    pub email: String,
}

/// Body of `POST /api/2fa/recovery/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRecoveryCodeRequest {
    pub email: String,
    pub recovery_code: String,
}

/// Returned by `POST /api/2fa/recovery/verify`. `access_token` is a
/// short-lived token that only authorizes a 2FA reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyRecoveryCodeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_tolerates_missing_fields() {
        let parsed: SessionResponse = serde_json::from_str(r#"{"valid":false}"#).expect("decode");
        assert!(!parsed.valid);
        assert!(parsed.user_id.is_empty());
        assert!(parsed.provider.is_empty());
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let json = serde_json::to_string(&SessionResponse {
            valid: true,
            user_id: "u1".to_string(),
            ..SessionResponse::default()
        })
        .expect("encode");
        assert_eq!(json, r#"{"valid":true,"user_id":"u1"}"#);
    }
}
