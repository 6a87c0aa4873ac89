//! Boundary response shapes.
//!
//! The only place where internal outcomes become wire fields: policy
//! rejections surface with their stable code and hint fields, infrastructure
//! failures collapse to one generic message with no internal detail.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::LoginSuccess;
use warden_core::{Error, SessionUser, error::PolicyRejection, ip_block::BlockedIp};

const GENERIC_FAILURE: &str = "Login failed, try again later";

/// Wire shape for the login endpoint, both outcomes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,

    #[serde(
        rename = "remainingIPAttempts",
        skip_serializing_if = "Option::is_none"
    )]
    pub remaining_ip_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
}

impl LoginResponse {
    /// Map a login outcome to HTTP status and body.
    pub fn from_result(result: &Result<LoginSuccess, Error>) -> (u16, LoginResponse) {
        match result {
            Ok(success) => (200, Self::success(success)),
            Err(error) => (error.http_status(), Self::failure(error)),
        }
    }

    pub fn success(login: &LoginSuccess) -> Self {
        Self {
            success: true,
            user: Some(login.user.clone()),
            token: Some(login.session.token.as_str().to_string()),
            error: None,
            code: None,
            remaining_attempts: None,
            remaining_ip_attempts: None,
            retry_after: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        let mut response = Self {
            success: false,
            user: None,
            token: None,
            error: Some(GENERIC_FAILURE.to_string()),
            code: None,
            remaining_attempts: None,
            remaining_ip_attempts: None,
            retry_after: None,
        };

        // Only policy rejections carry detail; everything else stays generic.
        if let Error::Policy(rejection) = error {
            response.error = Some(rejection.to_string());
            response.code = rejection.code();
            response.retry_after = rejection.retry_after_secs();
            if let PolicyRejection::InvalidCredentials {
                remaining_attempts,
                remaining_ip_attempts,
            } = rejection
            {
                response.remaining_attempts = *remaining_attempts;
                response.remaining_ip_attempts = *remaining_ip_attempts;
            }
        }

        response
    }
}

/// Admin listing entry for a blocked address, with the time remaining
/// computed at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedIpView {
    pub id: i64,
    pub ip_address: String,
    pub reason: String,
    pub failed_count: u32,
    pub blocked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub seconds_remaining: i64,
}

impl BlockedIpView {
    pub fn from_block(block: &BlockedIp, now: DateTime<Utc>) -> Self {
        Self {
            id: block.id,
            ip_address: block.ip_address.clone(),
            reason: block.reason.clone(),
            failed_count: block.failed_count,
            blocked_at: block.blocked_at,
            expires_at: block.expires_at,
            seconds_remaining: block.seconds_remaining(now),
        }
    }
}
