//! Phone + OTP authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::models::UserProfile;

pub const LOGIN_PATH: &str = "/auth/login";
pub const VERIFY_OTP_PATH: &str = "/auth/verifyotp";

/// Request an OTP for a phone number.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginPayload {
    pub phone: String,
    pub dev: bool,
}

/// Exchange an OTP for a token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerifyOtpPayload {
    pub phone: String,
    pub otp: String,
    pub dev: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl ApiClient {
    /// `POST /auth/login`. No token is issued here; the server sends an OTP.
    pub async fn login(&self, payload: &LoginPayload) -> ClientResult<Value> {
        self.post(LOGIN_PATH, payload).await
    }

    /// `POST /auth/verifyotp`. Does not touch the session. An empty success
    /// body carries neither token nor user.
    pub async fn verify_otp(&self, payload: &VerifyOtpPayload) -> ClientResult<VerifyOtpResponse> {
        let body: Value = self.post(VERIFY_OTP_PATH, payload).await?;
        if body.is_null() {
            return Ok(VerifyOtpResponse::default());
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Verify the OTP and write whatever the server returned into the session.
    pub async fn verify_and_store(
        &self,
        payload: &VerifyOtpPayload,
    ) -> ClientResult<VerifyOtpResponse> {
        let response = self.verify_otp(payload).await?;
        self.session().apply_verification(&response)?;
        info!(
            token_issued = response.token.is_some(),
            user_issued = response.user.is_some(),
            "otp verified"
        );
        Ok(response)
    }
}
