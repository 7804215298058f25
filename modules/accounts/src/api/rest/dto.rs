use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::Credentials;

/// REST DTO for registration and login.
///
/// Missing fields deserialize as empty strings so the domain reports them
/// with its own validation message.
#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
pub struct CredentialsReq {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Plain confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// REST DTO for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResp {
    pub message: String,
    pub token: String,
}

impl From<CredentialsReq> for Credentials {
    fn from(req: CredentialsReq) -> Self {
        Self {
            username: req.username,
            password: req.password,
        }
    }
}

// Keep the password out of request logs.
impl std::fmt::Display for CredentialsReq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "username={}", self.username)
    }
}
