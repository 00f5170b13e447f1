//! User and session models.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as issued by the verify step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Server-side user ID
    #[serde(
        rename = "userid",
        alias = "id",
        deserialize_with = "super::order::string_or_number"
    )]
    pub id: String,
    /// Account type (e.g., "customer")
    #[serde(rename = "userType", alias = "type", default)]
    pub user_type: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Phone number in international format
    #[serde(default)]
    pub phone: String,
}

/// The authenticated identity held by the client.
///
/// `token` is present iff the user is considered authenticated. `user` may
/// lag behind the token while the login flow is completing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// A session with neither token nor user.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
