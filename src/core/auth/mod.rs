use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const OFFLINE_CLIENT_ID: &str = "00000000402B5328";
const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";

/// Identity values substituted into the game arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchAccountProfile {
    pub username: String,
    /// Dashless UUID, fresh for every launch.
    pub uuid: String,
    pub access_token: String,
    pub xuid: String,
    pub user_type: String,
    pub client_id: String,
}

impl LaunchAccountProfile {
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => "Player",
            name => name,
        };

        Self {
            username: username.to_string(),
            uuid: Uuid::new_v4().simple().to_string(),
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            xuid: "0".into(),
            user_type: "legacy".into(),
            client_id: OFFLINE_CLIENT_ID.into(),
        }
    }
}
