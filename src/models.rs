//! Client-side views of server records.
//!
//! Nothing here is authoritative: every value is re-fetched per view and
//! only mutated through a server round-trip.

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts an id encoded either as a JSON string or a JSON number.
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn flexible_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<u32>,
}

impl User {
    /// Name to show for this user, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("User")
    }
}

/// Body returned by `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<AuthResponse> for User {
    fn from(resp: AuthResponse) -> Self {
        User {
            id: resp.user_id,
            name: resp.name,
            email: resp.email,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub sessions_created: u32,
    #[serde(default)]
    pub sessions_joined: u32,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default, alias = "totalRatings")]
    pub rating_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
}

/// The signed-in user's own rating of another user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MyRating {
    #[serde(default)]
    pub has_rated: bool,
    #[serde(default)]
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    #[serde(default)]
    pub has_blocked: bool,
    #[serde(default)]
    pub is_blocked_by: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub year: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`
    #[serde(default)]
    pub time: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub join_requests: Vec<String>,
    #[serde(default)]
    pub participant_count: Option<u32>,
    #[serde(default)]
    pub spots_left: Option<i64>,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub creator_rating: Option<f64>,
    #[serde(default)]
    pub creator_rating_count: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub is_scheduled: bool,
    /// Epoch milliseconds.
    #[serde(default)]
    pub scheduled_start_time: Option<i64>,
}

impl Session {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id.as_deref() == Some(user_id)
    }

    pub fn has_pending_request(&self, user_id: &str) -> bool {
        self.join_requests.iter().any(|r| r == user_id)
    }

    pub fn participant_total(&self) -> u32 {
        self.participant_count
            .unwrap_or(self.participants.len() as u32)
    }

    /// Server-provided spots left, else derived from the participant cap.
    pub fn spots_left(&self) -> i64 {
        match self.spots_left {
            Some(spots) => spots,
            None => {
                let max = self.max_participants.unwrap_or(0) as i64;
                max - self.participant_total() as i64
            }
        }
    }
}

/// Payload for `POST /sessions`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub title: String,
    pub module: String,
    pub year: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<u32>,
    pub max_participants: Option<u32>,
    pub preferences: String,
    pub description: String,
    pub start_now: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub session_id: Option<String>,
    #[serde(deserialize_with = "flexible_id")]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub content: String,
    /// Epoch milliseconds, the chat cursor.
    pub timestamp: i64,
}
