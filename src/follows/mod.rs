use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod handler;

/// Database model for a follow edge (follower -> followed)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

/// Profile summary as seen by the connected user
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool, // Whether the connected user follows this user
    #[serde(rename = "connectedUser")]
    pub connected_user: String,
}
