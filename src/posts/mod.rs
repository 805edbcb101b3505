use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub mod handler;
pub mod pagination;

/// Database model for a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A post joined with its owner's username and like state for one viewer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub likes: i64,
    pub liked: bool,
}

/// Serialized post as clients see it
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    /// Owner's username
    pub user: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub likes: i64,
    pub liked: bool,
}

impl From<PostView> for PostResponse {
    fn from(p: PostView) -> Self {
        PostResponse {
            id: p.id,
            user: p.username,
            content: p.content,
            timestamp: p.created_at,
            likes: p.likes,
            liked: p.liked,
        }
    }
}

/// Which posts a feed request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSelector {
    All,
    Profile,
    Following,
}

impl std::str::FromStr for FeedSelector {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FeedSelector::All),
            "profile" => Ok(FeedSelector::Profile),
            "following" => Ok(FeedSelector::Following),
            _ => Err(AppError::BadRequest("Invalid post.".to_string())),
        }
    }
}

/// Query parameters for feed pages. `page` stays a raw string so that
/// garbage falls back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub username: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditPost {
    pub content: String,
}

/// Response for a feed page
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
    pub count: i64,
    pub num_pages: i64,
    pub posts: Vec<PostResponse>,
    #[serde(rename = "connectedUser")]
    pub connected_user: String,
}

#[derive(Debug, Serialize)]
pub struct EditPostResponse {
    pub message: String,
    pub post: PostResponse,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeResponse {
    pub likes: i64,
    pub liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_selectors() {
        assert_eq!("all".parse::<FeedSelector>().ok(), Some(FeedSelector::All));
        assert_eq!(
            "profile".parse::<FeedSelector>().ok(),
            Some(FeedSelector::Profile)
        );
        assert_eq!(
            "following".parse::<FeedSelector>().ok(),
            Some(FeedSelector::Following)
        );
    }

    #[test]
    fn rejects_unknown_selector_as_bad_request() {
        let err = "everything".parse::<FeedSelector>().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!("All".parse::<FeedSelector>().is_err());
    }
}
