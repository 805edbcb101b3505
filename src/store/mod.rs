use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::User,
    follows::FollowCounts,
    posts::{LikeResponse, Post, PostView},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn SocialStore>;

/// Which posts a feed query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    /// Posts owned by the user with this username.
    Author(String),
    /// Posts owned by any of these users.
    Authors(Vec<Uuid>),
}

/// Persistence for users, posts, likes and follow edges.
///
/// Every method is a single read or a short read-then-write sequence.
/// Missing rows come back as `None`/`false`, never as errors.
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Returns `None` when the username is already taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn create_post(&self, owner_id: Uuid, content: &str) -> anyhow::Result<Post>;
    async fn find_post(&self, id: i64) -> anyhow::Result<Option<Post>>;
    /// Only the content changes; owner and timestamp stay as created.
    async fn update_post_content(&self, id: i64, content: &str) -> anyhow::Result<bool>;
    async fn post_view(&self, id: i64, viewer_id: Uuid) -> anyhow::Result<Option<PostView>>;
    async fn count_posts(&self, filter: &FeedFilter) -> anyhow::Result<i64>;
    /// Newest first, ties broken by descending id.
    async fn list_posts(
        &self,
        filter: &FeedFilter,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>>;
    /// Flips the like state; `None` when the post does not exist.
    async fn toggle_like(&self, post_id: i64, user_id: Uuid)
        -> anyhow::Result<Option<LikeResponse>>;

    /// Returns whether a new edge was created.
    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool>;
    /// Returns whether an edge was removed.
    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool>;
    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool>;
    async fn followed_ids(&self, follower_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
    async fn follow_counts(&self, user_id: Uuid) -> anyhow::Result<FollowCounts>;
}
