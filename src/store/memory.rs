use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::User,
    follows::{Follow, FollowCounts},
    posts::{LikeResponse, Post, PostView},
    store::{FeedFilter, SocialStore},
};

/// Process-local store used by tests and by servers started without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    posts: BTreeMap<i64, StoredPost>,
    next_post_id: i64,
    follows: Vec<Follow>,
}

struct StoredPost {
    post: Post,
    likes: HashSet<Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn matches(&self, post: &Post, filter: &FeedFilter) -> bool {
        match filter {
            FeedFilter::All => true,
            FeedFilter::Author(username) => self
                .user(post.user_id)
                .is_some_and(|u| &u.username == username),
            FeedFilter::Authors(ids) => ids.contains(&post.user_id),
        }
    }

    fn view(&self, stored: &StoredPost, viewer_id: Uuid) -> PostView {
        PostView {
            id: stored.post.id,
            username: self
                .user(stored.post.user_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            content: stored.post.content.clone(),
            created_at: stored.post.created_at,
            likes: stored.likes.len() as i64,
            liked: stored.likes.contains(&viewer_id),
        }
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == username) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: chrono::Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.user(id).cloned())
    }

    async fn create_post(&self, owner_id: Uuid, content: &str) -> anyhow::Result<Post> {
        let mut inner = self.inner.write().await;
        inner.next_post_id += 1;
        let post = Post {
            id: inner.next_post_id,
            user_id: owner_id,
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        };
        inner.posts.insert(
            post.id,
            StoredPost {
                post: post.clone(),
                likes: HashSet::new(),
            },
        );
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> anyhow::Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).map(|p| p.post.clone()))
    }

    async fn update_post_content(&self, id: i64, content: &str) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.posts.get_mut(&id) {
            Some(stored) => {
                stored.post.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn post_view(&self, id: i64, viewer_id: Uuid) -> anyhow::Result<Option<PostView>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).map(|p| inner.view(p, viewer_id)))
    }

    async fn count_posts(&self, filter: &FeedFilter) -> anyhow::Result<i64> {
        let inner = self.inner.read().await;
        let count = inner
            .posts
            .values()
            .filter(|p| inner.matches(&p.post, filter))
            .count();
        Ok(count as i64)
    }

    async fn list_posts(
        &self,
        filter: &FeedFilter,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&StoredPost> = inner
            .posts
            .values()
            .filter(|p| inner.matches(&p.post, filter))
            .collect();
        matching.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.post.id.cmp(&a.post.id))
        });

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|p| inner.view(p, viewer_id))
            .collect())
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        user_id: Uuid,
    ) -> anyhow::Result<Option<LikeResponse>> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        let liked = if stored.likes.remove(&user_id) {
            false
        } else {
            stored.likes.insert(user_id);
            true
        };
        Ok(Some(LikeResponse {
            likes: stored.likes.len() as i64,
            liked,
        }))
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id);
        if exists {
            return Ok(false);
        }
        inner.follows.push(Follow {
            follower_id,
            followed_id,
            created_at: chrono::Utc::now(),
        });
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.followed_id == followed_id));
        Ok(inner.follows.len() < before)
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id))
    }

    async fn followed_ids(&self, follower_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .map(|f| f.followed_id)
            .collect())
    }

    async fn follow_counts(&self, user_id: Uuid) -> anyhow::Result<FollowCounts> {
        let inner = self.inner.read().await;
        let followers = inner.follows.iter().filter(|f| f.followed_id == user_id).count();
        let following = inner.follows.iter().filter(|f| f.follower_id == user_id).count();
        Ok(FollowCounts {
            followers: followers as i64,
            following: following as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(name, &format!("{name}@example.com"), "hash")
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_usernames_are_refused() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let again = store.create_user("alice", "other@example.com", "hash").await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn like_toggle_is_an_involution() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let post = store.create_post(alice.id, "hi").await.unwrap();

        let first = store.toggle_like(post.id, alice.id).await.unwrap().unwrap();
        assert_eq!(first, LikeResponse { likes: 1, liked: true });
        let second = store.toggle_like(post.id, alice.id).await.unwrap().unwrap();
        assert_eq!(second, LikeResponse { likes: 0, liked: false });

        assert!(store.toggle_like(post.id + 1, alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn updating_a_missing_post_reports_a_miss() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let post = store.create_post(alice.id, "hi").await.unwrap();

        assert!(store.update_post_content(post.id, "edited").await.unwrap());
        assert!(!store.update_post_content(post.id + 1, "edited").await.unwrap());
        assert_eq!(store.find_post(post.id).await.unwrap().unwrap().content, "edited");
    }

    #[tokio::test]
    async fn follow_is_idempotent_and_unfollow_is_silent() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        assert!(store.follow(alice.id, bob.id).await.unwrap());
        assert!(!store.follow(alice.id, bob.id).await.unwrap());
        assert_eq!(
            store.follow_counts(bob.id).await.unwrap(),
            FollowCounts { followers: 1, following: 0 }
        );

        assert!(store.unfollow(alice.id, bob.id).await.unwrap());
        assert!(!store.unfollow(alice.id, bob.id).await.unwrap());
        assert!(!store.is_following(alice.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        for i in 0..3 {
            store.create_post(alice.id, &format!("a{i}")).await.unwrap();
            store.create_post(bob.id, &format!("b{i}")).await.unwrap();
        }

        let all = store.list_posts(&FeedFilter::All, alice.id, 10, 0).await.unwrap();
        let contents: Vec<_> = all.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["b2", "a2", "b1", "a1", "b0", "a0"]);

        let by_bob = FeedFilter::Author("bob".to_string());
        assert_eq!(store.count_posts(&by_bob).await.unwrap(), 3);
        let page = store.list_posts(&by_bob, alice.id, 2, 1).await.unwrap();
        let contents: Vec<_> = page.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["b1", "b0"]);

        let nobody = FeedFilter::Authors(Vec::new());
        assert_eq!(store.count_posts(&nobody).await.unwrap(), 0);
    }
}
