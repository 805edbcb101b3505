use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    auth::User,
    follows::FollowCounts,
    posts::{LikeResponse, Post, PostView},
    store::{FeedFilter, SocialStore},
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Shared SELECT for `PostView` rows; the caller appends filters and ordering.
fn post_view_query<'a>(viewer_id: Uuid) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT
            p.id, u.username, p.content, p.created_at,
            (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes,
            EXISTS (
                SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = "#,
    );
    qb.push_bind(viewer_id);
    qb.push(
        r#"
            ) AS liked
        FROM posts p
        JOIN users u ON p.user_id = u.id
        "#,
    );
    qb
}

fn push_feed_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &FeedFilter) {
    match filter {
        FeedFilter::All => {}
        FeedFilter::Author(username) => {
            qb.push(" WHERE u.username = ");
            qb.push_bind(username.clone());
        }
        FeedFilter::Authors(ids) => {
            qb.push(" WHERE p.user_id = ANY(");
            qb.push_bind(ids.clone());
            qb.push(")");
        }
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_post(&self, owner_id: Uuid, content: &str) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, content, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(owner_id)
        .bind(content)
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, user_id, content, created_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post_content(&self, id: i64, content: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE posts SET content = $1 WHERE id = $2")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn post_view(&self, id: i64, viewer_id: Uuid) -> anyhow::Result<Option<PostView>> {
        let mut qb = post_view_query(viewer_id);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);
        let post = qb
            .build_query_as::<PostView>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn count_posts(&self, filter: &FeedFilter) -> anyhow::Result<i64> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p JOIN users u ON p.user_id = u.id");
        push_feed_filter(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn list_posts(
        &self,
        filter: &FeedFilter,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>> {
        let mut qb = post_view_query(viewer_id);
        push_feed_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let posts = qb
            .build_query_as::<PostView>()
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        user_id: Uuid,
    ) -> anyhow::Result<Option<LikeResponse>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query(
                "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LikeResponse {
            likes,
            liked: !removed,
        }))
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower_id)
            .bind(followed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower_id)
            .bind(followed_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn followed_ids(&self, follower_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT followed_id FROM follows WHERE follower_id = $1",
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn follow_counts(&self, user_id: Uuid) -> anyhow::Result<FollowCounts> {
        let counts = sqlx::query_as::<_, FollowCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followed_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

/// These run against a real database and are skipped unless `DATABASE_URL`
/// is set. Names are randomized so runs can share one database.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let store = PgStore::connect(&url, 2).await.unwrap();
        store.migrate().await.unwrap();
        Some(store)
    }

    async fn user(store: &PgStore, name: &str) -> User {
        let username = format!("{name}-{}", Uuid::new_v4().simple());
        store
            .create_user(&username, &format!("{username}@example.com"), "hash")
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_usernames_are_refused() {
        let Some(store) = store().await else { return };
        let alice = user(&store, "alice").await;
        let again = store
            .create_user(&alice.username, "other@example.com", "hash")
            .await
            .unwrap();
        assert!(again.is_none());
        let found = store.find_user_by_username(&alice.username).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
    }

    #[tokio::test]
    async fn like_toggle_is_an_involution() {
        let Some(store) = store().await else { return };
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = store.create_post(alice.id, "hi").await.unwrap();

        let first = store.toggle_like(post.id, bob.id).await.unwrap().unwrap();
        assert_eq!(first, LikeResponse { likes: 1, liked: true });
        let view = store.post_view(post.id, bob.id).await.unwrap().unwrap();
        assert!(view.liked);
        assert_eq!(view.likes, 1);
        assert!(!store.post_view(post.id, alice.id).await.unwrap().unwrap().liked);

        let second = store.toggle_like(post.id, bob.id).await.unwrap().unwrap();
        assert_eq!(second, LikeResponse { likes: 0, liked: false });

        assert!(store.toggle_like(-1, bob.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_touches_content_only() {
        let Some(store) = store().await else { return };
        let alice = user(&store, "alice").await;
        let post = store.create_post(alice.id, "before").await.unwrap();

        assert!(store.update_post_content(post.id, "after").await.unwrap());
        assert!(!store.update_post_content(-1, "after").await.unwrap());

        let stored = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "after");
        assert_eq!(stored.user_id, alice.id);
        assert_eq!(stored.created_at, post.created_at);
    }

    #[tokio::test]
    async fn follow_is_idempotent_and_unfollow_is_silent() {
        let Some(store) = store().await else { return };
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        assert!(store.follow(alice.id, bob.id).await.unwrap());
        assert!(!store.follow(alice.id, bob.id).await.unwrap());
        assert_eq!(
            store.follow_counts(bob.id).await.unwrap(),
            FollowCounts { followers: 1, following: 0 }
        );
        assert_eq!(store.followed_ids(alice.id).await.unwrap(), vec![bob.id]);

        assert!(store.unfollow(alice.id, bob.id).await.unwrap());
        assert!(!store.unfollow(alice.id, bob.id).await.unwrap());
        assert!(!store.is_following(alice.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn feed_filters_and_ordering() {
        let Some(store) = store().await else { return };
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;
        for i in 0..3 {
            store.create_post(alice.id, &format!("a{i}")).await.unwrap();
            store.create_post(bob.id, &format!("b{i}")).await.unwrap();
        }
        store.create_post(carol.id, "c0").await.unwrap();

        let by_bob = FeedFilter::Author(bob.username.clone());
        assert_eq!(store.count_posts(&by_bob).await.unwrap(), 3);
        let page = store.list_posts(&by_bob, alice.id, 2, 1).await.unwrap();
        let contents: Vec<_> = page.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["b1", "b0"]);
        assert!(page.iter().all(|p| p.username == bob.username));

        let followed = FeedFilter::Authors(vec![alice.id, bob.id]);
        assert_eq!(store.count_posts(&followed).await.unwrap(), 6);
        let all = store.list_posts(&followed, carol.id, 10, 0).await.unwrap();
        let contents: Vec<_> = all.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["b2", "a2", "b1", "a1", "b0", "a0"]);

        let nobody = FeedFilter::Authors(Vec::new());
        assert_eq!(store.count_posts(&nobody).await.unwrap(), 0);
        assert!(store.list_posts(&nobody, alice.id, 10, 0).await.unwrap().is_empty());
    }
}
