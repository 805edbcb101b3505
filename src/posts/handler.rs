use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::de::DeserializeOwned;

use crate::{
    auth::jwt::CurrentUser,
    error::AppError,
    posts::{
        pagination::{Page, PAGE_SIZE},
        EditPost, EditPostResponse, FeedQuery, FeedResponse, FeedSelector, NewPost, PostResponse,
    },
    response::ApiResponse,
    store::{DynStore, FeedFilter},
};

/// Parses a JSON request body, turning any syntax or shape error into a 400.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::BadRequest("Invalid data format.".to_string()))
}

/// Create a post owned by the connected user
/// POST /new_post
pub async fn new_post(
    State(store): State<DynStore>,
    user: CurrentUser,
    method: Method,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if method != Method::POST {
        return Err(AppError::BadRequest("POST request required.".to_string()));
    }

    let payload: NewPost = parse_json(&body)?;

    let post = store
        .create_post(user.id, &payload.content)
        .await
        .map_err(AppError::internal)?;

    tracing::debug!("Post {} created by {}", post.id, user.username);

    Ok(ApiResponse::message("Post created successfully.").created())
}

/// One page of posts, newest first
/// GET /posts/:selector/?username=&page=
pub async fn feed(
    State(store): State<DynStore>,
    user: CurrentUser,
    WithRejection(Path(selector), _): WithRejection<Path<String>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<FeedQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let filter = match selector.parse::<FeedSelector>()? {
        FeedSelector::All => FeedFilter::All,
        FeedSelector::Profile => FeedFilter::Author(query.username.unwrap_or_default()),
        FeedSelector::Following => {
            let followed = store
                .followed_ids(user.id)
                .await
                .map_err(AppError::internal)?;
            FeedFilter::Authors(followed)
        }
    };

    let count = store
        .count_posts(&filter)
        .await
        .map_err(AppError::internal)?;
    let page = Page::resolve(count, PAGE_SIZE, query.page.as_deref());

    let posts = store
        .list_posts(&filter, user.id, page.limit(), page.offset())
        .await
        .map_err(AppError::internal)?;

    Ok(ApiResponse::success(FeedResponse {
        next_page_number: page.next_page_number(),
        previous_page_number: page.previous_page_number(),
        count: page.count,
        num_pages: page.num_pages,
        posts: posts.into_iter().map(PostResponse::from).collect(),
        connected_user: user.username,
    }))
}

/// Replace the content of a post (owner only)
/// PUT /edit_post/:id/
pub async fn edit_post(
    State(store): State<DynStore>,
    user: CurrentUser,
    method: Method,
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, AppError>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let post = store
        .find_post(post_id)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound("Post not found.".to_string()))?;

    if post.user_id != user.id {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this post.".to_string(),
        ));
    }

    if method != Method::PUT {
        return Err(AppError::MethodNotAllowed(
            "Invalid request method.".to_string(),
        ));
    }

    let payload: EditPost = parse_json(&body)?;

    let found = store
        .update_post_content(post.id, &payload.content)
        .await
        .map_err(AppError::internal)?;
    if !found {
        return Err(AppError::NotFound("Post not found.".to_string()));
    }

    let updated = store
        .post_view(post.id, user.id)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound("Post not found.".to_string()))?;

    Ok(ApiResponse::success(EditPostResponse {
        message: "Post updated successfully.".to_string(),
        post: PostResponse::from(updated),
    }))
}

/// Like the post, or take the like back if it is already there
/// POST /like_post/:id/
pub async fn like_post(
    State(store): State<DynStore>,
    user: CurrentUser,
    method: Method,
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed(
            "POST request required.".to_string(),
        ));
    }

    let result = store
        .toggle_like(post_id, user.id)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound("Post not found.".to_string()))?;

    Ok(ApiResponse::success(result))
}
