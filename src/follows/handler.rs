use axum::{
    extract::{Path, State},
    http::Method,
    response::IntoResponse,
};

use crate::{
    auth::{jwt::CurrentUser, User},
    error::AppError,
    follows::ProfileResponse,
    response::ApiResponse,
    store::DynStore,
};

async fn find_user(store: &DynStore, username: &str) -> Result<User, AppError> {
    store
        .find_user_by_username(username)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound("User not found.".to_string()))
}

/// Follower stats for a user, relative to the connected user
/// GET /profile/:username/
pub async fn profile(
    State(store): State<DynStore>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let target = find_user(&store, &username).await?;

    let counts = store
        .follow_counts(target.id)
        .await
        .map_err(AppError::internal)?;

    let is_following = store
        .is_following(user.id, target.id)
        .await
        .map_err(AppError::internal)?;

    Ok(ApiResponse::success(ProfileResponse {
        followers_count: counts.followers,
        following_count: counts.following,
        is_following,
        connected_user: user.username,
    }))
}

/// Follow (POST) or unfollow (DELETE) a user
/// POST|DELETE /follow/:username/
pub async fn follow_user(
    State(store): State<DynStore>,
    user: CurrentUser,
    method: Method,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let unfollow = match method {
        Method::POST => false,
        Method::DELETE => true,
        _ => return Err(AppError::BadRequest("Invalid request method.".to_string())),
    };

    let target = find_user(&store, &username).await?;

    if target.id == user.id {
        let msg = if unfollow {
            "You cannot unfollow yourself."
        } else {
            "You cannot follow yourself."
        };
        return Err(AppError::BadRequest(msg.to_string()));
    }

    if unfollow {
        // Removing an edge that is not there is fine.
        store
            .unfollow(user.id, target.id)
            .await
            .map_err(AppError::internal)?;
        Ok(ApiResponse::message("Successfully unfollowed user."))
    } else {
        store
            .follow(user.id, target.id)
            .await
            .map_err(AppError::internal)?;
        Ok(ApiResponse::message("Successfully followed user."))
    }
}
