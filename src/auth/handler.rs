use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use validator::Validate;

use crate::{
    auth::{
        jwt::{self, CurrentUser},
        utils, LoginUser, MainView, RegisterUser, User,
    },
    config::settings::Settings,
    error::AppError,
    response::ApiResponse,
    store::DynStore,
};

/// Main view for signed-in users; everyone else is sent to the login page.
/// GET /
pub async fn index(user: Option<CurrentUser>) -> Response {
    match user {
        Some(user) => ApiResponse::success(MainView {
            connected_user: user.username,
        })
        .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /login
pub async fn login_page(user: Option<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    ApiResponse::message("Sign in with your username and password.").into_response()
}

/// GET /register
pub async fn register_page(user: Option<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    ApiResponse::message("Choose a username, email and password to register.").into_response()
}

/// POST /login
pub async fn login(
    State(store): State<DynStore>,
    State(settings): State<Settings>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginUser>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|_| AppError::InvalidCredentials)?;

    let user = store
        .find_user_by_username(&payload.username)
        .await
        .map_err(AppError::internal)?;

    let user = match user {
        Some(user) if utils::verify_password(&user.password_hash, &payload.password).is_ok() => {
            user
        }
        _ => {
            tracing::info!("Failed login for {}", payload.username);
            return Err(AppError::InvalidCredentials);
        }
    };

    start_session(jar, &settings, &user)
}

/// POST /register
pub async fn register(
    State(store): State<DynStore>,
    State(settings): State<Settings>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterUser>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    if payload.password != payload.confirmation {
        return Err(AppError::BadRequest("Passwords must match.".to_string()));
    }
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let password_hash = utils::hash_password(&payload.password).map_err(AppError::internal)?;

    let user = store
        .create_user(&payload.username, &payload.email, &password_hash)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::Conflict("Username already taken.".to_string()))?;

    tracing::info!("Registered user {}", user.username);

    start_session(jar, &settings, &user)
}

/// GET|POST /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jwt::clear_session(jar), Redirect::to("/"))
}

fn start_session(
    jar: CookieJar,
    settings: &Settings,
    user: &User,
) -> Result<(CookieJar, Redirect), AppError> {
    let token = jwt::create_token(
        user.id,
        &user.username,
        &settings.jwt_secret,
        settings.session_ttl_hours,
    )
    .map_err(AppError::internal)?;

    Ok((
        jar.add(jwt::session_cookie(token, settings)),
        Redirect::to("/"),
    ))
}
