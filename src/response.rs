use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A successful JSON payload. The body is the payload itself, with no envelope,
/// so clients read fields such as `likes` or `posts` at the top level.
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Creates a success response with data.
    /// Status code defaults to 200 OK.
    pub fn success(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// Converts to a response with a custom status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Shorthand for 201 Created response.
    /// Usage: `ApiResponse::message("...").created()`
    pub fn created(self) -> Self {
        self.with_status(StatusCode::CREATED)
    }
}

/// Body for responses that only carry a confirmation.
#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl ApiResponse<MessageBody> {
    /// Creates a success response with just a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(MessageBody {
            message: message.into(),
        })
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.status, Json(self.data)).into_response()
    }
}
