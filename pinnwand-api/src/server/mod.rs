use axum::{
    Router,
    extract::{
        DefaultBodyLimit, FromRef, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use extract::Json;
use media::MediaStore;
use pinnwand_common::model::{
    Id, NotOwnerError, ValidationErrors,
    auth::{AuthTokenDecodeError, AuthTokenHashError, InvalidPasswordHashError, PasswordHashError},
    comment::CommentMarker,
    follower::FollowerMarker,
    like::LikeMarker,
    post::PostMarker,
    profile::ProfileMarker,
};
use pinnwand_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::{io, sync::Arc};
use thiserror::Error;
use tracing::error;

mod auth;
mod extract;
pub mod media;
mod routes;

pub use auth::AuthenticatedUser;

/// Uploads have to reach the image validator to be answered with its
/// field-level message, so the transport limit sits above the image limit.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub media_store: Arc<MediaStore>,
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Incoming query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming multipart form rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Reading multipart form failed: {0}")]
    Multipart(#[from] MultipartError),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error("Provided credentials were invalid")]
    BadCredentials,
    #[error("The stored password hash could not be used: {0}")]
    StoredCredentials(#[from] InvalidPasswordHashError),
    #[error("The password could not be hashed: {0}")]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    NotOwner(#[from] NotOwnerError),
    #[error("Media file could not be stored: {0}")]
    Media(#[from] io::Error),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Profile with id {0} was not found.")]
    ProfileByIdNotFound(Id<ProfileMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
    #[error("Like with id {0} was not found.")]
    LikeByIdNotFound(Id<LikeMarker>),
    #[error("Follower edge with id {0} was not found.")]
    FollowerByIdNotFound(Id<FollowerMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::Database(DbError::RowVanished)
            | ServerError::PostByIdNotFound(_)
            | ServerError::ProfileByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_)
            | ServerError::LikeByIdNotFound(_)
            | ServerError::FollowerByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::JsonRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::MultipartRejection(_)
            | ServerError::Multipart(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_)
            | ServerError::InvalidToken
            | ServerError::BadCredentials
            | ServerError::NotOwner(_) => StatusCode::FORBIDDEN,
            ServerError::JsonResponse(_)
            | ServerError::AuthTokenHash(_)
            | ServerError::StoredCredentials(_)
            | ServerError::PasswordHash(_)
            | ServerError::Media(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable reason served under `detail`. Validation replies carry
    /// their field map instead, and server faults stay opaque.
    fn detail(&self) -> Option<String> {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::Database(DbError::RowVanished)
            | ServerError::PostByIdNotFound(_)
            | ServerError::ProfileByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_)
            | ServerError::LikeByIdNotFound(_)
            | ServerError::FollowerByIdNotFound(_) => Some("Not found.".to_owned()),
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                Some("Authentication credentials were not provided.".to_owned())
            }
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_)
            | ServerError::InvalidToken => Some("Invalid token.".to_owned()),
            ServerError::BadCredentials => {
                Some("Unable to log in with provided credentials.".to_owned())
            }
            ServerError::NotOwner(_) => {
                Some("You do not have permission to perform this action.".to_owned())
            }
            ServerError::JsonRejection(rejection) => Some(rejection.body_text()),
            ServerError::QueryRejection(rejection) => Some(rejection.body_text()),
            ServerError::MultipartRejection(rejection) => Some(rejection.body_text()),
            ServerError::Multipart(err) => Some(err.body_text()),
            ServerError::Validation(_)
            | ServerError::JsonResponse(_)
            | ServerError::AuthTokenHash(_)
            | ServerError::StoredCredentials(_)
            | ServerError::PasswordHash(_)
            | ServerError::Media(_)
            | ServerError::Database(_) => None,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            detail: self.detail(),
            errors: match self {
                ServerError::Validation(errors) => Some(errors),
                _ => None,
            },
        };
        (status, Json(error_response)).into_response()
    }
}
