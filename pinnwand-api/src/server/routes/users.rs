use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, AuthorizationHeader},
    extract::Json,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::{
    routing::{RouterExt, TypedPath},
    typed_header::TypedHeaderRejection,
};
use pinnwand_common::{
    model::{
        ValidationErrors,
        auth::{AuthToken, Authentication, TOKEN_TTL, hash_password, verify_password},
        user::{CurrentUser, LoginUser, RegisterUser, UsernameTakenError},
    },
    util::PositiveDuration,
};
use pinnwand_db::client::{DbClient, DbError, constraint};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register_user)
        .typed_post(login)
        .typed_delete(logout)
        .typed_get(current_user)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users", rejection(ServerError))]
struct RegisterUserPath();

async fn register_user(
    RegisterUserPath(): RegisterUserPath,
    State(db): State<Arc<DbClient>>,
    Json(register): Json<RegisterUser>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let new_user = register.validate()?;
    let password_hash = hash_password(&new_user.password)?;

    let user = db
        .create_user(&new_user.username, &password_hash)
        .await
        .map_err(map_register_constraints)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// A registration colliding with an existing account is a field-level 400
/// on `username`.
fn map_register_constraints(err: DbError) -> ServerError {
    match err {
        DbError::UniqueViolation { ref constraint }
            if constraint == constraint::USERNAME_UNIQUE =>
        {
            ValidationErrors::single("username", UsernameTakenError.to_string()).into()
        }
        err => ServerError::from(err),
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/login", rejection(ServerError))]
struct LoginPath();

/// Reply to a successful login.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: CurrentUser,
}

async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    Json(login): Json<LoginUser>,
) -> Result<Json<LoginResponse>> {
    let credentials = db
        .fetch_credentials(&login.username)
        .await?
        .ok_or(ServerError::BadCredentials)?;

    if !verify_password(&login.password, &credentials.password_hash)? {
        return Err(ServerError::BadCredentials);
    }

    let token = AuthToken::generate_random(credentials.user);
    let authentication = Authentication {
        user: credentials.user,
        token_hash: token.hash()?,
        created_at: OffsetDateTime::now_utc(),
        expires_after: Some(PositiveDuration::new_unchecked(TOKEN_TTL)),
    };
    db.create_auth(&authentication).await?;

    let user = db
        .fetch_current_user(credentials.user)
        .await?
        .ok_or(ServerError::BadCredentials)?;

    Ok(Json(LoginResponse {
        token: token.as_token_str(),
        user,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/logout", rejection(ServerError))]
struct LogoutPath();

async fn logout(
    LogoutPath(): LogoutPath,
    State(db): State<Arc<DbClient>>,
    header: Result<AuthorizationHeader, TypedHeaderRejection>,
) -> Result<StatusCode> {
    let header = header.map_err(ServerError::InvalidAuthorizationHeader)?;
    let token: AuthToken = header.token().parse()?;

    if db.delete_auth(&token.hash()?).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::InvalidToken)
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/me", rejection(ServerError))]
struct CurrentUserPath();

async fn current_user(
    CurrentUserPath(): CurrentUserPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<CurrentUser>> {
    let user = db
        .fetch_current_user(user.user_id())
        .await?
        .ok_or(ServerError::InvalidToken)?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, routes::users::map_register_constraints};
    use axum::http::StatusCode;
    use pinnwand_db::client::{DbError, constraint};

    #[test]
    fn taken_username_becomes_a_validation_reply() {
        let err = map_register_constraints(DbError::UniqueViolation {
            constraint: constraint::USERNAME_UNIQUE.to_owned(),
        });

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            errors.messages("username"),
            ["A user with that username already exists."]
        );
    }

    #[test]
    fn unrelated_constraints_stay_server_faults() {
        let err = map_register_constraints(DbError::UniqueViolation {
            constraint: "profiles_owner_id_key".to_owned(),
        });

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
