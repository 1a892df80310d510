use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    DanglingReferenceError, DuplicateError, Id, PageQuery, ValidationErrors, ensure_owner,
    follower::{CreateFollower, Follower, FollowerMarker},
    user::UserMarker,
};
use pinnwand_db::client::{DbClient, DbError, constraint};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_followers)
        .typed_post(create_follower)
        .typed_get(get_follower)
        .typed_delete(delete_follower)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/followers", rejection(ServerError))]
struct FollowersPath();

async fn list_followers(
    FollowersPath(): FollowersPath,
    State(db): State<Arc<DbClient>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Follower>>> {
    let followers = db.list_followers(&page).await?;

    Ok(Json(followers))
}

async fn create_follower(
    FollowersPath(): FollowersPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(create): Json<CreateFollower>,
) -> Result<(StatusCode, Json<Follower>)> {
    let followed = create.validate(user.user_id())?;

    let follower = db
        .create_follower(user.user_id(), followed)
        .await
        .map_err(|err| map_create_constraints(followed, err))?;

    Ok((StatusCode::CREATED, Json(follower)))
}

/// Following twice and following a user that does not exist are both
/// field-level 400s.
fn map_create_constraints(followed: Id<UserMarker>, err: DbError) -> ServerError {
    match err {
        DbError::UniqueViolation { ref constraint }
            if constraint == constraint::FOLLOWER_PAIR_UNIQUE =>
        {
            ValidationErrors::single("detail", DuplicateError.to_string()).into()
        }
        DbError::ForeignKeyViolation { ref constraint }
            if constraint == constraint::FOLLOWER_FOLLOWED_REFERENCE =>
        {
            ValidationErrors::single("followed", DanglingReferenceError(followed.get()).to_string())
                .into()
        }
        err => ServerError::from(err),
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/followers/{id}", rejection(ServerError))]
struct FollowerPath {
    id: Id<FollowerMarker>,
}

async fn get_follower(
    FollowerPath { id }: FollowerPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Follower>> {
    let follower = db
        .fetch_follower(id)
        .await?
        .ok_or(ServerError::FollowerByIdNotFound(id))?;

    Ok(Json(follower))
}

async fn delete_follower(
    FollowerPath { id }: FollowerPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let follower = db
        .fetch_follower(id)
        .await?
        .ok_or(ServerError::FollowerByIdNotFound(id))?;
    ensure_owner(user.user_id(), &follower)?;

    db.delete_follower(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, routes::followers::map_create_constraints};
    use axum::http::StatusCode;
    use pinnwand_common::model::Id;
    use pinnwand_db::client::{DbError, constraint};

    #[test]
    fn duplicate_edge_becomes_a_validation_reply() {
        let err = map_create_constraints(
            Id::new(7),
            DbError::UniqueViolation {
                constraint: constraint::FOLLOWER_PAIR_UNIQUE.to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(errors.messages("detail"), ["possible duplicate"]);
    }

    #[test]
    fn dangling_followed_reference_reports_the_field() {
        let err = map_create_constraints(
            Id::new(7),
            DbError::ForeignKeyViolation {
                constraint: constraint::FOLLOWER_FOLLOWED_REFERENCE.to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            errors.messages("followed"),
            ["Invalid pk \"7\" - object does not exist."]
        );
    }

    #[test]
    fn unrelated_constraints_stay_server_faults() {
        let err = map_create_constraints(
            Id::new(7),
            DbError::ForeignKeyViolation {
                constraint: "followers_owner_id_fkey".to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
