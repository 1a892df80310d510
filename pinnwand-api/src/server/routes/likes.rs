use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    DanglingReferenceError, DuplicateError, Id, PageQuery, ValidationErrors, ensure_owner,
    like::{CreateLike, Like, LikeMarker},
    post::PostMarker,
};
use pinnwand_db::client::{DbClient, DbError, constraint};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_likes)
        .typed_post(create_like)
        .typed_get(get_like)
        .typed_delete(delete_like)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/likes", rejection(ServerError))]
struct LikesPath();

async fn list_likes(
    LikesPath(): LikesPath,
    State(db): State<Arc<DbClient>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Like>>> {
    let likes = db.list_likes(&page).await?;

    Ok(Json(likes))
}

async fn create_like(
    LikesPath(): LikesPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(create): Json<CreateLike>,
) -> Result<(StatusCode, Json<Like>)> {
    let post = create.validate()?;

    let like = db
        .create_like(user.user_id(), post)
        .await
        .map_err(|err| map_create_constraints(post, err))?;

    Ok((StatusCode::CREATED, Json(like)))
}

/// Translates constraint conflicts from the like insert into the validation
/// replies the create endpoint serves: liking twice and liking a missing
/// post are both 400s, not server faults.
fn map_create_constraints(post: Id<PostMarker>, err: DbError) -> ServerError {
    match err {
        DbError::UniqueViolation { ref constraint }
            if constraint == constraint::LIKE_PAIR_UNIQUE =>
        {
            ValidationErrors::single("detail", DuplicateError.to_string()).into()
        }
        DbError::ForeignKeyViolation { ref constraint }
            if constraint == constraint::LIKE_POST_REFERENCE =>
        {
            ValidationErrors::single("post", DanglingReferenceError(post.get()).to_string()).into()
        }
        err => ServerError::from(err),
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/likes/{id}", rejection(ServerError))]
struct LikePath {
    id: Id<LikeMarker>,
}

async fn get_like(
    LikePath { id }: LikePath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Like>> {
    let like = db
        .fetch_like(id)
        .await?
        .ok_or(ServerError::LikeByIdNotFound(id))?;

    Ok(Json(like))
}

async fn delete_like(
    LikePath { id }: LikePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let like = db
        .fetch_like(id)
        .await?
        .ok_or(ServerError::LikeByIdNotFound(id))?;
    ensure_owner(user.user_id(), &like)?;

    db.delete_like(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, routes::likes::map_create_constraints};
    use axum::http::StatusCode;
    use pinnwand_common::model::Id;
    use pinnwand_db::client::{DbError, constraint};

    #[test]
    fn duplicate_pair_becomes_a_validation_reply() {
        let err = map_create_constraints(
            Id::new(3),
            DbError::UniqueViolation {
                constraint: constraint::LIKE_PAIR_UNIQUE.to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(errors.messages("detail"), ["possible duplicate"]);
    }

    #[test]
    fn dangling_post_reference_reports_the_field() {
        let err = map_create_constraints(
            Id::new(3),
            DbError::ForeignKeyViolation {
                constraint: constraint::LIKE_POST_REFERENCE.to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            errors.messages("post"),
            ["Invalid pk \"3\" - object does not exist."]
        );
    }

    #[test]
    fn unrelated_constraints_stay_server_faults() {
        let err = map_create_constraints(
            Id::new(3),
            DbError::UniqueViolation {
                constraint: "likes_pkey".to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
