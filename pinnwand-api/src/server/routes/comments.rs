use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    DanglingReferenceError, Id, ValidationErrors, ensure_owner,
    comment::{Comment, CommentData, CommentListQuery, CommentMarker, CreateComment},
    post::PostMarker,
};
use pinnwand_db::client::{DbClient, DbError, constraint};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(get_comment)
        .typed_put(update_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments", rejection(ServerError))]
struct CommentsPath();

async fn list_comments(
    CommentsPath(): CommentsPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
    Query(list_query): Query<CommentListQuery>,
) -> Result<Json<Vec<Comment>>> {
    let comments = db
        .list_comments(viewer.map(AuthenticatedUser::user_id), &list_query)
        .await?;

    Ok(Json(comments))
}

async fn create_comment(
    CommentsPath(): CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(create): Json<CreateComment>,
) -> Result<(StatusCode, Json<Comment>)> {
    let post = create.validate()?;

    let comment = db
        .create_comment(user.user_id(), post, create.content.trim())
        .await
        .map_err(|err| map_create_constraints(post, err))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Commenting on a post that does not exist is a field-level 400, mirroring
/// how the serializer would reject an unknown primary key.
fn map_create_constraints(post: Id<PostMarker>, err: DbError) -> ServerError {
    match err {
        DbError::ForeignKeyViolation { ref constraint }
            if constraint == constraint::COMMENT_POST_REFERENCE =>
        {
            ValidationErrors::single("post", DanglingReferenceError(post.get()).to_string()).into()
        }
        err => ServerError::from(err),
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}", rejection(ServerError))]
struct CommentPath {
    id: Id<CommentMarker>,
}

async fn get_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Comment>> {
    let comment = db
        .fetch_comment(viewer.map(AuthenticatedUser::user_id), id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;

    Ok(Json(comment))
}

async fn update_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(data): Json<CommentData>,
) -> Result<Json<Comment>> {
    let comment = db
        .fetch_comment(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    ensure_owner(user.user_id(), &comment)?;
    data.validate()?;

    let comment = db
        .update_comment(user.user_id(), id, data.content.trim())
        .await?;

    Ok(Json(comment))
}

async fn delete_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let comment = db
        .fetch_comment(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    ensure_owner(user.user_id(), &comment)?;

    db.delete_comment(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, routes::comments::map_create_constraints};
    use axum::http::StatusCode;
    use pinnwand_common::model::Id;
    use pinnwand_db::client::{DbError, constraint};

    #[test]
    fn dangling_post_reference_reports_the_field() {
        let err = map_create_constraints(
            Id::new(42),
            DbError::ForeignKeyViolation {
                constraint: constraint::COMMENT_POST_REFERENCE.to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ServerError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            errors.messages("post"),
            ["Invalid pk \"42\" - object does not exist."]
        );
    }

    #[test]
    fn unrelated_constraints_stay_server_faults() {
        let err = map_create_constraints(
            Id::new(42),
            DbError::ForeignKeyViolation {
                constraint: "comments_owner_id_fkey".to_owned(),
            },
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
