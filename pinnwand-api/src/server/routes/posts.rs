use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    media::MediaStore,
    routes::read_image_field,
};
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    Id, ensure_owner,
    post::{Post, PostData, PostListQuery, PostMarker},
};
use pinnwand_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
        .typed_put(update_post_image)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

async fn list_posts(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
    Query(list_query): Query<PostListQuery>,
) -> Result<Json<Vec<Post>>> {
    let posts = db
        .list_posts(viewer.map(AuthenticatedUser::user_id), &list_query)
        .await?;

    Ok(Json(posts))
}

async fn create_post(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(data): Json<PostData>,
) -> Result<(StatusCode, Json<Post>)> {
    data.validate()?;

    let post = db.create_post(user.user_id(), &data).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(viewer.map(AuthenticatedUser::user_id), id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(data): Json<PostData>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    ensure_owner(user.user_id(), &post)?;
    data.validate()?;

    let post = db.update_post(user.user_id(), id, &data).await?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let post = db
        .fetch_post(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    ensure_owner(user.user_id(), &post)?;

    db.delete_post(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/image", rejection(ServerError))]
struct PostImagePath {
    id: Id<PostMarker>,
}

async fn update_post_image(
    PostImagePath { id }: PostImagePath,
    State(db): State<Arc<DbClient>>,
    State(media): State<Arc<MediaStore>>,
    user: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    ensure_owner(user.user_id(), &post)?;

    let upload = read_image_field(multipart).await?;
    let image = media.store_image(&upload).await?;

    let post = db.update_post_image(user.user_id(), id, &image).await?;

    Ok(Json(post))
}
