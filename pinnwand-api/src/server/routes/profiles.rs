use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    media::MediaStore,
    routes::read_image_field,
};
use axum::extract::{Multipart, State, multipart::MultipartRejection};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    Id, ensure_owner,
    profile::{Profile, ProfileData, ProfileListQuery, ProfileMarker},
};
use pinnwand_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_profiles)
        .typed_get(get_profile)
        .typed_put(update_profile)
        .typed_put(update_profile_image)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles", rejection(ServerError))]
struct ProfilesPath();

async fn list_profiles(
    ProfilesPath(): ProfilesPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
    Query(list_query): Query<ProfileListQuery>,
) -> Result<Json<Vec<Profile>>> {
    let profiles = db
        .list_profiles(viewer.map(AuthenticatedUser::user_id), &list_query)
        .await?;

    Ok(Json(profiles))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}", rejection(ServerError))]
struct ProfilePath {
    id: Id<ProfileMarker>,
}

async fn get_profile(
    ProfilePath { id }: ProfilePath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Profile>> {
    let profile = db
        .fetch_profile(viewer.map(AuthenticatedUser::user_id), id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;

    Ok(Json(profile))
}

async fn update_profile(
    ProfilePath { id }: ProfilePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(data): Json<ProfileData>,
) -> Result<Json<Profile>> {
    let profile = db
        .fetch_profile(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    ensure_owner(user.user_id(), &profile)?;
    data.validate()?;

    let profile = db.update_profile(user.user_id(), id, &data).await?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}/image", rejection(ServerError))]
struct ProfileImagePath {
    id: Id<ProfileMarker>,
}

async fn update_profile_image(
    ProfileImagePath { id }: ProfileImagePath,
    State(db): State<Arc<DbClient>>,
    State(media): State<Arc<MediaStore>>,
    user: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Profile>> {
    let profile = db
        .fetch_profile(Some(user.user_id()), id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    ensure_owner(user.user_id(), &profile)?;

    let upload = read_image_field(multipart).await?;
    let image = media.store_image(&upload).await?;

    let profile = db.update_profile_image(user.user_id(), id, &image).await?;

    Ok(Json(profile))
}
