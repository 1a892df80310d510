use crate::server::{Result, ServerRouter};
use axum::{
    Router,
    body::Bytes,
    extract::{Multipart, multipart::MultipartRejection},
};
use pinnwand_common::model::{ValidationErrors, image::NoFileError};

mod comments;
mod followers;
mod likes;
mod posts;
mod profiles;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(comments::routes())
        .merge(followers::routes())
        .merge(likes::routes())
        .merge(posts::routes())
        .merge(profiles::routes())
        .merge(users::routes())
}

/// Pulls the `image` part out of an upload form. Anything else in the form
/// is ignored.
pub(crate) async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            return Ok(field.bytes().await?);
        }
    }

    Err(ValidationErrors::single("image", NoFileError.to_string()).into())
}
