use crate::server::ServerError;
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use pinnwand_common::model::{ValidationErrors, image::validate_image};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory below the media root that uploads land in. The default images
/// referenced by fresh profiles and posts live there as well.
pub const IMAGE_DIR: &str = "images";

const STORED_NAME_BYTES: usize = 16;

/// Filesystem store for uploaded images. Stored paths are relative to the
/// root and served under `/media`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates an upload and writes it under a random name, returning the
    /// relative path to persist on the owning entity.
    pub async fn store_image(&self, bytes: &[u8]) -> Result<String, ServerError> {
        let info = validate_image(bytes)
            .map_err(|err| ValidationErrors::single("image", err.to_string()))?;

        let name: [u8; STORED_NAME_BYTES] = rand::random();
        let file_name = format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(name),
            info.extension()
        );

        let image_dir = self.root.join(IMAGE_DIR);
        fs::create_dir_all(&image_dir).await?;
        fs::write(image_dir.join(&file_name), bytes).await?;

        Ok(format!("{IMAGE_DIR}/{file_name}"))
    }
}
