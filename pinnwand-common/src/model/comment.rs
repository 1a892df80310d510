use crate::model::{
    HasOwner, Id, RequiredFieldError, ValidationErrors,
    post::PostMarker,
    profile::ProfileMarker,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// A comment as served to clients.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    #[serde(skip)]
    pub owner_id: Id<UserMarker>,
    #[serde(rename = "owner")]
    pub owner_username: Username,
    pub is_owner: bool,
    pub profile_id: Id<ProfileMarker>,
    pub profile_image: String,
    pub post: Id<PostMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub content: String,
}

impl HasOwner for Comment {
    fn owner_id(&self) -> Id<UserMarker> {
        self.owner_id
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("This field may not be blank.")]
pub struct BlankCommentError;

/// Payload of `POST /comments`. The post reference is only writable here;
/// updates go through [`CommentData`].
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CreateComment {
    #[serde(default)]
    pub post: Option<Id<PostMarker>>,
    #[serde(default)]
    pub content: String,
}

impl CreateComment {
    /// Checks the payload and extracts the target post id.
    pub fn validate(&self) -> Result<Id<PostMarker>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.content.trim().is_empty() {
            errors.push("content", BlankCommentError.to_string());
        }

        match self.post {
            Some(post) => errors.into_result().map(|()| post),
            None => {
                errors.push("post", RequiredFieldError.to_string());
                Err(errors)
            }
        }
    }
}

/// Writable fields of an existing comment.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub content: String,
}

impl CommentData {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.content.trim().is_empty() {
            Err(ValidationErrors::single(
                "content",
                BlankCommentError.to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Query parameters of `GET /comments`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CommentListQuery {
    pub post: Option<Id<PostMarker>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        comment::{CommentData, CreateComment},
    };

    #[test]
    fn create_requires_post_and_content() {
        let errors = CreateComment::default().validate().unwrap_err();
        assert_eq!(errors.messages("post"), ["This field is required."]);
        assert_eq!(errors.messages("content"), ["This field may not be blank."]);

        let create = CreateComment {
            post: Some(Id::new(3)),
            content: "nice one".to_owned(),
        };
        assert_eq!(create.validate(), Ok(Id::new(3)));
    }

    #[test]
    fn update_rejects_blank_content() {
        let data = CommentData {
            content: "  \t ".to_owned(),
        };
        let errors = data.validate().unwrap_err();
        assert_eq!(errors.messages("content"), ["This field may not be blank."]);
    }
}
