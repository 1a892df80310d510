use crate::model::{
    HasOwner, Id, InvalidOrderingError, ValidationErrors,
    like::LikeMarker,
    profile::ProfileMarker,
    split_ordering,
    user::{UserMarker, Username},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

pub const POST_TITLE_MAX_LEN: usize = 255;
pub const DEFAULT_POST_IMAGE: &str = "images/default_post.png";
pub const DEFAULT_IMAGE_FILTER: &str = "normal";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A post as served to clients, including the query-time aggregates and the
/// requester-relative `is_owner`/`like_id` projections.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    #[serde(skip)]
    pub owner_id: Id<UserMarker>,
    #[serde(rename = "owner")]
    pub owner_username: Username,
    pub is_owner: bool,
    pub profile_id: Id<ProfileMarker>,
    pub profile_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub title: PostTitle,
    pub content: String,
    pub image: String,
    pub image_filter: String,
    pub like_id: Option<Id<LikeMarker>>,
    pub likes_count: i64,
    pub comments_count: i64,
}

impl HasOwner for Post {
    fn owner_id(&self) -> Id<UserMarker> {
        self.owner_id
    }
}

/// Writable fields of a post, shared by create and full update. Fields
/// default so that a missing field reports through the per-field messages
/// instead of a deserialization failure.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_image_filter")]
    pub image_filter: String,
}

fn default_image_filter() -> String {
    DEFAULT_IMAGE_FILTER.to_owned()
}

impl PostData {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = PostTitle::new(self.title.clone()) {
            errors.push("title", err.to_string());
        }

        errors.into_result()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPostTitleError {
    #[error("This field may not be blank.")]
    Blank,
    #[error("Ensure this field has no more than {POST_TITLE_MAX_LEN} characters.")]
    TooLong,
}

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTitleError> {
        if title.trim().is_empty() {
            return Err(InvalidPostTitleError::Blank);
        }
        if title.chars().count() > POST_TITLE_MAX_LEN {
            return Err(InvalidPostTitleError::TooLong);
        }

        Ok(PostTitle(title))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostTitle::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"PostTitle"))
    }
}

/// Sort keys accepted by the post list.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostOrderField {
    CommentsCount,
    LikesCount,
    LikesCreatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostOrdering {
    pub field: PostOrderField,
    pub descending: bool,
}

impl Default for PostOrdering {
    fn default() -> Self {
        Self {
            field: PostOrderField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for PostOrdering {
    type Err = InvalidOrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field) = split_ordering(s);
        let field = match field {
            "comments_count" => PostOrderField::CommentsCount,
            "likes_count" => PostOrderField::LikesCount,
            "likes_created_at" => PostOrderField::LikesCreatedAt,
            "created_at" => PostOrderField::CreatedAt,
            "updated_at" => PostOrderField::UpdatedAt,
            _ => return Err(InvalidOrderingError(s.to_owned())),
        };

        Ok(Self { field, descending })
    }
}

impl<'de> Deserialize<'de> for PostOrdering {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostOrdering::from_str(&inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"PostOrdering"))
    }
}

/// Query parameters of `GET /posts`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostListQuery {
    pub search: Option<String>,
    pub ordering: Option<PostOrdering>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use crate::model::post::{
        InvalidPostTitleError, PostData, PostOrderField, PostOrdering, PostTitle,
    };
    use std::str::FromStr;

    #[test]
    fn title_rules() {
        assert!(PostTitle::new("a title".to_owned()).is_ok());
        assert_eq!(
            PostTitle::new("   ".to_owned()),
            Err(InvalidPostTitleError::Blank)
        );
        assert_eq!(
            PostTitle::new("x".repeat(256)),
            Err(InvalidPostTitleError::TooLong)
        );
    }

    #[test]
    fn post_data_reports_title_field() {
        let data = PostData {
            title: String::new(),
            content: "some content".to_owned(),
            image_filter: "normal".to_owned(),
        };

        let errors = data.validate().unwrap_err();
        assert_eq!(errors.messages("title"), ["This field may not be blank."]);
    }

    #[test]
    fn ordering_parses_fields_and_direction() {
        assert_eq!(
            PostOrdering::from_str("likes_count").unwrap(),
            PostOrdering {
                field: PostOrderField::LikesCount,
                descending: false,
            }
        );
        assert_eq!(
            PostOrdering::from_str("-comments_count").unwrap(),
            PostOrdering {
                field: PostOrderField::CommentsCount,
                descending: true,
            }
        );
        assert!(PostOrdering::from_str("owner__password").is_err());
        assert!(PostOrdering::from_str("").is_err());
    }

    #[test]
    fn default_ordering_is_newest_first() {
        let ordering = PostOrdering::default();
        assert_eq!(ordering.field, PostOrderField::CreatedAt);
        assert!(ordering.descending);
    }
}
