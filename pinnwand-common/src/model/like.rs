use crate::model::{
    HasOwner, Id, RequiredFieldError, ValidationErrors,
    post::PostMarker,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeMarker;

/// A like edge between a user and a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Like {
    pub id: Id<LikeMarker>,
    #[serde(skip)]
    pub owner_id: Id<UserMarker>,
    #[serde(rename = "owner")]
    pub owner_username: Username,
    pub post: Id<PostMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl HasOwner for Like {
    fn owner_id(&self) -> Id<UserMarker> {
        self.owner_id
    }
}

/// Payload of `POST /likes`. Likes carry no data beyond their target.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CreateLike {
    #[serde(default)]
    pub post: Option<Id<PostMarker>>,
}

impl CreateLike {
    pub fn validate(&self) -> Result<Id<PostMarker>, ValidationErrors> {
        self.post.ok_or_else(|| {
            ValidationErrors::single("post", RequiredFieldError.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, like::CreateLike};

    #[test]
    fn create_requires_post() {
        let errors = CreateLike::default().validate().unwrap_err();
        assert_eq!(errors.messages("post"), ["This field is required."]);

        let create = CreateLike { post: Some(Id::new(7)) };
        assert_eq!(create.validate(), Ok(Id::new(7)));
    }
}
