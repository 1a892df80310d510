use crate::model::{
    HasOwner, Id, RequiredFieldError, ValidationErrors,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowerMarker;

/// A follow edge. `owner` is the user doing the following, `followed` the
/// user being followed.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Follower {
    pub id: Id<FollowerMarker>,
    #[serde(skip)]
    pub owner_id: Id<UserMarker>,
    #[serde(rename = "owner")]
    pub owner_username: Username,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub followed: Id<UserMarker>,
    pub followed_name: Username,
}

impl HasOwner for Follower {
    fn owner_id(&self) -> Id<UserMarker> {
        self.owner_id
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("You cannot follow yourself.")]
pub struct SelfFollowError;

/// Payload of `POST /followers`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CreateFollower {
    #[serde(default)]
    pub followed: Option<Id<UserMarker>>,
}

impl CreateFollower {
    /// Checks the payload against the acting user and extracts the target.
    pub fn validate(&self, viewer: Id<UserMarker>) -> Result<Id<UserMarker>, ValidationErrors> {
        let Some(followed) = self.followed else {
            return Err(ValidationErrors::single(
                "followed",
                RequiredFieldError.to_string(),
            ));
        };
        if followed == viewer {
            return Err(ValidationErrors::single(
                "followed",
                SelfFollowError.to_string(),
            ));
        }

        Ok(followed)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, follower::CreateFollower};

    #[test]
    fn create_requires_target() {
        let errors = CreateFollower::default().validate(Id::new(1)).unwrap_err();
        assert_eq!(errors.messages("followed"), ["This field is required."]);
    }

    #[test]
    fn self_follow_is_rejected() {
        let create = CreateFollower {
            followed: Some(Id::new(1)),
        };

        let errors = create.validate(Id::new(1)).unwrap_err();
        assert_eq!(errors.messages("followed"), ["You cannot follow yourself."]);
        assert_eq!(create.validate(Id::new(2)), Ok(Id::new(1)));
    }
}
