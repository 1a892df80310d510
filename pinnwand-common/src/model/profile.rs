use crate::model::{
    HasOwner, Id, InvalidOrderingError, ValidationErrors,
    follower::FollowerMarker,
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

pub const PROFILE_NAME_MAX_LEN: usize = 225;
pub const DEFAULT_PROFILE_IMAGE: &str = "images/default_profile.png";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ProfileMarker;

/// A profile as served to clients. Profiles exist 1:1 with users; the view
/// adds the follow aggregates and the requester-relative
/// `is_owner`/`following_id` projections.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Profile {
    pub id: Id<ProfileMarker>,
    #[serde(skip)]
    pub owner_id: Id<UserMarker>,
    #[serde(rename = "owner")]
    pub owner_username: Username,
    pub is_owner: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub name: String,
    pub content: String,
    pub image: String,
    pub following_id: Option<Id<FollowerMarker>>,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl HasOwner for Profile {
    fn owner_id(&self) -> Id<UserMarker> {
        self.owner_id
    }
}

/// Writable fields of a profile. Both may be blank, so only the name length
/// is checked.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Ensure this field has no more than {PROFILE_NAME_MAX_LEN} characters.")]
pub struct ProfileNameTooLongError;

impl ProfileData {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.chars().count() > PROFILE_NAME_MAX_LEN {
            errors.push("name", ProfileNameTooLongError.to_string());
        }

        errors.into_result()
    }
}

/// Sort keys accepted by the profile list. The `following_at`/`followed_at`
/// keys sort by the most recent follow edge the profile's owner created or
/// received.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ProfileOrderField {
    PostsCount,
    FollowersCount,
    FollowingCount,
    FollowingAt,
    FollowedAt,
    CreatedAt,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ProfileOrdering {
    pub field: ProfileOrderField,
    pub descending: bool,
}

impl Default for ProfileOrdering {
    fn default() -> Self {
        Self {
            field: ProfileOrderField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for ProfileOrdering {
    type Err = InvalidOrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field) = split_ordering(s);
        let field = match field {
            "posts_count" => ProfileOrderField::PostsCount,
            "followers_count" => ProfileOrderField::FollowersCount,
            "following_count" => ProfileOrderField::FollowingCount,
            "following_at" => ProfileOrderField::FollowingAt,
            "followed_at" => ProfileOrderField::FollowedAt,
            "created_at" => ProfileOrderField::CreatedAt,
            _ => return Err(InvalidOrderingError(s.to_owned())),
        };

        Ok(Self { field, descending })
    }
}

impl<'de> Deserialize<'de> for ProfileOrdering {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ProfileOrdering::from_str(&inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"ProfileOrdering"))
    }
}

/// Query parameters of `GET /profiles`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct ProfileListQuery {
    pub ordering: Option<ProfileOrdering>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use crate::model::profile::{
        PROFILE_NAME_MAX_LEN, ProfileData, ProfileOrderField, ProfileOrdering,
    };
    use std::str::FromStr;

    #[test]
    fn blank_profile_data_is_fine() {
        assert!(ProfileData::default().validate().is_ok());
    }

    #[test]
    fn overlong_name_reports_field() {
        let data = ProfileData {
            name: "x".repeat(PROFILE_NAME_MAX_LEN + 1),
            content: String::new(),
        };

        let errors = data.validate().unwrap_err();
        assert_eq!(
            errors.messages("name"),
            ["Ensure this field has no more than 225 characters."]
        );
    }

    #[test]
    fn ordering_parses_follow_keys() {
        assert_eq!(
            ProfileOrdering::from_str("-followers_count").unwrap(),
            ProfileOrdering {
                field: ProfileOrderField::FollowersCount,
                descending: true,
            }
        );
        assert_eq!(
            ProfileOrdering::from_str("following_at").unwrap(),
            ProfileOrdering {
                field: ProfileOrderField::FollowingAt,
                descending: false,
            }
        );
        assert!(ProfileOrdering::from_str("name").is_err());
    }
}
