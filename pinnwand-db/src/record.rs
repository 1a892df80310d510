use pinnwand_common::model::{
    Id, ModelValidationError,
    auth::Authentication,
    comment::Comment,
    follower::Follower,
    like::Like,
    post::{Post, PostTitle},
    profile::Profile,
    user::{CurrentUser, UserMarker, Username},
};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct CurrentUserRecord {
    pub user_id: i64,
    pub username: String,
    pub profile_id: i64,
    pub profile_image: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_id: i64,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub token_hash: Vec<u8>,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub owner_id: i64,
    pub username: String,
    pub profile_id: i64,
    pub profile_image: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub title: String,
    pub content: String,
    pub image: String,
    pub image_filter: String,
    pub like_id: Option<i64>,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct ProfileRecord {
    pub profile_id: i64,
    pub owner_id: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub name: String,
    pub content: String,
    pub image: String,
    pub following_id: Option<i64>,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub owner_id: i64,
    pub username: String,
    pub profile_id: i64,
    pub profile_image: String,
    pub post_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub content: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct LikeRecord {
    pub like_id: i64,
    pub owner_id: i64,
    pub username: String,
    pub post_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct FollowerRecord {
    pub follower_id: i64,
    pub owner_id: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub followed_id: i64,
    pub followed_name: String,
}

fn is_viewer(viewer: Option<Id<UserMarker>>, owner_id: Id<UserMarker>) -> bool {
    viewer == Some(owner_id)
}

impl TryFrom<CurrentUserRecord> for CurrentUser {
    type Error = ModelValidationError;

    fn try_from(value: CurrentUserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            username: Username::new(value.username)?,
            profile_id: value.profile_id.into(),
            profile_image: value.profile_image,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.try_into()?,
            created_at: value.created_at,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}

impl PostRecord {
    /// Builds the served view; `is_owner` is relative to the viewer, which
    /// may be anonymous.
    pub(crate) fn into_post(
        self,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Post, ModelValidationError> {
        let owner_id = self.owner_id.into();

        Ok(Post {
            id: self.post_id.into(),
            owner_id,
            owner_username: Username::new(self.username)?,
            is_owner: is_viewer(viewer, owner_id),
            profile_id: self.profile_id.into(),
            profile_image: self.profile_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
            title: PostTitle::new(self.title)?,
            content: self.content,
            image: self.image,
            image_filter: self.image_filter,
            like_id: self.like_id.map(Into::into),
            likes_count: self.likes_count,
            comments_count: self.comments_count,
        })
    }
}

impl ProfileRecord {
    pub(crate) fn into_profile(
        self,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Profile, ModelValidationError> {
        let owner_id = self.owner_id.into();

        Ok(Profile {
            id: self.profile_id.into(),
            owner_id,
            owner_username: Username::new(self.username)?,
            is_owner: is_viewer(viewer, owner_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
            name: self.name,
            content: self.content,
            image: self.image,
            following_id: self.following_id.map(Into::into),
            posts_count: self.posts_count,
            followers_count: self.followers_count,
            following_count: self.following_count,
        })
    }
}

impl CommentRecord {
    pub(crate) fn into_comment(
        self,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Comment, ModelValidationError> {
        let owner_id = self.owner_id.into();

        Ok(Comment {
            id: self.comment_id.into(),
            owner_id,
            owner_username: Username::new(self.username)?,
            is_owner: is_viewer(viewer, owner_id),
            profile_id: self.profile_id.into(),
            profile_image: self.profile_image,
            post: self.post_id.into(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            content: self.content,
        })
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = ModelValidationError;

    fn try_from(value: LikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.like_id.into(),
            owner_id: value.owner_id.into(),
            owner_username: Username::new(value.username)?,
            post: value.post_id.into(),
            created_at: value.created_at,
        })
    }
}

impl TryFrom<FollowerRecord> for Follower {
    type Error = ModelValidationError;

    fn try_from(value: FollowerRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.follower_id.into(),
            owner_id: value.owner_id.into(),
            owner_username: Username::new(value.username)?,
            created_at: value.created_at,
            followed: value.followed_id.into(),
            followed_name: Username::new(value.followed_name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::PostRecord;
    use pinnwand_common::model::Id;
    use time::OffsetDateTime;

    fn record() -> PostRecord {
        PostRecord {
            post_id: 1,
            owner_id: 2,
            username: "adam".to_owned(),
            profile_id: 3,
            profile_image: "images/default_profile.png".to_owned(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            title: "a title".to_owned(),
            content: String::new(),
            image: "images/default_post.png".to_owned(),
            image_filter: "normal".to_owned(),
            like_id: None,
            likes_count: 0,
            comments_count: 0,
        }
    }

    #[test]
    fn is_owner_tracks_viewer() {
        assert!(record().into_post(Some(Id::new(2))).unwrap().is_owner);
        assert!(!record().into_post(Some(Id::new(9))).unwrap().is_owner);
        assert!(!record().into_post(None).unwrap().is_owner);
    }

    #[test]
    fn stored_rows_are_revalidated() {
        let mut record = record();
        record.title = String::new();

        assert!(record.into_post(None).is_err());
    }
}
