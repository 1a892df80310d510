use crate::{
    query::{contains_pattern, page_window, post_order_clause, profile_order_clause},
    record::{
        AuthenticationRecord, CommentRecord, CredentialsRecord, CurrentUserRecord,
        FollowerRecord, LikeRecord, PostRecord, ProfileRecord,
    },
};
use pinnwand_common::model::{
    Id, ModelValidationError, PageQuery,
    auth::{AuthTokenHash, Authentication},
    comment::{Comment, CommentListQuery, CommentMarker},
    follower::{Follower, FollowerMarker},
    like::{Like, LikeMarker},
    post::{DEFAULT_POST_IMAGE, Post, PostData, PostListQuery, PostMarker},
    profile::{DEFAULT_PROFILE_IMAGE, Profile, ProfileData, ProfileListQuery, ProfileMarker},
    user::{CurrentUser, UserMarker, Username},
};
use sqlx::{PgPool, error::ErrorKind, query_as, query_scalar};
use thiserror::Error;

/// Constraint names surfaced through [`DbError`]; the API layer maps these
/// onto field-level validation replies.
pub mod constraint {
    pub const USERNAME_UNIQUE: &str = "users_username_key";
    pub const LIKE_PAIR_UNIQUE: &str = "likes_owner_id_post_id_key";
    pub const FOLLOWER_PAIR_UNIQUE: &str = "followers_owner_id_followed_id_key";
    pub const COMMENT_POST_REFERENCE: &str = "comments_post_id_fkey";
    pub const LIKE_POST_REFERENCE: &str = "likes_post_id_fkey";
    pub const FOLLOWER_FOLLOWED_REFERENCE: &str = "followers_followed_id_fkey";
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },
    #[error("Error running migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// A row written by this statement was gone on re-fetch, i.e. it was
    /// deleted concurrently. Callers treat this as the row not existing.
    #[error("Row was deleted concurrently")]
    RowVanished,
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && let Some(constraint) = db_err.constraint()
        {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    return DbError::UniqueViolation {
                        constraint: constraint.to_owned(),
                    };
                }
                ErrorKind::ForeignKeyViolation => {
                    return DbError::ForeignKeyViolation {
                        constraint: constraint.to_owned(),
                    };
                }
                _ => {}
            }
        }

        DbError::Sqlx(err)
    }
}

/// Login lookup result: the account id and its stored password hash.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct StoredCredentials {
    pub user: Id<UserMarker>,
    pub password_hash: String,
}

impl From<CredentialsRecord> for StoredCredentials {
    fn from(value: CredentialsRecord) -> Self {
        Self {
            user: value.user_id.into(),
            password_hash: value.password_hash,
        }
    }
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await.map_err(DbError::from)?;
        Ok(Self { pool })
    }

    /// Connects without touching the database; the first query establishes
    /// the connection.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = PgPool::connect_lazy(url).map_err(DbError::from)?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Creates the account and its profile in one transaction; either both
    /// exist afterwards or neither does.
    pub async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<CurrentUser> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let user_id: i64 = query_scalar(
            "
            INSERT INTO users.users (username, password_hash)
            VALUES ($1, $2)
            RETURNING user_id
            ",
        )
        .bind(username.get())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile_id: i64 = query_scalar(
            "
            INSERT INTO users.profiles (owner_id, name, content, image)
            VALUES ($1, '', '', $2)
            RETURNING profile_id
            ",
        )
        .bind(user_id)
        .bind(DEFAULT_PROFILE_IMAGE)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(CurrentUser {
            id: user_id.into(),
            username: username.clone(),
            profile_id: profile_id.into(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_owned(),
        })
    }

    pub async fn fetch_credentials(&self, username: &str) -> Result<Option<StoredCredentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT
                users.user_id,
                users.password_hash
            FROM
                users.users
            WHERE
                users.username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(StoredCredentials::from))
    }

    pub async fn fetch_current_user(&self, user: Id<UserMarker>) -> Result<Option<CurrentUser>> {
        let record = query_as::<_, CurrentUserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                profiles.profile_id,
                profiles.image AS profile_image
            FROM
                users.users
                JOIN users.profiles ON profiles.owner_id = users.user_id
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user.get())
        .fetch_optional(&self.pool)
        .await?;

        let current_user = record.map(CurrentUser::try_from).transpose()?;
        Ok(current_user)
    }

    pub async fn create_auth(&self, authentication: &Authentication) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO users.auth_tokens (token_hash, user_id, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(authentication.token_hash.0.as_slice())
        .bind(authentication.user.get())
        .bind(authentication.created_at)
        .bind(
            authentication
                .expires_after
                .map(|duration| duration.get().whole_seconds()),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                auth_tokens.token_hash,
                auth_tokens.user_id,
                auth_tokens.created_at,
                auth_tokens.expires_after_seconds
            FROM
                users.auth_tokens
            WHERE
                auth_tokens.token_hash = $1
            ",
        )
        .bind(token_hash.0.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    pub async fn delete_auth(&self, token_hash: &AuthTokenHash) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM users.auth_tokens
            WHERE auth_tokens.token_hash = $1
            ",
        )
        .bind(token_hash.0.as_slice())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_posts(
        &self,
        viewer: Option<Id<UserMarker>>,
        list_query: &PostListQuery,
    ) -> Result<Vec<Post>> {
        let (limit, offset) = page_window(list_query.limit, list_query.offset);
        let order_clause = post_order_clause(list_query.ordering.unwrap_or_default());
        let pattern = list_query.search.as_deref().map(contains_pattern);

        let records = query_as::<_, PostRecord>(&format!(
            "
            SELECT
                posts.post_id,
                posts.owner_id,
                users.username,
                profiles.profile_id,
                profiles.image AS profile_image,
                posts.created_at,
                posts.updated_at,
                posts.title,
                posts.content,
                posts.image,
                posts.image_filter,
                (
                    SELECT viewer_like.like_id
                    FROM content.likes AS viewer_like
                    WHERE viewer_like.post_id = posts.post_id
                        AND viewer_like.owner_id = $1
                ) AS like_id,
                COUNT(DISTINCT likes.like_id) AS likes_count,
                COUNT(DISTINCT comments.comment_id) AS comments_count
            FROM
                content.posts
                JOIN users.users ON users.user_id = posts.owner_id
                JOIN users.profiles ON profiles.owner_id = posts.owner_id
                LEFT JOIN content.likes ON likes.post_id = posts.post_id
                LEFT JOIN content.comments ON comments.post_id = posts.post_id
            WHERE
                $2::TEXT IS NULL
                OR users.username ILIKE $2
                OR posts.title ILIKE $2
            GROUP BY
                posts.post_id, users.user_id, profiles.profile_id
            {order_clause}
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(viewer.map(Id::get))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(|record| record.into_post(viewer))
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    pub async fn fetch_post(
        &self,
        viewer: Option<Id<UserMarker>>,
        post_id: Id<PostMarker>,
    ) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT
                posts.post_id,
                posts.owner_id,
                users.username,
                profiles.profile_id,
                profiles.image AS profile_image,
                posts.created_at,
                posts.updated_at,
                posts.title,
                posts.content,
                posts.image,
                posts.image_filter,
                (
                    SELECT viewer_like.like_id
                    FROM content.likes AS viewer_like
                    WHERE viewer_like.post_id = posts.post_id
                        AND viewer_like.owner_id = $1
                ) AS like_id,
                COUNT(DISTINCT likes.like_id) AS likes_count,
                COUNT(DISTINCT comments.comment_id) AS comments_count
            FROM
                content.posts
                JOIN users.users ON users.user_id = posts.owner_id
                JOIN users.profiles ON profiles.owner_id = posts.owner_id
                LEFT JOIN content.likes ON likes.post_id = posts.post_id
                LEFT JOIN content.comments ON comments.post_id = posts.post_id
            WHERE
                posts.post_id = $2
            GROUP BY
                posts.post_id, users.user_id, profiles.profile_id
            ",
        )
        .bind(viewer.map(Id::get))
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(|record| record.into_post(viewer)).transpose()?;
        Ok(post)
    }

    pub async fn create_post(
        &self,
        owner: Id<UserMarker>,
        data: &PostData,
    ) -> Result<Post> {
        let post_id: i64 = query_scalar(
            "
            INSERT INTO content.posts (owner_id, title, content, image, image_filter)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING post_id
            ",
        )
        .bind(owner.get())
        .bind(data.title.trim())
        .bind(data.content.trim())
        .bind(DEFAULT_POST_IMAGE)
        .bind(&data.image_filter)
        .fetch_one(&self.pool)
        .await?;

        let post = self
            .fetch_post(Some(owner), post_id.into())
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        owner: Id<UserMarker>,
        post_id: Id<PostMarker>,
        data: &PostData,
    ) -> Result<Post> {
        sqlx::query(
            "
            UPDATE content.posts
            SET title = $2, content = $3, image_filter = $4, updated_at = now()
            WHERE post_id = $1
            ",
        )
        .bind(post_id.get())
        .bind(data.title.trim())
        .bind(data.content.trim())
        .bind(&data.image_filter)
        .execute(&self.pool)
        .await?;

        let post = self
            .fetch_post(Some(owner), post_id)
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(post)
    }

    pub async fn update_post_image(
        &self,
        owner: Id<UserMarker>,
        post_id: Id<PostMarker>,
        image: &str,
    ) -> Result<Post> {
        sqlx::query(
            "
            UPDATE content.posts
            SET image = $2, updated_at = now()
            WHERE post_id = $1
            ",
        )
        .bind(post_id.get())
        .bind(image)
        .execute(&self.pool)
        .await?;

        let post = self
            .fetch_post(Some(owner), post_id)
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM content.posts
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_profiles(
        &self,
        viewer: Option<Id<UserMarker>>,
        list_query: &ProfileListQuery,
    ) -> Result<Vec<Profile>> {
        let (limit, offset) = page_window(list_query.limit, list_query.offset);
        let order_clause = profile_order_clause(list_query.ordering.unwrap_or_default());

        let records = query_as::<_, ProfileRecord>(&format!(
            "
            SELECT
                profiles.profile_id,
                profiles.owner_id,
                users.username,
                profiles.created_at,
                profiles.updated_at,
                profiles.name,
                profiles.content,
                profiles.image,
                (
                    SELECT viewer_edge.follower_id
                    FROM users.followers AS viewer_edge
                    WHERE viewer_edge.followed_id = profiles.owner_id
                        AND viewer_edge.owner_id = $1
                ) AS following_id,
                COUNT(DISTINCT posts.post_id) AS posts_count,
                COUNT(DISTINCT followed_edges.follower_id) AS followers_count,
                COUNT(DISTINCT following_edges.follower_id) AS following_count
            FROM
                users.profiles
                JOIN users.users ON users.user_id = profiles.owner_id
                LEFT JOIN content.posts ON posts.owner_id = profiles.owner_id
                LEFT JOIN users.followers AS followed_edges
                    ON followed_edges.followed_id = profiles.owner_id
                LEFT JOIN users.followers AS following_edges
                    ON following_edges.owner_id = profiles.owner_id
            GROUP BY
                profiles.profile_id, users.user_id
            {order_clause}
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(viewer.map(Id::get))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let profiles = records
            .into_iter()
            .map(|record| record.into_profile(viewer))
            .collect::<Result<_, _>>()?;
        Ok(profiles)
    }

    pub async fn fetch_profile(
        &self,
        viewer: Option<Id<UserMarker>>,
        profile_id: Id<ProfileMarker>,
    ) -> Result<Option<Profile>> {
        let record = query_as::<_, ProfileRecord>(
            "
            SELECT
                profiles.profile_id,
                profiles.owner_id,
                users.username,
                profiles.created_at,
                profiles.updated_at,
                profiles.name,
                profiles.content,
                profiles.image,
                (
                    SELECT viewer_edge.follower_id
                    FROM users.followers AS viewer_edge
                    WHERE viewer_edge.followed_id = profiles.owner_id
                        AND viewer_edge.owner_id = $1
                ) AS following_id,
                COUNT(DISTINCT posts.post_id) AS posts_count,
                COUNT(DISTINCT followed_edges.follower_id) AS followers_count,
                COUNT(DISTINCT following_edges.follower_id) AS following_count
            FROM
                users.profiles
                JOIN users.users ON users.user_id = profiles.owner_id
                LEFT JOIN content.posts ON posts.owner_id = profiles.owner_id
                LEFT JOIN users.followers AS followed_edges
                    ON followed_edges.followed_id = profiles.owner_id
                LEFT JOIN users.followers AS following_edges
                    ON following_edges.owner_id = profiles.owner_id
            WHERE
                profiles.profile_id = $2
            GROUP BY
                profiles.profile_id, users.user_id
            ",
        )
        .bind(viewer.map(Id::get))
        .bind(profile_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let profile = record
            .map(|record| record.into_profile(viewer))
            .transpose()?;
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        owner: Id<UserMarker>,
        profile_id: Id<ProfileMarker>,
        data: &ProfileData,
    ) -> Result<Profile> {
        sqlx::query(
            "
            UPDATE users.profiles
            SET name = $2, content = $3, updated_at = now()
            WHERE profile_id = $1
            ",
        )
        .bind(profile_id.get())
        .bind(data.name.trim())
        .bind(data.content.trim())
        .execute(&self.pool)
        .await?;

        let profile = self
            .fetch_profile(Some(owner), profile_id)
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(profile)
    }

    pub async fn update_profile_image(
        &self,
        owner: Id<UserMarker>,
        profile_id: Id<ProfileMarker>,
        image: &str,
    ) -> Result<Profile> {
        sqlx::query(
            "
            UPDATE users.profiles
            SET image = $2, updated_at = now()
            WHERE profile_id = $1
            ",
        )
        .bind(profile_id.get())
        .bind(image)
        .execute(&self.pool)
        .await?;

        let profile = self
            .fetch_profile(Some(owner), profile_id)
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(profile)
    }

    pub async fn list_comments(
        &self,
        viewer: Option<Id<UserMarker>>,
        list_query: &CommentListQuery,
    ) -> Result<Vec<Comment>> {
        let (limit, offset) = page_window(list_query.limit, list_query.offset);

        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.owner_id,
                users.username,
                profiles.profile_id,
                profiles.image AS profile_image,
                comments.post_id,
                comments.created_at,
                comments.updated_at,
                comments.content
            FROM
                content.comments
                JOIN users.users ON users.user_id = comments.owner_id
                JOIN users.profiles ON profiles.owner_id = comments.owner_id
            WHERE
                $1::BIGINT IS NULL
                OR comments.post_id = $1
            ORDER BY comments.created_at DESC, comments.comment_id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(list_query.post.map(Id::get))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(|record| record.into_comment(viewer))
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    pub async fn fetch_comment(
        &self,
        viewer: Option<Id<UserMarker>>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.owner_id,
                users.username,
                profiles.profile_id,
                profiles.image AS profile_image,
                comments.post_id,
                comments.created_at,
                comments.updated_at,
                comments.content
            FROM
                content.comments
                JOIN users.users ON users.user_id = comments.owner_id
                JOIN users.profiles ON profiles.owner_id = comments.owner_id
            WHERE
                comments.comment_id = $1
            ",
        )
        .bind(comment_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record
            .map(|record| record.into_comment(viewer))
            .transpose()?;
        Ok(comment)
    }

    pub async fn create_comment(
        &self,
        owner: Id<UserMarker>,
        post_id: Id<PostMarker>,
        content: &str,
    ) -> Result<Comment> {
        let comment_id: i64 = query_scalar(
            "
            INSERT INTO content.comments (owner_id, post_id, content)
            VALUES ($1, $2, $3)
            RETURNING comment_id
            ",
        )
        .bind(owner.get())
        .bind(post_id.get())
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        let comment = self
            .fetch_comment(Some(owner), comment_id.into())
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        owner: Id<UserMarker>,
        comment_id: Id<CommentMarker>,
        content: &str,
    ) -> Result<Comment> {
        sqlx::query(
            "
            UPDATE content.comments
            SET content = $2, updated_at = now()
            WHERE comment_id = $1
            ",
        )
        .bind(comment_id.get())
        .bind(content)
        .execute(&self.pool)
        .await?;

        let comment = self
            .fetch_comment(Some(owner), comment_id)
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM content.comments
            WHERE comments.comment_id = $1
            ",
        )
        .bind(comment_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_likes(&self, page: &PageQuery) -> Result<Vec<Like>> {
        let (limit, offset) = page_window(page.limit, page.offset);

        let records = query_as::<_, LikeRecord>(
            "
            SELECT
                likes.like_id,
                likes.owner_id,
                users.username,
                likes.post_id,
                likes.created_at
            FROM
                content.likes
                JOIN users.users ON users.user_id = likes.owner_id
            ORDER BY likes.created_at DESC, likes.like_id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let likes = records
            .into_iter()
            .map(Like::try_from)
            .collect::<Result<_, _>>()?;
        Ok(likes)
    }

    pub async fn fetch_like(&self, like_id: Id<LikeMarker>) -> Result<Option<Like>> {
        let record = query_as::<_, LikeRecord>(
            "
            SELECT
                likes.like_id,
                likes.owner_id,
                users.username,
                likes.post_id,
                likes.created_at
            FROM
                content.likes
                JOIN users.users ON users.user_id = likes.owner_id
            WHERE
                likes.like_id = $1
            ",
        )
        .bind(like_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let like = record.map(Like::try_from).transpose()?;
        Ok(like)
    }

    pub async fn create_like(
        &self,
        owner: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> Result<Like> {
        let like_id: i64 = query_scalar(
            "
            INSERT INTO content.likes (owner_id, post_id)
            VALUES ($1, $2)
            RETURNING like_id
            ",
        )
        .bind(owner.get())
        .bind(post_id.get())
        .fetch_one(&self.pool)
        .await?;

        let like = self
            .fetch_like(like_id.into())
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(like)
    }

    pub async fn delete_like(&self, like_id: Id<LikeMarker>) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM content.likes
            WHERE likes.like_id = $1
            ",
        )
        .bind(like_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_followers(&self, page: &PageQuery) -> Result<Vec<Follower>> {
        let (limit, offset) = page_window(page.limit, page.offset);

        let records = query_as::<_, FollowerRecord>(
            "
            SELECT
                followers.follower_id,
                followers.owner_id,
                owners.username,
                followers.created_at,
                followers.followed_id,
                followed.username AS followed_name
            FROM
                users.followers
                JOIN users.users AS owners ON owners.user_id = followers.owner_id
                JOIN users.users AS followed ON followed.user_id = followers.followed_id
            ORDER BY followers.created_at DESC, followers.follower_id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let followers = records
            .into_iter()
            .map(Follower::try_from)
            .collect::<Result<_, _>>()?;
        Ok(followers)
    }

    pub async fn fetch_follower(
        &self,
        follower_id: Id<FollowerMarker>,
    ) -> Result<Option<Follower>> {
        let record = query_as::<_, FollowerRecord>(
            "
            SELECT
                followers.follower_id,
                followers.owner_id,
                owners.username,
                followers.created_at,
                followers.followed_id,
                followed.username AS followed_name
            FROM
                users.followers
                JOIN users.users AS owners ON owners.user_id = followers.owner_id
                JOIN users.users AS followed ON followed.user_id = followers.followed_id
            WHERE
                followers.follower_id = $1
            ",
        )
        .bind(follower_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let follower = record.map(Follower::try_from).transpose()?;
        Ok(follower)
    }

    pub async fn create_follower(
        &self,
        owner: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<Follower> {
        let follower_id: i64 = query_scalar(
            "
            INSERT INTO users.followers (owner_id, followed_id)
            VALUES ($1, $2)
            RETURNING follower_id
            ",
        )
        .bind(owner.get())
        .bind(followed.get())
        .fetch_one(&self.pool)
        .await?;

        let follower = self
            .fetch_follower(follower_id.into())
            .await?
            .ok_or(DbError::RowVanished)?;
        Ok(follower)
    }

    pub async fn delete_follower(&self, follower_id: Id<FollowerMarker>) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM users.followers
            WHERE followers.follower_id = $1
            ",
        )
        .bind(follower_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
