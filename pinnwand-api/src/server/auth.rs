use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use pinnwand_common::model::{Id, auth::AuthToken, user::UserMarker};
use pinnwand_db::client::DbClient;
use std::{hash::Hash, sync::Arc};
use time::OffsetDateTime;

pub(crate) type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// Requester proven by a bearer token. Handlers take this to require
/// authentication, or an `Option` of it where anonymous reads are fine.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }

    async fn from_token(db_client: &DbClient, token: &str) -> Result<Self, ServerError> {
        let request_token: AuthToken = token.parse()?;
        let token_hash = request_token.hash()?;

        let authentication = db_client
            .fetch_auth(&token_hash)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        assert_eq!(authentication.token_hash, token_hash);

        if authentication.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(ServerError::InvalidToken);
        }

        Ok(Self {
            id: authentication.user,
        })
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header =
            <AuthorizationHeader as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?;

        Self::from_token(&Arc::<DbClient>::from_ref(state), header.token()).await
    }
}

/// A missing header reads as an anonymous request; a header that is present
/// but does not authenticate is still an error.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <AuthorizationHeader as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(header) => {
                let user =
                    Self::from_token(&Arc::<DbClient>::from_ref(state), header.token()).await?;
                Ok(Some(user))
            }
            Err(rejection) if rejection.is_missing() => Ok(None),
            Err(rejection) => Err(ServerError::InvalidAuthorizationHeader(rejection)),
        }
    }
}
