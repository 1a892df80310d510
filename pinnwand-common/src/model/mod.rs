pub mod auth;
pub mod comment;
pub mod follower;
pub mod image;
pub mod like;
pub mod post;
pub mod profile;
pub mod user;

use crate::{
    model::{
        auth::InvalidAuthTokenHashError,
        post::InvalidPostTitleError,
        user::{InvalidUsernameError, UserMarker},
    },
    util::NonPositiveDurationError,
};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;

/// Errors raised when stored data does not satisfy the model rules anymore,
/// e.g. because it was written by an older revision of the schema.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    PostTitle(#[from] InvalidPostTitleError),
    #[error(transparent)]
    NonPositiveDuration(#[from] NonPositiveDurationError),
    #[error(transparent)]
    TokenHash(#[from] InvalidAuthTokenHashError),
}

/// Identifier of a stored entity, tagged with a marker type so ids of
/// different entities cannot be mixed up. The inner value is the store's
/// `BIGINT` key.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(i64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<i64> for Id<Marker> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for i64 {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

/// Capability of entities that exclusively belong to a user.
///
/// The owner is assigned at creation from the authenticated requester and
/// never changes afterwards.
pub trait HasOwner {
    fn owner_id(&self) -> Id<UserMarker>;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Error)]
#[error("Only the owner may modify this object")]
pub struct NotOwnerError;

/// The single ownership rule: mutating an owned entity requires the acting
/// user to be its owner. Reads never consult this.
pub fn ensure_owner<T: HasOwner + ?Sized>(
    viewer: Id<UserMarker>,
    target: &T,
) -> Result<(), NotOwnerError> {
    if target.owner_id() == viewer {
        Ok(())
    } else {
        Err(NotOwnerError)
    }
}

/// Field-keyed validation messages for a rejected write, serialized as
/// `{"field": ["message", …]}`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// `Ok(())` when no message was collected, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Message for a payload field that was left out entirely.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("This field is required.")]
pub struct RequiredFieldError;

/// Message for a reference to an entity that does not exist.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Invalid pk \"{0}\" - object does not exist.")]
pub struct DanglingReferenceError(pub i64);

/// Message for an edge that already exists, e.g. liking a post twice.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("possible duplicate")]
pub struct DuplicateError;

/// Splits a `-`-prefixed ordering value into its direction and field name.
#[must_use]
pub fn split_ordering(value: &str) -> (bool, &str) {
    value
        .strip_prefix('-')
        .map_or((false, value), |field| (true, field))
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Cannot order by unknown field: {0}")]
pub struct InvalidOrderingError(pub(crate) String);

/// Pagination window shared by the plain list endpoints.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use crate::model::{
        HasOwner, Id, NotOwnerError, ValidationErrors, ensure_owner, split_ordering,
        user::UserMarker,
    };

    struct Owned {
        owner: Id<UserMarker>,
    }

    impl HasOwner for Owned {
        fn owner_id(&self) -> Id<UserMarker> {
            self.owner
        }
    }

    #[test]
    fn owner_may_mutate() {
        let target = Owned {
            owner: Id::new(17),
        };

        assert_eq!(ensure_owner(Id::new(17), &target), Ok(()));
        assert_eq!(ensure_owner(Id::new(18), &target), Err(NotOwnerError));
    }

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.push("title", "This field may not be blank.");
        errors.push("title", "second problem");
        errors.push("image", "too big");

        assert_eq!(errors.messages("title").len(), 2);
        assert_eq!(errors.messages("image"), ["too big"]);
        assert!(errors.messages("content").is_empty());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn ordering_prefix() {
        assert_eq!(split_ordering("likes_count"), (false, "likes_count"));
        assert_eq!(split_ordering("-likes_count"), (true, "likes_count"));
        assert_eq!(split_ordering("-"), (true, ""));
    }
}
