use crate::model::{Id, ValidationErrors, profile::ProfileMarker};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{self, Debug, Formatter};
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// Account view handed back by the register/login/me operations.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CurrentUser {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub profile_id: Id<ProfileMarker>,
    pub profile_image: String,
}

/// Registration payload. Validation happens explicitly so every broken
/// field can be reported at once; absent fields read as blank.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = match Username::new(self.username.clone()) {
            Ok(username) => Some(username),
            Err(err) => {
                errors.push("username", err.to_string());
                None
            }
        };
        let password = match Password::new(self.password.clone()) {
            Ok(password) => Some(password),
            Err(err) => {
                errors.push("password", err.to_string());
                None
            }
        };

        match (username, password) {
            (Some(username), Some(password)) => Ok(NewUser { username, password }),
            _ => Err(errors),
        }
    }
}

/// Login payload. Not validated beyond deserialization; wrong credentials
/// are an authorization failure, not a validation one.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
pub struct LoginUser {
    pub username: String,
    pub password: String,
}

/// A validated registration, ready to be persisted.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewUser {
    pub username: Username,
    pub password: Password,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidUsernameError {
    #[error("This field may not be blank.")]
    Blank,
    #[error("Ensure this field has no more than {USERNAME_MAX_LEN} characters.")]
    TooLong,
    #[error(
        "Enter a valid username. This value may contain only letters, numbers, \
        and @/./+/-/_ characters."
    )]
    Character,
}

/// Message for a registration that collides with an existing account.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A user with that username already exists.")]
pub struct UsernameTakenError;

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if username.is_empty() {
            return Err(InvalidUsernameError::Blank);
        }
        if username.chars().count() > USERNAME_MAX_LEN {
            return Err(InvalidUsernameError::TooLong);
        }
        let valid = username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
        if !valid {
            return Err(InvalidUsernameError::Character);
        }

        Ok(Username(username))
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

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"Username"))
    }
}

/// A plaintext password on its way to being hashed. Never stored, never
/// logged.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Password(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPasswordError {
    #[error("This field may not be blank.")]
    Blank,
    #[error("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters.")]
    TooShort,
}

impl Password {
    pub fn new(password: String) -> Result<Self, InvalidPasswordError> {
        if password.is_empty() {
            return Err(InvalidPasswordError::Blank);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(InvalidPasswordError::TooShort);
        }

        Ok(Password(password))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{
        InvalidPasswordError, InvalidUsernameError, Password, RegisterUser, Username,
    };

    #[test]
    fn username_rules() {
        assert!(Username::new("adam".to_owned()).is_ok());
        assert!(Username::new("a.b+c@d-e_f".to_owned()).is_ok());
        assert!(Username::new("äöü".to_owned()).is_ok());

        assert_eq!(
            Username::new(String::new()),
            Err(InvalidUsernameError::Blank)
        );
        assert_eq!(
            Username::new("a".repeat(151)),
            Err(InvalidUsernameError::TooLong)
        );
        assert_eq!(
            Username::new("with space".to_owned()),
            Err(InvalidUsernameError::Character)
        );
        assert_eq!(
            Username::new("semi;colon".to_owned()),
            Err(InvalidUsernameError::Character)
        );
    }

    #[test]
    fn password_rules() {
        assert!(Password::new("longenough".to_owned()).is_ok());
        assert_eq!(Password::new(String::new()), Err(InvalidPasswordError::Blank));
        assert_eq!(
            Password::new("short".to_owned()),
            Err(InvalidPasswordError::TooShort)
        );
    }

    #[test]
    fn register_collects_all_field_errors() {
        let register = RegisterUser {
            username: "no spaces allowed".to_owned(),
            password: "short".to_owned(),
        };

        let errors = register.validate().unwrap_err();
        assert_eq!(errors.messages("username").len(), 1);
        assert_eq!(errors.messages("password").len(), 1);

        let register = RegisterUser {
            username: "adam".to_owned(),
            password: "password123".to_owned(),
        };
        let new_user = register.validate().unwrap();
        assert_eq!(new_user.username.get(), "adam");
    }

    #[test]
    fn password_debug_is_redacted() {
        let password = Password::new("password123".to_owned()).unwrap();
        assert!(!format!("{password:?}").contains("password123"));
    }
}
