//! User directory: registration, authentication and account updates

use chrono::Utc;
use hyper::StatusCode;
use log::debug;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, IntoActiveModel};
use thiserror::Error;

use crate::database::entity::users::{self, UserId};
use crate::database::{DatabaseConnection, DbErr};
use crate::http::models::HttpError;
use crate::utils::hashing::{hash_password, verify_password};

/// Avatar assigned to accounts that haven't picked one
pub const DEFAULT_IMAGE_URL: &str = "https://api.realworld.io/images/smiley-cyrus.jpeg";

/// Errors produced by the user directory
#[derive(Debug, Error)]
pub enum UserError {
    /// Another account owns the email
    #[error("Email is already in use")]
    EmailTaken,
    /// Another account owns the username
    #[error("Username is already in use")]
    UsernameTaken,
    /// Covers both an unknown email and a wrong password so responses
    /// can't be used to probe which emails are registered
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    /// The password couldn't be hashed
    #[error("Failed to process password")]
    PasswordHash,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl HttpError for UserError {
    fn status(&self) -> StatusCode {
        match self {
            UserError::EmailTaken | UserError::UsernameTaken => StatusCode::CONFLICT,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::PasswordHash | UserError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> String {
        match self {
            // Internal failures shouldn't be visible to users
            UserError::PasswordHash | UserError::Database(_) => "Server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Partial update of an account, absent fields are left untouched
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// Creates a new account. Email and username uniqueness are checked
/// up front so the caller can tell which field collided. The password
/// is hashed before it is stored
pub async fn register(
    db: &DatabaseConnection,
    username: String,
    email: String,
    password: String,
) -> Result<users::Model, UserError> {
    if users::Model::by_email(db, &email).await?.is_some() {
        return Err(UserError::EmailTaken);
    }

    if users::Model::by_username(db, &username).await?.is_some() {
        return Err(UserError::UsernameTaken);
    }

    let password = hash_password(&password).map_err(|_| UserError::PasswordHash)?;

    users::Model::create(
        db,
        username,
        email,
        password,
        Some(DEFAULT_IMAGE_URL.to_string()),
    )
    .await
    .map_err(UserError::from)
}

/// Resolves credentials to the account they belong to. Both failure
/// modes produce the same [UserError::InvalidCredentials]
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<users::Model, UserError> {
    let user = match users::Model::by_email(db, email).await? {
        Some(user) => user,
        None => {
            debug!("Login attempt for unknown email");
            return Err(UserError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password) {
        debug!("Login attempt with wrong password for user {}", user.id);
        return Err(UserError::InvalidCredentials);
    }

    Ok(user)
}

/// Applies a partial update to the account. Uniqueness is re-checked
/// only for fields that are present and actually changing
pub async fn update(
    db: &DatabaseConnection,
    user: users::Model,
    changes: UserChanges,
) -> Result<users::Model, UserError> {
    if let Some(email) = &changes.email
        && email != &user.email
        && users::Model::by_email(db, email).await?.is_some()
    {
        return Err(UserError::EmailTaken);
    }

    if let Some(username) = &changes.username
        && username != &user.username
        && users::Model::by_username(db, username).await?.is_some()
    {
        return Err(UserError::UsernameTaken);
    }

    let mut active = user.into_active_model();
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(password) = changes.password {
        active.password = Set(hash_password(&password).map_err(|_| UserError::PasswordHash)?);
    }
    if let Some(bio) = changes.bio {
        active.bio = Set(bio);
    }
    if let Some(image) = changes.image {
        active.image_url = Set(Some(image));
    }
    active.updated_at = Set(Some(Utc::now()));

    active.update(db).await.map_err(UserError::from)
}

pub async fn get(db: &DatabaseConnection, user_id: UserId) -> Result<users::Model, UserError> {
    users::Model::by_id(db, user_id)
        .await?
        .ok_or(UserError::NotFound)
}

pub async fn get_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, UserError> {
    users::Model::by_username(db, username)
        .await?
        .ok_or(UserError::NotFound)
}

#[cfg(test)]
mod test {
    use super::{UserChanges, UserError, authenticate, register, update};
    use crate::database::connect_test_database;
    use crate::utils::logging::setup_test_logging;

    /// Registration followed by authentication with the same
    /// credentials must resolve to the same account
    #[tokio::test]
    async fn test_register_then_authenticate() {
        setup_test_logging();
        let db = connect_test_database().await;

        let user = register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "secret-password".to_string(),
        )
        .await
        .unwrap();

        // Plaintext must never be stored
        assert_ne!(user.password, "secret-password");

        let authed = authenticate(&db, "ann@example.com", "secret-password")
            .await
            .unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = connect_test_database().await;

        register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();

        let err = register(
            &db,
            "not-ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let db = connect_test_database().await;

        register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();

        let err = register(
            &db,
            "ann".to_string(),
            "other@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    /// Unknown email and wrong password must be indistinguishable
    #[tokio::test]
    async fn test_authenticate_failures_undifferentiated() {
        let db = connect_test_database().await;

        register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();

        let unknown = authenticate(&db, "nobody@example.com", "password")
            .await
            .unwrap_err();
        let wrong = authenticate(&db, "ann@example.com", "wrong").await.unwrap_err();

        assert!(matches!(unknown, UserError::InvalidCredentials));
        assert!(matches!(wrong, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_update_partial() {
        let db = connect_test_database().await;

        let user = register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();

        let updated = update(
            &db,
            user,
            UserChanges {
                bio: Some("Rust developer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.bio, "Rust developer");
        assert_eq!(updated.username, "ann");
        assert_eq!(updated.email, "ann@example.com");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let db = connect_test_database().await;

        assert!(matches!(
            super::get(&db, 42).await.unwrap_err(),
            UserError::NotFound
        ));
        assert!(matches!(
            super::get_by_username(&db, "nobody").await.unwrap_err(),
            UserError::NotFound
        ));

        let user = register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(super::get(&db, user.id).await.unwrap().username, "ann");
        assert_eq!(super::get_by_username(&db, "ann").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_update_username_conflict() {
        let db = connect_test_database().await;

        register(
            &db,
            "ann".to_string(),
            "ann@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();
        let bob = register(
            &db,
            "bob".to_string(),
            "bob@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();

        let err = update(
            &db,
            bob.clone(),
            UserChanges {
                username: Some("ann".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));

        // Re-submitting the current username is not a conflict
        update(
            &db,
            bob,
            UserChanges {
                username: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }
}
