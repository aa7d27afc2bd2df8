//! Public profile assembly and the follow graph rules

use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::database::entity::users::UserId;
use crate::database::entity::{followers, users};
use crate::database::{DatabaseConnection, DbErr};
use crate::http::models::HttpError;

/// Public view of a user with the viewer-relative following flag
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub following: bool,
}

impl ProfileView {
    pub fn from_user(user: &users::Model, following: bool) -> Self {
        Self {
            username: user.username.clone(),
            bio: user.bio.clone(),
            image: user.image_url.clone(),
            following,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,
    /// Users cannot follow or unfollow themselves
    #[error("Cannot follow yourself")]
    SelfFollow,
    #[error("Already following this profile")]
    AlreadyFollowing,
    #[error("Not following this profile")]
    NotFollowing,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl HttpError for ProfileError {
    fn status(&self) -> StatusCode {
        match self {
            ProfileError::NotFound => StatusCode::NOT_FOUND,
            ProfileError::SelfFollow | ProfileError::NotFollowing => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ProfileError::AlreadyFollowing => StatusCode::CONFLICT,
            ProfileError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> String {
        match self {
            ProfileError::Database(_) => "Server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Assembles the public profile for a username. The following flag is
/// only computed when a viewer is present, anonymous viewers get false
pub async fn get_profile(
    db: &DatabaseConnection,
    username: &str,
    viewer: Option<UserId>,
) -> Result<ProfileView, ProfileError> {
    let user = users::Model::by_username(db, username)
        .await?
        .ok_or(ProfileError::NotFound)?;

    let following = match viewer {
        Some(viewer_id) => followers::Model::exists(db, viewer_id, user.id).await?,
        None => false,
    };

    Ok(ProfileView::from_user(&user, following))
}

pub async fn follow(
    db: &DatabaseConnection,
    viewer: &users::Model,
    username: &str,
) -> Result<ProfileView, ProfileError> {
    // Rejected before the lookup so it holds whether or not the name resolves
    if viewer.username == username {
        return Err(ProfileError::SelfFollow);
    }

    let target = users::Model::by_username(db, username)
        .await?
        .ok_or(ProfileError::NotFound)?;

    if followers::Model::exists(db, viewer.id, target.id).await? {
        return Err(ProfileError::AlreadyFollowing);
    }

    followers::Model::create(db, viewer.id, target.id).await?;

    Ok(ProfileView::from_user(&target, true))
}

pub async fn unfollow(
    db: &DatabaseConnection,
    viewer: &users::Model,
    username: &str,
) -> Result<ProfileView, ProfileError> {
    if viewer.username == username {
        return Err(ProfileError::SelfFollow);
    }

    let target = users::Model::by_username(db, username)
        .await?
        .ok_or(ProfileError::NotFound)?;

    if !followers::Model::exists(db, viewer.id, target.id).await? {
        return Err(ProfileError::NotFollowing);
    }

    followers::Model::delete(db, viewer.id, target.id).await?;

    Ok(ProfileView::from_user(&target, false))
}

#[cfg(test)]
mod test {
    use super::{ProfileError, follow, get_profile, unfollow};
    use crate::database::entity::users;
    use crate::database::{DatabaseConnection, connect_test_database};

    async fn test_user(db: &DatabaseConnection, name: &str) -> users::Model {
        users::Model::create(
            db,
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_follow_unfollow_flow() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        test_user(&db, "bob").await;

        let profile = follow(&db, &ann, "bob").await.unwrap();
        assert!(profile.following);

        let profile = get_profile(&db, "bob", Some(ann.id)).await.unwrap();
        assert!(profile.following);

        // Anonymous viewers never see a following flag
        let profile = get_profile(&db, "bob", None).await.unwrap();
        assert!(!profile.following);

        let profile = unfollow(&db, &ann, "bob").await.unwrap();
        assert!(!profile.following);
    }

    /// Self-follow fails regardless of whether the name resolves
    #[tokio::test]
    async fn test_self_follow() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        assert!(matches!(
            follow(&db, &ann, "ann").await.unwrap_err(),
            ProfileError::SelfFollow
        ));
        assert!(matches!(
            unfollow(&db, &ann, "ann").await.unwrap_err(),
            ProfileError::SelfFollow
        ));
    }

    #[tokio::test]
    async fn test_follow_twice() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        test_user(&db, "bob").await;

        follow(&db, &ann, "bob").await.unwrap();
        assert!(matches!(
            follow(&db, &ann, "bob").await.unwrap_err(),
            ProfileError::AlreadyFollowing
        ));
    }

    #[tokio::test]
    async fn test_unfollow_not_following() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        test_user(&db, "bob").await;

        assert!(matches!(
            unfollow(&db, &ann, "bob").await.unwrap_err(),
            ProfileError::NotFollowing
        ));
    }

    #[tokio::test]
    async fn test_unknown_profile() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        assert!(matches!(
            get_profile(&db, "nobody", None).await.unwrap_err(),
            ProfileError::NotFound
        ));
        assert!(matches!(
            follow(&db, &ann, "nobody").await.unwrap_err(),
            ProfileError::NotFound
        ));
    }
}
