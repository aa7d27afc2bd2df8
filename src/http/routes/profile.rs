use axum::{Extension, Json, extract::Path};
use log::debug;
use sea_orm::DatabaseConnection;

use crate::{
    http::{
        middleware::auth::{Auth, MaybeAuth},
        models::{HttpResult, profile::ProfileResponse},
    },
    services::profiles,
};

/// GET /api/profiles/{username}
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuth(viewer): MaybeAuth,
    Path(username): Path<String>,
) -> HttpResult<ProfileResponse> {
    let profile =
        profiles::get_profile(&db, &username, viewer.map(|viewer| viewer.id)).await?;
    Ok(Json(ProfileResponse { profile }))
}

/// POST /api/profiles/{username}/follow
pub async fn follow_user(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(username): Path<String>,
) -> HttpResult<ProfileResponse> {
    debug!("User {} following {}", user.username, username);

    let profile = profiles::follow(&db, &user, &username).await?;
    Ok(Json(ProfileResponse { profile }))
}

/// DELETE /api/profiles/{username}/follow
pub async fn unfollow_user(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(username): Path<String>,
) -> HttpResult<ProfileResponse> {
    debug!("User {} unfollowing {}", user.username, username);

    let profile = profiles::unfollow(&db, &user, &username).await?;
    Ok(Json(ProfileResponse { profile }))
}
