use axum::{Extension, Json};
use log::debug;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{
    http::{
        middleware::{auth::Auth, json_validated::JsonValidated},
        models::{
            HttpResult,
            user::{LoginRequest, RegisterRequest, UpdateRequest, UserResponse},
        },
    },
    services::{
        tokens::Tokens,
        users::{self, UserChanges},
    },
};

/// POST /api/users
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(tokens): Extension<Arc<Tokens>>,
    JsonValidated(req): JsonValidated<RegisterRequest>,
) -> HttpResult<UserResponse> {
    debug!("Register user: {}", &req.user.username);

    let user = users::register(&db, req.user.username, req.user.email, req.user.password).await?;
    let token = tokens.create_token(user.id, &user.username);

    Ok(Json(UserResponse::new(user, token)))
}

/// POST /api/users/login
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(tokens): Extension<Arc<Tokens>>,
    JsonValidated(req): JsonValidated<LoginRequest>,
) -> HttpResult<UserResponse> {
    let user = users::authenticate(&db, &req.user.email, &req.user.password).await?;
    let token = tokens.create_token(user.id, &user.username);

    Ok(Json(UserResponse::new(user, token)))
}

/// GET /api/user
pub async fn current_user(
    Extension(tokens): Extension<Arc<Tokens>>,
    Auth(user): Auth,
) -> HttpResult<UserResponse> {
    let token = tokens.create_token(user.id, &user.username);
    Ok(Json(UserResponse::new(user, token)))
}

/// PUT /api/user
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Auth(user): Auth,
    JsonValidated(req): JsonValidated<UpdateRequest>,
) -> HttpResult<UserResponse> {
    debug!("Update user: {}", user.id);

    let user = users::update(
        &db,
        user,
        UserChanges {
            email: req.user.email,
            username: req.user.username,
            password: req.user.password,
            bio: req.user.bio,
            image: req.user.image,
        },
    )
    .await?;
    let token = tokens.create_token(user.id, &user.username);

    Ok(Json(UserResponse::new(user, token)))
}
