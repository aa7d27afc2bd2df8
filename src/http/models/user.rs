use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::entity::User;

/// POST /api/users request payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(nested)]
    pub user: RegisterUser,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[validate(email(message = "Email must be well formed"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// POST /api/users/login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(nested)]
    pub user: LoginUser,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// PUT /api/user request payload, all fields optional
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    #[validate(nested)]
    pub user: UpdateUser,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(email(message = "Email must be well formed"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: Option<String>,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// Account envelope returned by every user route, always carrying a
/// fresh session token
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: AuthenticatedUser,
}

#[derive(Debug, Serialize)]
pub struct AuthenticatedUser {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
}

impl UserResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            user: AuthenticatedUser {
                email: user.email,
                token,
                username: user.username,
                bio: user.bio,
                image: user.image_url,
            },
        }
    }
}
