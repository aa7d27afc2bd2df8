use crate::{
    database::entity::{User, users},
    http::models::{DynHttpError, HttpError},
    services::tokens::Tokens,
};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use hyper::StatusCode;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use thiserror::Error;

/// Extractor for the authenticated user resolved from the request token
pub struct Auth(pub User);

/// Extractor for routes that serve both anonymous and authenticated
/// viewers. An absent header is anonymous, a present but invalid
/// token is still an error
pub struct MaybeAuth(pub Option<User>);

/// Scheme prefix expected on the authorization header
const TOKEN_SCHEME: &str = "Token ";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The token was missing from the request
    #[error("Missing authentication token")]
    MissingToken,
    /// Invalid token provided (Or the associated user doesn't exist anymore)
    #[error("Authorization token invalid")]
    InvalidToken,
}

impl HttpError for AuthError {
    fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = DynHttpError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let db = parts
            .extensions
            .get::<DatabaseConnection>()
            .expect("Database connection extension missing")
            .clone();

        let tokens: Arc<Tokens> = parts
            .extensions
            .get::<Arc<Tokens>>()
            .expect("Tokens extension missing")
            .clone();

        // Extract the token from the headers
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(TOKEN_SCHEME))
            .ok_or(AuthError::MissingToken)?;

        let claims = tokens
            .verify_token(token)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = users::Model::by_id(&db, claims.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = DynHttpError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Self(None));
        }

        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        Ok(Self(Some(user)))
    }
}
