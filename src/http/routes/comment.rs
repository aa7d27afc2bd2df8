use axum::{Extension, Json, extract::Path};
use hyper::StatusCode;
use log::debug;
use sea_orm::DatabaseConnection;

use crate::{
    database::entity::comments::CommentId,
    http::{
        middleware::{
            auth::{Auth, MaybeAuth},
            json_validated::JsonValidated,
        },
        models::{
            DynHttpError, HttpResult,
            comment::{CommentResponse, CommentsResponse, CreateCommentRequest},
        },
    },
    services::comments,
};

/// GET /api/articles/{slug}/comments
pub async fn get_comments(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuth(viewer): MaybeAuth,
    Path(slug): Path<String>,
) -> HttpResult<CommentsResponse> {
    let comments =
        comments::list_for_article(&db, &slug, viewer.map(|viewer| viewer.id)).await?;
    Ok(Json(CommentsResponse { comments }))
}

/// POST /api/articles/{slug}/comments
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(slug): Path<String>,
    JsonValidated(req): JsonValidated<CreateCommentRequest>,
) -> HttpResult<CommentResponse> {
    debug!("User {} commenting on {}", user.id, &slug);

    let comment = comments::create(&db, &slug, &user, req.comment.body).await?;
    Ok(Json(CommentResponse { comment }))
}

/// DELETE /api/articles/{slug}/comments/{id}
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path((slug, id)): Path<(String, CommentId)>,
) -> Result<StatusCode, DynHttpError> {
    debug!("User {} deleting comment {} on {}", user.id, id, &slug);

    comments::delete(&db, &slug, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
