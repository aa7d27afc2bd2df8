use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::comments::CommentView;

/// POST /api/articles/{slug}/comments request payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(nested)]
    pub comment: CreateCommentBody,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentBody {
    #[validate(length(min = 1, message = "Comment body cannot be empty"))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentView>,
}
