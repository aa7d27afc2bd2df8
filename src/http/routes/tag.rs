use axum::{Extension, Json};
use sea_orm::DatabaseConnection;

use crate::{
    database::entity::tags,
    http::models::{HttpResult, tag::TagsResponse},
};

/// GET /api/tags
pub async fn get_tags(Extension(db): Extension<DatabaseConnection>) -> HttpResult<TagsResponse> {
    let tags = tags::Model::list(&db).await?;

    Ok(Json(TagsResponse {
        tags: tags.into_iter().map(|tag| tag.tag).collect(),
    }))
}
