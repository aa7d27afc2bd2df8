use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::articles::ArticleView;

/// POST /api/articles request payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(nested)]
    pub article: CreateArticleBody,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleBody {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[validate(length(min = 1, message = "Body cannot be empty"))]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

/// PUT /api/articles/{slug} request payload, all fields optional.
/// A present tag list replaces the article's whole tag set
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(nested)]
    pub article: UpdateArticleBody,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleBody {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article: ArticleView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleView>,
    pub articles_count: u64,
}

/// Query string accepted by GET /api/articles
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Query string accepted by GET /api/articles/feed
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}
