use axum::{
    Extension, Json,
    extract::{Path, Query},
};
use hyper::StatusCode;
use log::debug;
use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    database::entity::articles,
    http::{
        middleware::{
            auth::{Auth, MaybeAuth},
            json_validated::JsonValidated,
        },
        models::{
            DynHttpError, HttpError, HttpResult,
            article::{
                ArticleResponse, ArticlesResponse, CreateArticleRequest, FeedQuery, ListQuery,
                UpdateArticleRequest,
            },
        },
    },
    services::articles::{
        self as article_service, ArticleError, ArticleFilter, CreateArticle, UpdateArticle,
    },
};

/// Rejection for article mutations attempted by someone other than
/// the article author
#[derive(Debug, Error)]
#[error("Not the author of this article")]
pub struct NotArticleAuthor;

impl HttpError for NotArticleAuthor {
    fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

/// GET /api/articles
pub async fn list_articles(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuth(viewer): MaybeAuth,
    Query(query): Query<ListQuery>,
) -> HttpResult<ArticlesResponse> {
    let filter = ArticleFilter {
        tag: query.tag,
        author: query.author,
        favorited: query.favorited,
    };

    let (articles, articles_count) = article_service::list(
        &db,
        filter,
        query.limit,
        query.offset,
        viewer.map(|viewer| viewer.id),
    )
    .await?;

    Ok(Json(ArticlesResponse {
        articles,
        articles_count,
    }))
}

/// GET /api/articles/feed
pub async fn feed_articles(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Query(query): Query<FeedQuery>,
) -> HttpResult<ArticlesResponse> {
    let (articles, articles_count) =
        article_service::feed(&db, user.id, query.limit, query.offset).await?;

    Ok(Json(ArticlesResponse {
        articles,
        articles_count,
    }))
}

/// POST /api/articles
pub async fn create_article(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    JsonValidated(req): JsonValidated<CreateArticleRequest>,
) -> HttpResult<ArticleResponse> {
    debug!("User {} creating article: {}", user.id, &req.article.title);

    let article = article_service::create(
        &db,
        &user,
        CreateArticle {
            title: req.article.title,
            description: req.article.description,
            body: req.article.body,
            tag_list: req.article.tag_list,
        },
    )
    .await?;

    Ok(Json(ArticleResponse { article }))
}

/// GET /api/articles/{slug}
pub async fn get_article(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuth(viewer): MaybeAuth,
    Path(slug): Path<String>,
) -> HttpResult<ArticleResponse> {
    let article =
        article_service::get_by_slug(&db, &slug, viewer.map(|viewer| viewer.id)).await?;
    Ok(Json(ArticleResponse { article }))
}

/// PUT /api/articles/{slug}
pub async fn update_article(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(slug): Path<String>,
    JsonValidated(req): JsonValidated<UpdateArticleRequest>,
) -> HttpResult<ArticleResponse> {
    // Only the author may update their article
    let article = articles::Model::by_slug(&db, &slug)
        .await?
        .ok_or(ArticleError::NotFound)?;
    if article.author_id != user.id {
        return Err(NotArticleAuthor.into());
    }

    let article = article_service::update(
        &db,
        &slug,
        UpdateArticle {
            title: req.article.title,
            description: req.article.description,
            body: req.article.body,
            tag_list: req.article.tag_list,
        },
        Some(user.id),
    )
    .await?;

    Ok(Json(ArticleResponse { article }))
}

/// DELETE /api/articles/{slug}
pub async fn delete_article(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(slug): Path<String>,
) -> Result<StatusCode, DynHttpError> {
    // Only the author may delete their article
    let article = articles::Model::by_slug(&db, &slug)
        .await?
        .ok_or(ArticleError::NotFound)?;
    if article.author_id != user.id {
        return Err(NotArticleAuthor.into());
    }

    debug!("User {} deleting article {}", user.id, &slug);

    article_service::delete(&db, &slug).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/articles/{slug}/favorite
pub async fn favorite_article(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(slug): Path<String>,
) -> HttpResult<ArticleResponse> {
    let article = article_service::favorite(&db, &slug, user.id).await?;
    Ok(Json(ArticleResponse { article }))
}

/// DELETE /api/articles/{slug}/favorite
pub async fn unfavorite_article(
    Extension(db): Extension<DatabaseConnection>,
    Auth(user): Auth,
    Path(slug): Path<String>,
) -> HttpResult<ArticleResponse> {
    let article = article_service::unfavorite(&db, &slug, user.id).await?;
    Ok(Json(ArticleResponse { article }))
}
