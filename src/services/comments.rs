//! Comment store scoped to articles, with author profile enrichment

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::database::entity::comments::CommentId;
use crate::database::entity::users::UserId;
use crate::database::entity::{articles, comments, followers, users};
use crate::database::{DatabaseConnection, DbErr};
use crate::http::models::HttpError;
use crate::services::profiles::ProfileView;

/// Comment enriched with its author's profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: ProfileView,
}

#[derive(Debug, Error)]
pub enum CommentError {
    /// The slug didn't resolve to an article
    #[error("Article not found")]
    ArticleNotFound,
    #[error("Comment not found")]
    NotFound,
    /// Only the comment author may delete it
    #[error("Not the author of this comment")]
    NotAuthorized,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl HttpError for CommentError {
    fn status(&self) -> StatusCode {
        match self {
            CommentError::ArticleNotFound | CommentError::NotFound => StatusCode::NOT_FOUND,
            CommentError::NotAuthorized => StatusCode::FORBIDDEN,
            CommentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> String {
        match self {
            CommentError::Database(_) => "Server error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub async fn create(
    db: &DatabaseConnection,
    slug: &str,
    author: &users::Model,
    body: String,
) -> Result<CommentView, CommentError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(CommentError::ArticleNotFound)?;

    let comment = comments::Model::create(db, article.id, author.id, body).await?;

    Ok(CommentView {
        id: comment.id,
        body: comment.body,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        // The viewer is the author here and can't be following themselves
        author: ProfileView::from_user(author, false),
    })
}

/// Comments of the article in insertion order, oldest first, each
/// enriched with its author profile and the viewer-relative following flag
pub async fn list_for_article(
    db: &DatabaseConnection,
    slug: &str,
    viewer: Option<UserId>,
) -> Result<Vec<CommentView>, CommentError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(CommentError::ArticleNotFound)?;

    let comments = comments::Model::list_for_article(db, article.id).await?;

    let mut author_ids: Vec<UserId> = comments.iter().map(|comment| comment.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<UserId, users::Model> = users::Model::by_ids(db, author_ids.clone())
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let following = match viewer {
        Some(viewer_id) => {
            followers::Model::following_ids_among(db, viewer_id, author_ids).await?
        }
        None => HashSet::new(),
    };

    Ok(comments
        .into_iter()
        .filter_map(|comment| {
            let author = authors.get(&comment.author_id)?;
            Some(CommentView {
                id: comment.id,
                body: comment.body,
                created_at: comment.created_at,
                updated_at: comment.updated_at,
                author: ProfileView::from_user(author, following.contains(&comment.author_id)),
            })
        })
        .collect())
}

/// Deletes a comment from the article. The author-only rule lives
/// here rather than in the HTTP layer
pub async fn delete(
    db: &DatabaseConnection,
    slug: &str,
    comment_id: CommentId,
    viewer_id: UserId,
) -> Result<(), CommentError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(CommentError::ArticleNotFound)?;

    let comment = comments::Model::by_id(db, comment_id)
        .await?
        .ok_or(CommentError::NotFound)?;

    // A comment id under the wrong article's slug doesn't resolve
    if comment.article_id != article.id {
        return Err(CommentError::NotFound);
    }

    if comment.author_id != viewer_id {
        return Err(CommentError::NotAuthorized);
    }

    comments::Model::delete(db, comment.id).await?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{CommentError, create, delete, list_for_article};
    use crate::database::entity::{followers, users};
    use crate::database::{DatabaseConnection, connect_test_database};
    use crate::services::articles::{self, CreateArticle};

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

    async fn test_article(db: &DatabaseConnection, author: &users::Model) {
        articles::create(
            db,
            author,
            CreateArticle {
                title: "Hello World".to_string(),
                description: "A description".to_string(),
                body: "The body".to_string(),
                tag_list: Vec::new(),
            },
        )
        .await
        .unwrap();
    }

    /// Comments list oldest first and carry their author profiles
    #[tokio::test]
    async fn test_create_and_list() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;
        test_article(&db, &ann).await;

        create(&db, "hello-world", &bob, "First!".to_string())
            .await
            .unwrap();
        create(&db, "hello-world", &ann, "Thanks bob".to_string())
            .await
            .unwrap();

        let comments = list_for_article(&db, "hello-world", None).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "First!");
        assert_eq!(comments[0].author.username, "bob");
        assert_eq!(comments[1].body, "Thanks bob");
        assert_eq!(comments[1].author.username, "ann");
    }

    /// The following flag on comment authors is viewer-relative
    #[tokio::test]
    async fn test_list_following_flag() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;
        test_article(&db, &ann).await;

        create(&db, "hello-world", &ann, "A comment".to_string())
            .await
            .unwrap();
        followers::Model::create(&db, bob.id, ann.id).await.unwrap();

        let comments = list_for_article(&db, "hello-world", Some(bob.id))
            .await
            .unwrap();
        assert!(comments[0].author.following);

        let comments = list_for_article(&db, "hello-world", None).await.unwrap();
        assert!(!comments[0].author.following);
    }

    #[tokio::test]
    async fn test_unknown_article() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        assert!(matches!(
            create(&db, "missing", &ann, "Hello".to_string())
                .await
                .unwrap_err(),
            CommentError::ArticleNotFound
        ));
        assert!(matches!(
            list_for_article(&db, "missing", None).await.unwrap_err(),
            CommentError::ArticleNotFound
        ));
    }

    /// Deleting a comment as a non-author must be rejected, as the
    /// author it succeeds and the listing no longer includes it
    #[tokio::test]
    async fn test_delete_authorization() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;
        test_article(&db, &ann).await;

        let comment = create(&db, "hello-world", &bob, "Mine".to_string())
            .await
            .unwrap();

        assert!(matches!(
            delete(&db, "hello-world", comment.id, ann.id)
                .await
                .unwrap_err(),
            CommentError::NotAuthorized
        ));

        delete(&db, "hello-world", comment.id, bob.id)
            .await
            .unwrap();

        let comments = list_for_article(&db, "hello-world", None).await.unwrap();
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_comment() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        test_article(&db, &ann).await;

        assert!(matches!(
            delete(&db, "hello-world", 42, ann.id).await.unwrap_err(),
            CommentError::NotFound
        ));
    }
}
