//! Article store: slug generation, tag linking, favorites and the
//! filtered listing / feed assembly

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hyper::StatusCode;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, TransactionError,
    TransactionTrait,
};
use serde::Serialize;
use thiserror::Error;

use crate::database::entity::articles::ArticleId;
use crate::database::entity::users::UserId;
use crate::database::entity::{article_tags, articles, comments, favorites, followers, tags, users};
use crate::database::{DatabaseConnection, DbErr, DbResult};
use crate::http::models::HttpError;
use crate::services::profiles::ProfileView;
use crate::utils::slug::{slug_from_title, slug_with_code};

/// Fully assembled article aggregate: the row itself, the author
/// profile, the tag list, the favorite count and the viewer-relative
/// favorited / following flags
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: u64,
    pub author: ProfileView,
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("Article not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl HttpError for ArticleError {
    fn status(&self) -> StatusCode {
        match self {
            ArticleError::NotFound => StatusCode::NOT_FOUND,
            ArticleError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> String {
        match self {
            ArticleError::Database(_) => "Server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<TransactionError<DbErr>> for ArticleError {
    fn from(value: TransactionError<DbErr>) -> Self {
        match value {
            TransactionError::Connection(err) | TransactionError::Transaction(err) => {
                Self::Database(err)
            }
        }
    }
}

#[derive(Debug)]
pub struct CreateArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
}

/// Partial update, absent fields are left untouched. A present
/// tag list replaces the article's whole tag set
#[derive(Debug, Default)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
}

/// Filters for the global article listing, AND-combined
#[derive(Debug, Default)]
pub struct ArticleFilter {
    /// Articles carrying this tag
    pub tag: Option<String>,
    /// Articles written by this username
    pub author: Option<String>,
    /// Articles favorited by this username
    pub favorited: Option<String>,
}

/// Creates an article. The row and its tag links land in a single
/// transaction so an aborted request can't commit half of them
pub async fn create(
    db: &DatabaseConnection,
    author: &users::Model,
    create: CreateArticle,
) -> Result<ArticleView, ArticleError> {
    let slug = unique_slug(db, &create.title, None).await?;
    let author_id = author.id;

    let (article, tag_list) = db
        .transaction::<_, (articles::Model, Vec<String>), DbErr>(|txn| {
            Box::pin(async move {
                let article = articles::Model::create(
                    txn,
                    author_id,
                    slug,
                    create.title,
                    create.description,
                    create.body,
                )
                .await?;

                let tag_models = tags::Model::find_or_create_many(txn, &create.tag_list).await?;
                article_tags::Model::link_many(
                    txn,
                    article.id,
                    tag_models.iter().map(|tag| tag.id).collect(),
                )
                .await?;

                let mut tag_list: Vec<String> =
                    tag_models.into_iter().map(|tag| tag.tag).collect();
                tag_list.sort();

                Ok((article, tag_list))
            })
        })
        .await?;

    Ok(ArticleView {
        slug: article.slug,
        title: article.title,
        description: article.description,
        body: article.body,
        tag_list,
        created_at: article.created_at,
        updated_at: article.updated_at,
        // Brand new article: nobody has favorited it yet and the author
        // can't be following themselves
        favorited: false,
        favorites_count: 0,
        author: ProfileView::from_user(author, false),
    })
}

pub async fn get_by_slug(
    db: &DatabaseConnection,
    slug: &str,
    viewer: Option<UserId>,
) -> Result<ArticleView, ArticleError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(ArticleError::NotFound)?;

    let mut views = assemble_views(db, vec![article], viewer).await?;
    views.pop().ok_or(ArticleError::NotFound)
}

/// Applies a partial update to the article resolved by the slug.
/// Whether the caller is allowed to update it is the caller's check,
/// made against the article author before invoking this
pub async fn update(
    db: &DatabaseConnection,
    slug: &str,
    update: UpdateArticle,
    viewer: Option<UserId>,
) -> Result<ArticleView, ArticleError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(ArticleError::NotFound)?;

    // A changed title re-derives the slug under the same uniqueness
    // policy as creation, ignoring the article's own current slug
    let new_slug = match &update.title {
        Some(title) if *title != article.title => {
            Some(unique_slug(db, title, Some(article.id)).await?)
        }
        _ => None,
    };

    let article = db
        .transaction::<_, articles::Model, DbErr>(|txn| {
            Box::pin(async move {
                let article_id = article.id;

                let mut active = article.into_active_model();
                if let Some(title) = update.title {
                    active.title = Set(title);
                }
                if let Some(slug) = new_slug {
                    active.slug = Set(slug);
                }
                if let Some(description) = update.description {
                    active.description = Set(description);
                }
                if let Some(body) = update.body {
                    active.body = Set(body);
                }
                active.updated_at = Set(Utc::now());
                let article = active.update(txn).await?;

                // A provided tag list replaces the whole set
                if let Some(tag_list) = update.tag_list {
                    article_tags::Model::delete_for_article(txn, article_id).await?;
                    let tag_models = tags::Model::find_or_create_many(txn, &tag_list).await?;
                    article_tags::Model::link_many(
                        txn,
                        article_id,
                        tag_models.into_iter().map(|tag| tag.id).collect(),
                    )
                    .await?;
                }

                Ok(article)
            })
        })
        .await?;

    let mut views = assemble_views(db, vec![article], viewer).await?;
    views.pop().ok_or(ArticleError::NotFound)
}

/// Deletes the article along with its favorite and tag edges and its
/// comments, atomically
pub async fn delete(db: &DatabaseConnection, slug: &str) -> Result<(), ArticleError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(ArticleError::NotFound)?;

    db.transaction::<_, (), DbErr>(|txn| {
        Box::pin(async move {
            // Dependent edges go before the row itself
            article_tags::Model::delete_for_article(txn, article.id).await?;
            favorites::Model::delete_for_article(txn, article.id).await?;
            comments::Model::delete_for_article(txn, article.id).await?;
            articles::Entity::delete_by_id(article.id).exec(txn).await?;
            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Marks the article as favorited by the viewer. Favoriting an already
/// favorited article is a no-op, the refreshed view is returned either way
pub async fn favorite(
    db: &DatabaseConnection,
    slug: &str,
    viewer_id: UserId,
) -> Result<ArticleView, ArticleError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(ArticleError::NotFound)?;

    favorites::Model::add(db, viewer_id, article.id).await?;

    get_by_slug(db, slug, Some(viewer_id)).await
}

pub async fn unfavorite(
    db: &DatabaseConnection,
    slug: &str,
    viewer_id: UserId,
) -> Result<ArticleView, ArticleError> {
    let article = articles::Model::by_slug(db, slug)
        .await?
        .ok_or(ArticleError::NotFound)?;

    favorites::Model::remove(db, viewer_id, article.id).await?;

    get_by_slug(db, slug, Some(viewer_id)).await
}

/// Global article listing with the optional AND-combined filters,
/// newest first. Returns the page and the total count of matching
/// articles with the pagination ignored
pub async fn list(
    db: &DatabaseConnection,
    filter: ArticleFilter,
    limit: u64,
    offset: u64,
    viewer: Option<UserId>,
) -> Result<(Vec<ArticleView>, u64), ArticleError> {
    let mut query = articles::Entity::find();

    if let Some(tag) = &filter.tag {
        query = query
            .join(JoinType::InnerJoin, articles::Relation::ArticleTags.def())
            .join(JoinType::InnerJoin, article_tags::Relation::Tag.def())
            .filter(tags::Column::Tag.eq(tag));
    }

    if let Some(author) = &filter.author {
        query = query
            .join(JoinType::InnerJoin, articles::Relation::Author.def())
            .filter(users::Column::Username.eq(author));
    }

    if let Some(favorited) = &filter.favorited {
        // An unknown favoriting user matches nothing rather than erroring
        let user = match users::Model::by_username(db, favorited).await? {
            Some(user) => user,
            None => return Ok((Vec::new(), 0)),
        };

        query = query
            .join(JoinType::InnerJoin, articles::Relation::Favorites.def())
            .filter(favorites::Column::UserId.eq(user.id));
    }

    page(db, query, limit, offset, viewer).await
}

/// Personal feed: articles written by authors the viewer follows,
/// newest first
pub async fn feed(
    db: &DatabaseConnection,
    viewer_id: UserId,
    limit: u64,
    offset: u64,
) -> Result<(Vec<ArticleView>, u64), ArticleError> {
    let following = followers::Model::following_ids(db, viewer_id).await?;
    if following.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let query = articles::Entity::find().filter(articles::Column::AuthorId.is_in(following));
    page(db, query, limit, offset, Some(viewer_id)).await
}

async fn page(
    db: &DatabaseConnection,
    query: Select<articles::Entity>,
    limit: u64,
    offset: u64,
    viewer: Option<UserId>,
) -> Result<(Vec<ArticleView>, u64), ArticleError> {
    // Total matching rows with the pagination ignored
    let total = query.clone().count(db).await?;

    let page = query
        .order_by_desc(articles::Column::CreatedAt)
        .order_by_desc(articles::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?;

    let views = assemble_views(db, page, viewer).await?;
    Ok((views, total))
}

/// Enriches a page of article rows into full views with a fixed number
/// of bulk queries: authors, tag lists, favorite counts and the
/// viewer-relative flag sets
async fn assemble_views<C: ConnectionTrait>(
    db: &C,
    articles: Vec<articles::Model>,
    viewer: Option<UserId>,
) -> DbResult<Vec<ArticleView>> {
    if articles.is_empty() {
        return Ok(Vec::new());
    }

    let article_ids: Vec<ArticleId> = articles.iter().map(|article| article.id).collect();
    let mut author_ids: Vec<UserId> = articles.iter().map(|article| article.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<UserId, users::Model> = users::Model::by_ids(db, author_ids.clone())
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let mut tag_lists = article_tags::Model::tag_names_for_many(db, article_ids.clone()).await?;
    let counts = favorites::Model::counts_for(db, article_ids.clone()).await?;

    let (favorited, following) = match viewer {
        Some(viewer_id) => (
            favorites::Model::favorited_ids_among(db, viewer_id, article_ids).await?,
            followers::Model::following_ids_among(db, viewer_id, author_ids).await?,
        ),
        None => Default::default(),
    };

    Ok(articles
        .into_iter()
        .filter_map(|article| {
            let author = authors.get(&article.author_id)?;
            Some(ArticleView {
                tag_list: tag_lists.remove(&article.id).unwrap_or_default(),
                favorited: favorited.contains(&article.id),
                favorites_count: counts.get(&article.id).copied().unwrap_or_default(),
                author: ProfileView::from_user(author, following.contains(&article.author_id)),
                slug: article.slug,
                title: article.title,
                description: article.description,
                body: article.body,
                created_at: article.created_at,
                updated_at: article.updated_at,
            })
        })
        .collect())
}

/// Picks the slug for a title: the plain slug when free, otherwise the
/// slug with a random code appended. Checking for the prefix up front
/// avoids a retry loop on the unique constraint for the common case
async fn unique_slug<C: ConnectionTrait>(
    db: &C,
    title: &str,
    exclude: Option<ArticleId>,
) -> DbResult<String> {
    let base = slug_from_title(title);
    if articles::Model::slug_prefix_taken(db, &base, exclude).await? {
        Ok(slug_with_code(title))
    } else {
        Ok(base)
    }
}

#[cfg(test)]
mod test {
    use super::{
        ArticleError, ArticleFilter, CreateArticle, UpdateArticle, create, delete, favorite, feed,
        get_by_slug, list, unfavorite, update,
    };
    use crate::database::entity::{article_tags, favorites, followers, users};
    use crate::database::{DatabaseConnection, connect_test_database};

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

    fn test_article(title: &str, tags: &[&str]) -> CreateArticle {
        CreateArticle {
            title: title.to_string(),
            description: "A description".to_string(),
            body: "The body".to_string(),
            tag_list: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_article() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        let view = create(&db, &ann, test_article("Hello World", &["rust", "web"]))
            .await
            .unwrap();

        assert_eq!(view.slug, "hello-world");
        assert_eq!(view.tag_list, vec!["rust", "web"]);
        assert!(!view.favorited);
        assert_eq!(view.favorites_count, 0);
        assert_eq!(view.author.username, "ann");

        let fetched = get_by_slug(&db, "hello-world", None).await.unwrap();
        assert_eq!(fetched.title, "Hello World");
        assert_eq!(fetched.tag_list, vec!["rust", "web"]);
    }

    /// Duplicate tag names in the input collapse to a single link
    #[tokio::test]
    async fn test_create_duplicate_tags() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        let view = create(&db, &ann, test_article("Hello", &["rust", "rust"]))
            .await
            .unwrap();
        assert_eq!(view.tag_list, vec!["rust"]);
    }

    /// Two articles with the same title must get distinct slugs
    #[tokio::test]
    async fn test_slug_collision() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        let first = create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();
        let second = create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();

        assert_eq!(first.slug, "hello-world");
        assert_ne!(second.slug, first.slug);
        assert!(second.slug.starts_with("hello-world-"));
    }

    #[tokio::test]
    async fn test_get_unknown_slug() {
        let db = connect_test_database().await;

        assert!(matches!(
            get_by_slug(&db, "missing", None).await.unwrap_err(),
            ArticleError::NotFound
        ));
    }

    /// Favoriting twice keeps the count at one and doesn't error
    #[tokio::test]
    async fn test_favorite_idempotent() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;

        create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();

        let view = favorite(&db, "hello-world", bob.id).await.unwrap();
        assert!(view.favorited);
        assert_eq!(view.favorites_count, 1);

        let view = favorite(&db, "hello-world", bob.id).await.unwrap();
        assert_eq!(view.favorites_count, 1);

        let view = unfavorite(&db, "hello-world", bob.id).await.unwrap();
        assert!(!view.favorited);
        assert_eq!(view.favorites_count, 0);

        // Unfavoriting again stays a no-op
        let view = unfavorite(&db, "hello-world", bob.id).await.unwrap();
        assert_eq!(view.favorites_count, 0);
    }

    /// The favorited flag is viewer-relative
    #[tokio::test]
    async fn test_favorited_flag_per_viewer() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;

        create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();
        favorite(&db, "hello-world", bob.id).await.unwrap();

        let for_bob = get_by_slug(&db, "hello-world", Some(bob.id)).await.unwrap();
        assert!(for_bob.favorited);

        let for_ann = get_by_slug(&db, "hello-world", Some(ann.id)).await.unwrap();
        assert!(!for_ann.favorited);
        assert_eq!(for_ann.favorites_count, 1);

        let anonymous = get_by_slug(&db, "hello-world", None).await.unwrap();
        assert!(!anonymous.favorited);
    }

    /// A provided tag list replaces the prior set entirely
    #[tokio::test]
    async fn test_update_replaces_tags() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        create(&db, &ann, test_article("Hello World", &["old", "stale"]))
            .await
            .unwrap();

        let view = update(
            &db,
            "hello-world",
            UpdateArticle {
                tag_list: Some(vec!["a".to_string(), "b".to_string()]),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(view.tag_list, vec!["a", "b"]);

        let fetched = get_by_slug(&db, "hello-world", None).await.unwrap();
        assert_eq!(fetched.tag_list, vec!["a", "b"]);
    }

    /// A changed title re-derives the slug, an unchanged one keeps it
    #[tokio::test]
    async fn test_update_title_changes_slug() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();

        let view = update(
            &db,
            "hello-world",
            UpdateArticle {
                title: Some("Goodbye World".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(view.slug, "goodbye-world");

        let view = update(
            &db,
            "goodbye-world",
            UpdateArticle {
                body: Some("New body".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(view.slug, "goodbye-world");
        assert_eq!(view.body, "New body");
    }

    /// Deletion removes the article and its favorite and tag edges
    #[tokio::test]
    async fn test_delete_cascades() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;

        let view = create(&db, &ann, test_article("Hello World", &["rust"]))
            .await
            .unwrap();
        favorite(&db, "hello-world", bob.id).await.unwrap();

        let article = crate::database::entity::articles::Model::by_slug(&db, &view.slug)
            .await
            .unwrap()
            .unwrap();

        delete(&db, "hello-world").await.unwrap();

        assert!(matches!(
            get_by_slug(&db, "hello-world", None).await.unwrap_err(),
            ArticleError::NotFound
        ));
        assert!(
            !favorites::Model::exists(&db, bob.id, article.id)
                .await
                .unwrap()
        );
        assert!(
            article_tags::Model::tag_names_for(&db, article.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;

        create(&db, &ann, test_article("Rust Intro", &["rust"]))
            .await
            .unwrap();
        create(&db, &ann, test_article("Web Intro", &["web"]))
            .await
            .unwrap();
        create(&db, &bob, test_article("Bob Writes", &["rust"]))
            .await
            .unwrap();

        let (views, total) = list(&db, ArticleFilter::default(), 20, 0, None)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(views.len(), 3);

        let (views, total) = list(
            &db,
            ArticleFilter {
                tag: Some("rust".to_string()),
                ..Default::default()
            },
            20,
            0,
            None,
        )
        .await
        .unwrap();
        assert_eq!(total, 2);
        assert!(views.iter().all(|view| view.tag_list.contains(&"rust".to_string())));

        let (views, total) = list(
            &db,
            ArticleFilter {
                tag: Some("rust".to_string()),
                author: Some("ann".to_string()),
                ..Default::default()
            },
            20,
            0,
            None,
        )
        .await
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(views[0].title, "Rust Intro");
    }

    #[tokio::test]
    async fn test_list_favorited_filter() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;

        create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();
        create(&db, &ann, test_article("Other", &[]))
            .await
            .unwrap();
        favorite(&db, "hello-world", bob.id).await.unwrap();

        let (views, total) = list(
            &db,
            ArticleFilter {
                favorited: Some("bob".to_string()),
                ..Default::default()
            },
            20,
            0,
            None,
        )
        .await
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(views[0].slug, "hello-world");
    }

    /// An unknown favoriting user yields an empty page, not an error
    #[tokio::test]
    async fn test_list_favorited_unknown_user() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        create(&db, &ann, test_article("Hello World", &[]))
            .await
            .unwrap();

        let (views, total) = list(
            &db,
            ArticleFilter {
                favorited: Some("nobody".to_string()),
                ..Default::default()
            },
            20,
            0,
            None,
        )
        .await
        .unwrap();
        assert!(views.is_empty());
        assert_eq!(total, 0);
    }

    /// The total count reflects the filter with the pagination ignored
    #[tokio::test]
    async fn test_list_pagination() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;

        for index in 0..5 {
            create(&db, &ann, test_article(&format!("Article {index}"), &[]))
                .await
                .unwrap();
        }

        let (views, total) = list(&db, ArticleFilter::default(), 2, 0, None)
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(total, 5);

        let (views, total) = list(&db, ArticleFilter::default(), 2, 4, None)
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_feed_followed_authors_only() {
        let db = connect_test_database().await;
        let ann = test_user(&db, "ann").await;
        let bob = test_user(&db, "bob").await;
        let cleo = test_user(&db, "cleo").await;

        create(&db, &bob, test_article("From Bob", &[]))
            .await
            .unwrap();
        create(&db, &cleo, test_article("From Cleo", &[]))
            .await
            .unwrap();

        // Nothing followed yet, the feed is empty
        let (views, total) = feed(&db, ann.id, 20, 0).await.unwrap();
        assert!(views.is_empty());
        assert_eq!(total, 0);

        followers::Model::create(&db, ann.id, bob.id).await.unwrap();

        let (views, total) = feed(&db, ann.id, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(views[0].title, "From Bob");
        assert!(views[0].author.following);
    }
}
