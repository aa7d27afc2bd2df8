use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use super::users::UserId;

pub type ArticleId = u32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub author_id: u32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::article_tags::Entity")]
    ArticleTags,
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        author_id: UserId,
        slug: String,
        title: String,
        description: String,
        body: String,
    ) -> DbResult<Self> {
        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            author_id: Set(author_id),
            slug: Set(slug),
            title: Set(title),
            description: Set(description),
            body: Set(body),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    pub async fn by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> DbResult<Option<Self>> {
        Entity::find().filter(Column::Slug.eq(slug)).one(db).await
    }

    /// Whether any article other than `exclude` already owns a slug
    /// beginning with the base slug. A positive answer forces slug
    /// generation to append a disambiguating code
    pub async fn slug_prefix_taken<C: ConnectionTrait>(
        db: &C,
        base_slug: &str,
        exclude: Option<ArticleId>,
    ) -> DbResult<bool> {
        let mut query = Entity::find().filter(Column::Slug.starts_with(base_slug));

        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }

        query.one(db).await.map(|article| article.is_some())
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::article_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArticleTags.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
