use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

use super::articles::ArticleId;
use super::users::UserId;

pub type CommentId = u32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub article_id: u32,
    pub author_id: u32,
    pub body: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::articles::Entity",
        from = "Column::ArticleId",
        to = "super::articles::Column::Id"
    )]
    Article,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Author,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        article_id: ArticleId,
        author_id: UserId,
        body: String,
    ) -> DbResult<Self> {
        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            article_id: Set(article_id),
            author_id: Set(author_id),
            body: Set(body),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    pub async fn by_id<C: ConnectionTrait>(db: &C, id: CommentId) -> DbResult<Option<Self>> {
        Entity::find_by_id(id).one(db).await
    }

    /// Comments of an article in insertion order, oldest first
    pub async fn list_for_article<C: ConnectionTrait>(
        db: &C,
        article_id: ArticleId,
    ) -> DbResult<Vec<Self>> {
        Entity::find()
            .filter(Column::ArticleId.eq(article_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: CommentId) -> DbResult<()> {
        Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }

    pub async fn delete_for_article<C: ConnectionTrait>(
        db: &C,
        article_id: ArticleId,
    ) -> DbResult<()> {
        Entity::delete_many()
            .filter(Column::ArticleId.eq(article_id))
            .exec(db)
            .await?;
        Ok(())
    }
}

impl Related<super::articles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
