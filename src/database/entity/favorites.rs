use std::collections::{HashMap, HashSet};

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{PaginatorTrait, QuerySelect};

use super::articles::ArticleId;
use super::users::UserId;

/// Favorite edge: `user_id` has favorited `article_id`
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: u32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub article_id: u32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::articles::Entity",
        from = "Column::ArticleId",
        to = "super::articles::Column::Id"
    )]
    Article,
}

impl Model {
    pub async fn exists<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        article_id: ArticleId,
    ) -> DbResult<bool> {
        Entity::find_by_id((user_id, article_id))
            .one(db)
            .await
            .map(|edge| edge.is_some())
    }

    /// Favoriting an already favorited article is a no-op: the edge is
    /// inserted with insert-or-ignore semantics so concurrent calls on
    /// the same (user, article) pair leave exactly one row
    pub async fn add<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        article_id: ArticleId,
    ) -> DbResult<()> {
        Entity::insert(ActiveModel {
            user_id: Set(user_id),
            article_id: Set(article_id),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::ArticleId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
        Ok(())
    }

    /// Unfavoriting an article that isn't favorited is a no-op
    pub async fn remove<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        article_id: ArticleId,
    ) -> DbResult<()> {
        Entity::delete_many()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ArticleId.eq(article_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn count<C: ConnectionTrait>(db: &C, article_id: ArticleId) -> DbResult<u64> {
        Entity::find()
            .filter(Column::ArticleId.eq(article_id))
            .count(db)
            .await
    }

    /// Favorite counts for a page of articles keyed by article id.
    /// Articles with no favorites are absent from the map
    pub async fn counts_for<C: ConnectionTrait>(
        db: &C,
        article_ids: Vec<ArticleId>,
    ) -> DbResult<HashMap<ArticleId, u64>> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(ArticleId, i64)> = Entity::find()
            .select_only()
            .column(Column::ArticleId)
            .column_as(Column::ArticleId.count(), "count")
            .filter(Column::ArticleId.is_in(article_ids))
            .group_by(Column::ArticleId)
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(article_id, count)| (article_id, count as u64))
            .collect())
    }

    /// Which of the candidate articles the user has favorited
    pub async fn favorited_ids_among<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        article_ids: Vec<ArticleId>,
    ) -> DbResult<HashSet<ArticleId>> {
        if article_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<ArticleId> = Entity::find()
            .select_only()
            .column(Column::ArticleId)
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ArticleId.is_in(article_ids))
            .into_tuple()
            .all(db)
            .await?;

        Ok(ids.into_iter().collect())
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
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
