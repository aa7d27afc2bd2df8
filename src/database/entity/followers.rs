use std::collections::HashSet;

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::QuerySelect;

use super::users::UserId;

/// Directed follower edge: `follower_id` follows `following_id`
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "followers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub follower_id: u32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub following_id: u32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FollowerId",
        to = "super::users::Column::Id"
    )]
    Follower,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FollowingId",
        to = "super::users::Column::Id"
    )]
    Following,
}

impl Model {
    pub async fn exists<C: ConnectionTrait>(
        db: &C,
        follower_id: UserId,
        following_id: UserId,
    ) -> DbResult<bool> {
        Entity::find_by_id((follower_id, following_id))
            .one(db)
            .await
            .map(|edge| edge.is_some())
    }

    /// Inserts the follower edge. Racing inserts of the same edge
    /// collapse into one row rather than raising a key violation
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        follower_id: UserId,
        following_id: UserId,
    ) -> DbResult<()> {
        Entity::insert(ActiveModel {
            follower_id: Set(follower_id),
            following_id: Set(following_id),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([Column::FollowerId, Column::FollowingId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        follower_id: UserId,
        following_id: UserId,
    ) -> DbResult<()> {
        Entity::delete_many()
            .filter(Column::FollowerId.eq(follower_id))
            .filter(Column::FollowingId.eq(following_id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// All users the follower is following
    pub async fn following_ids<C: ConnectionTrait>(
        db: &C,
        follower_id: UserId,
    ) -> DbResult<Vec<UserId>> {
        Entity::find()
            .select_only()
            .column(Column::FollowingId)
            .filter(Column::FollowerId.eq(follower_id))
            .into_tuple()
            .all(db)
            .await
    }

    /// Which of the candidate users the follower is following, bulk
    /// lookup used when assembling article and comment pages
    pub async fn following_ids_among<C: ConnectionTrait>(
        db: &C,
        follower_id: UserId,
        candidate_ids: Vec<UserId>,
    ) -> DbResult<HashSet<UserId>> {
        if candidate_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<UserId> = Entity::find()
            .select_only()
            .column(Column::FollowingId)
            .filter(Column::FollowerId.eq(follower_id))
            .filter(Column::FollowingId.is_in(candidate_ids))
            .into_tuple()
            .all(db)
            .await?;

        Ok(ids.into_iter().collect())
    }
}

impl ActiveModelBehavior for ActiveModel {}
