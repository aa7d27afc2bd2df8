use std::collections::HashSet;

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::QueryOrder;

pub type TagId = u32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub tag: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article_tags::Entity")]
    ArticleTags,
}

impl Model {
    /// Resolves every name to a tag row, creating the missing ones.
    /// Duplicate names in the input collapse to one tag. Insertion is
    /// insert-or-ignore so a concurrent creation of the same tag name
    /// cannot raise a uniqueness violation
    pub async fn find_or_create_many<C: ConnectionTrait>(
        db: &C,
        names: &[String],
    ) -> DbResult<Vec<Self>> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .collect();

        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        Entity::insert_many(unique.iter().map(|name| ActiveModel {
            id: NotSet,
            tag: Set((*name).clone()),
            created_at: Set(now),
        }))
        .on_conflict(OnConflict::column(Column::Tag).do_nothing().to_owned())
        .do_nothing()
        .exec(db)
        .await?;

        Entity::find()
            .filter(Column::Tag.is_in(unique.iter().map(|name| name.as_str())))
            .all(db)
            .await
    }

    /// All known tags, most recently created first. The id tiebreak
    /// keeps the order stable for rows sharing a timestamp
    pub async fn list<C: ConnectionTrait>(db: &C) -> DbResult<Vec<Self>> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }
}

impl Related<super::article_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArticleTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
