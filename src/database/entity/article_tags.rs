use std::collections::HashMap;

use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;

use super::articles::ArticleId;
use super::tags::TagId;

/// Junction row linking an article to one of its tags
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "article_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub article_id: u32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: u32,
    pub created_at: DateTimeUtc,
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
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id"
    )]
    Tag,
}

impl Model {
    /// Links the article to every provided tag. Duplicate links are
    /// ignored rather than raising a key violation
    pub async fn link_many<C: ConnectionTrait>(
        db: &C,
        article_id: ArticleId,
        tag_ids: Vec<TagId>,
    ) -> DbResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        Entity::insert_many(tag_ids.into_iter().map(|tag_id| ActiveModel {
            article_id: Set(article_id),
            tag_id: Set(tag_id),
            created_at: Set(now),
        }))
        .on_conflict(
            OnConflict::columns([Column::ArticleId, Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
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

    /// Tag names of a single article, name-ascending
    pub async fn tag_names_for<C: ConnectionTrait>(
        db: &C,
        article_id: ArticleId,
    ) -> DbResult<Vec<String>> {
        let rows = Entity::find()
            .filter(Column::ArticleId.eq(article_id))
            .find_also_related(super::tags::Entity)
            .all(db)
            .await?;

        let mut names: Vec<String> = rows
            .into_iter()
            .filter_map(|(_, tag)| tag.map(|tag| tag.tag))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Tag names for a page of articles keyed by article id, each list
    /// name-ascending
    pub async fn tag_names_for_many<C: ConnectionTrait>(
        db: &C,
        article_ids: Vec<ArticleId>,
    ) -> DbResult<HashMap<ArticleId, Vec<String>>> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Entity::find()
            .filter(Column::ArticleId.is_in(article_ids))
            .find_also_related(super::tags::Entity)
            .all(db)
            .await?;

        let mut names: HashMap<ArticleId, Vec<String>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                names.entry(link.article_id).or_default().push(tag.tag);
            }
        }
        for list in names.values_mut() {
            list.sort();
        }
        Ok(names)
    }
}

impl Related<super::articles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
