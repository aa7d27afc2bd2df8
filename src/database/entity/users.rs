use crate::database::DbResult;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

pub type UserId = u32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u32,
    pub username: String,
    pub email: String,
    /// Argon2 hash of the account password, plaintext is never stored
    pub password: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::articles::Entity")]
    Articles,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        username: String,
        email: String,
        password: String,
        image_url: Option<String>,
    ) -> DbResult<Self> {
        ActiveModel {
            id: NotSet,
            username: Set(username),
            email: Set(email),
            password: Set(password),
            bio: Set(String::new()),
            image_url: Set(image_url),
            created_at: Set(Utc::now()),
            updated_at: NotSet,
        }
        .insert(db)
        .await
    }

    pub async fn by_id<C: ConnectionTrait>(db: &C, id: UserId) -> DbResult<Option<Self>> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn by_username<C: ConnectionTrait>(db: &C, username: &str) -> DbResult<Option<Self>> {
        Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await
    }

    pub async fn by_email<C: ConnectionTrait>(db: &C, email: &str) -> DbResult<Option<Self>> {
        Entity::find()
            .filter(Column::Email.eq(email))
            .one(db)
            .await
    }

    /// Bulk lookup used when assembling article and comment pages
    pub async fn by_ids<C: ConnectionTrait>(db: &C, ids: Vec<UserId>) -> DbResult<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Entity::find().filter(Column::Id.is_in(ids)).all(db).await
    }
}

impl Related<super::articles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Articles.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
