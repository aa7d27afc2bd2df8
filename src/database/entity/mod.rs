pub mod article_tags;
pub mod articles;
pub mod comments;
pub mod favorites;
pub mod followers;
pub mod tags;
pub mod users;

pub type User = users::Model;
pub type UserEntity = users::Entity;

pub type Follower = followers::Model;
pub type FollowerEntity = followers::Entity;

pub type Article = articles::Model;
pub type ArticleEntity = articles::Entity;

pub type Tag = tags::Model;
pub type TagEntity = tags::Entity;

pub type ArticleTag = article_tags::Model;
pub type ArticleTagEntity = article_tags::Entity;

pub type Favorite = favorites::Model;
pub type FavoriteEntity = favorites::Entity;

pub type Comment = comments::Model;
pub type CommentEntity = comments::Entity;
