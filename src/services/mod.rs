pub mod articles;
pub mod comments;
pub mod profiles;
pub mod tokens;
pub mod users;
