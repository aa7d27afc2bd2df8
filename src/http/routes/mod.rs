use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

mod article;
mod comment;
mod profile;
mod tag;
mod user;

pub fn router() -> Router {
    Router::new()
        .route("/api/users", post(user::register))
        .route("/api/users/login", post(user::login))
        .route("/api/user", get(user::current_user).put(user::update_user))
        .route("/api/profiles/{username}", get(profile::get_profile))
        .route(
            "/api/profiles/{username}/follow",
            post(profile::follow_user).delete(profile::unfollow_user),
        )
        .route(
            "/api/articles",
            get(article::list_articles).post(article::create_article),
        )
        .route("/api/articles/feed", get(article::feed_articles))
        .route(
            "/api/articles/{slug}",
            get(article::get_article)
                .put(article::update_article)
                .delete(article::delete_article),
        )
        .route(
            "/api/articles/{slug}/favorite",
            post(article::favorite_article).delete(article::unfavorite_article),
        )
        .route(
            "/api/articles/{slug}/comments",
            get(comment::get_comments).post(comment::create_comment),
        )
        .route(
            "/api/articles/{slug}/comments/{id}",
            delete(comment::delete_comment),
        )
        .route("/api/tags", get(tag::get_tags))
        .layer(TraceLayer::new_for_http())
}
