pub mod auth;
pub mod fighters;
pub mod subscriptions;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/fighters", fighters::router())
        .nest("/subscriptions", subscriptions::router())
}
