use crate::webserver::state::AppState;
use axum::Router;
use std::sync::Arc;

pub mod auth;
pub mod campaigns;
pub mod status;
pub mod sync;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(auth::routes())
        .merge(sync::routes())
        .merge(campaigns::routes())
}
