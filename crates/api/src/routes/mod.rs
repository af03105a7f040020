pub mod blogs;
pub mod children;
pub mod forms;
pub mod health;
pub mod offices;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(forms::routes())
        .merge(children::routes())
        .merge(blogs::routes())
        .merge(offices::routes())
        .with_state(state)
}
