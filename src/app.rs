use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/refuse", post(handlers::refuse))
        .route("/buy", post(handlers::buy))
        .route("/settings", post(handlers::open_settings))
        .route("/settings/goal", post(handlers::save_goal))
        .route("/mode/:mode", post(handlers::select_mode))
        .route("/reset", post(handlers::reset))
        .route("/reset/confirm", post(handlers::confirm_reset))
        .route("/back", post(handlers::show_main))
        .route("/api/state", get(handlers::get_state))
        .route("/api/action", post(handlers::action))
        .route("/electricity", get(handlers::electricity_page))
        .route("/electricity/save", post(handlers::save_electricity_form))
        .route("/api/electricity", get(handlers::get_electricity))
        .route("/api/electricity/save", post(handlers::save_electricity))
        .route("/api/electricity/:month", put(handlers::set_month))
        .with_state(state)
}
