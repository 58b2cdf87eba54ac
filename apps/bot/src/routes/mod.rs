pub mod health;
pub mod payments;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/payments/confirm",
            post(payments::handle_confirm_payment),
        )
        .with_state(state)
}
