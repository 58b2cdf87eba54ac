use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::conversation::{keyboards, messages};
use crate::errors::AppError;
use crate::models::user::UserId;
use crate::state::AppState;

pub const SECRET_HEADER: &str = "x-payment-secret";

#[derive(Debug, Deserialize)]
pub struct PaymentConfirmation {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmationResponse {
    pub matched_users: Vec<UserId>,
}

/// POST /api/v1/payments/confirm
///
/// Called by the payment processor once money tagged with a phone number
/// arrives. Marks matching users as paid and nudges them to continue.
pub async fn handle_confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PaymentConfirmation>,
) -> Result<Json<PaymentConfirmationResponse>, AppError> {
    if let Some(secret) = &state.config.payment_webhook_secret {
        let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    let matched_users = state.conversation.confirm_payment(&req.phone).await?;
    if matched_users.is_empty() {
        return Err(AppError::NotFound(format!(
            "No user registered phone {}",
            req.phone
        )));
    }

    let controls = keyboards::check_payment();
    for user_id in &matched_users {
        // Payment is already recorded; a failed notification is not fatal.
        if let Err(e) = state
            .gateway
            .send_message(user_id, messages::PAYMENT_RECEIVED, Some(&controls))
            .await
        {
            error!("Payment notification to user {user_id} failed: {e}");
        }
    }

    info!("Payment webhook confirmed {} user(s)", matched_users.len());
    Ok(Json(PaymentConfirmationResponse { matched_users }))
}
