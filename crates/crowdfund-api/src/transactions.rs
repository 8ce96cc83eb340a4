use axum::{extract::State, http::StatusCode, response::Response};
use tracing::info;

use crowdfund_db::models::TransactionRow;
use crowdfund_types::api::{
    CampaignTransactionResponse, CreateTransactionRequest, TransactionCampaign, TransactionNotification,
    TransactionResponse, UserTransactionResponse,
};

use crate::envelope::{ApiJson, ApiPath, ok, respond};
use crate::error::{ApiError, OrEnvelope};
use crate::middleware::CurrentUser;
use crate::service::{blocking, transactions};
use crate::state::AppState;

fn transaction_response(t: TransactionRow) -> TransactionResponse {
    TransactionResponse {
        id: t.id,
        campaign_id: t.campaign_id,
        user_id: t.user_id,
        amount: t.amount,
        status: t.status,
        code: t.code,
        payment_url: t.payment_url.unwrap_or_default(),
    }
}

/// GET /api/v1/campaigns/{id}/transactions. Owner only.
pub async fn campaign_transactions(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<i64>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || transactions::for_campaign(&db, campaign_id, user.id))
        .await
        .or_envelope("Failed to get campaign's transactions")?;

    let data: Vec<CampaignTransactionResponse> = rows
        .into_iter()
        .map(|t| CampaignTransactionResponse {
            id: t.id,
            name: t.user_name,
            amount: t.amount,
            created_at: t.created_at,
        })
        .collect();
    Ok(ok("Campaign's transactions", data))
}

/// GET /api/v1/transactions
pub async fn user_transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || transactions::for_user(&db, user.id))
        .await
        .or_envelope("Failed to get user's transactions")?;

    let data: Vec<UserTransactionResponse> = rows
        .into_iter()
        .map(|t| UserTransactionResponse {
            id: t.id,
            amount: t.amount,
            status: t.status,
            created_at: t.created_at,
            campaign: TransactionCampaign {
                name: t.campaign_name,
                image_url: t.campaign_image.unwrap_or_default(),
            },
        })
        .collect();
    Ok(ok("User's transactions", data))
}

/// POST /api/v1/transactions
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateTransactionRequest>,
) -> Result<Response, ApiError> {
    let tx = transactions::create(
        state.db.clone(),
        state.payments.as_ref(),
        &user,
        req.campaign_id,
        req.amount,
    )
    .await
    .or_envelope("Failed to create transaction")?;

    info!("User {} opened transaction {}", user.id, tx.id);
    Ok(respond(
        StatusCode::CREATED,
        "Success to create transaction",
        transaction_response(tx),
    ))
}

/// POST /api/v1/transactions/notification. Called by the payment gateway.
pub async fn notification(
    State(state): State<AppState>,
    ApiJson(notification): ApiJson<TransactionNotification>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let tx = blocking(move || transactions::process_notification(&db, &notification))
        .await
        .or_envelope("Failed to process notification")?;
    Ok(ok("Notification processed", transaction_response(tx)))
}
