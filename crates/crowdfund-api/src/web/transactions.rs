use axum::{extract::State, response::Response};

use super::campaigns::TransactionView;
use super::{OrPage, page};
use crate::service::{blocking, transactions};
use crate::state::AppState;

/// GET /transactions
pub async fn index(State(state): State<AppState>) -> Result<Response, Response> {
    let db = state.db.clone();
    let rows = blocking(move || transactions::all(&db)).await.or_page(&state)?;
    let transactions: Vec<TransactionView> = rows.into_iter().map(TransactionView::from).collect();
    Ok(page(&state, "transaction_index.html", serde_json::json!({ "transactions": transactions })))
}
