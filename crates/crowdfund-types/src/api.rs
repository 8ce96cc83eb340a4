use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PaymentStatus;

// -- JWT Claims --

/// Claims carried by every API bearer token. Decoding fails closed: a token
/// whose `user_id` is missing or not an integer is rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: usize,
}

// -- Envelope --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Uniform body of every JSON API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub code: u16,
    pub status: EnvelopeStatus,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, code: u16, data: T) -> Self {
        Self {
            message: message.into(),
            code,
            status: EnvelopeStatus::Success,
            data,
        }
    }

    pub fn error(message: impl Into<String>, code: u16, data: T) -> Self {
        Self {
            message: message.into(),
            code,
            status: EnvelopeStatus::Error,
            data,
        }
    }
}

/// Payload of a validation failure envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub token: String,
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailAvailability {
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResult {
    pub is_uploaded: bool,
}

// -- Campaigns --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignRequest {
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub goal_amount: i64,
    pub perks: String,
}

#[derive(Debug, Deserialize)]
pub struct CampaignListQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub image_url: String,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDetailResponse {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub image_url: String,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub backer_count: i64,
    pub user_id: i64,
    pub slug: String,
    pub perks: Vec<String>,
    pub user: CampaignOwner,
    pub images: Vec<CampaignImageResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignOwner {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignImageResponse {
    pub image_url: String,
    pub is_primary: bool,
}

// -- Transactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTransactionRequest {
    pub amount: i64,
    pub campaign_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub status: PaymentStatus,
    pub code: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignTransactionResponse {
    pub id: i64,
    pub name: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTransactionResponse {
    pub id: i64,
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub campaign: TransactionCampaign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCampaign {
    pub name: String,
    pub image_url: String,
}

/// Asynchronous status callback posted by the payment gateway. Gateways send
/// many more fields; only the ones that drive the status are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionNotification {
    pub transaction_status: String,
    pub order_id: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub fraud_status: String,
}
