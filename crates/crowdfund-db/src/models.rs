//! Database row types. These map directly to SQLite rows and are kept apart
//! from the crowdfund-types wire models so the DB layer stays independent.

use chrono::{DateTime, Utc};
use crowdfund_types::models::{PaymentStatus, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_file_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub occupation: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

pub struct UserChanges<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub occupation: &'a str,
}

/// A campaign joined with the file name of its primary image, if any.
#[derive(Debug, Clone)]
pub struct CampaignRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub perks: String,
    pub backer_count: i64,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub slug: String,
    pub primary_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewCampaign<'a> {
    pub user_id: i64,
    pub name: &'a str,
    pub short_description: &'a str,
    pub description: &'a str,
    pub perks: &'a str,
    pub goal_amount: i64,
    pub slug: &'a str,
}

pub struct CampaignChanges<'a> {
    pub name: &'a str,
    pub short_description: &'a str,
    pub description: &'a str,
    pub perks: &'a str,
    pub goal_amount: i64,
}

#[derive(Debug, Clone)]
pub struct CampaignImageRow {
    pub id: i64,
    pub campaign_id: i64,
    pub file_name: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// A transaction joined with the funder's name and the campaign's name and
/// primary image.
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub status: PaymentStatus,
    pub code: String,
    pub payment_url: Option<String>,
    pub user_name: String,
    pub campaign_name: String,
    pub campaign_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewTransaction<'a> {
    pub campaign_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub code: &'a str,
}
