use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crowdfund_db::Database;
use crowdfund_db::models::{NewTransaction, TransactionRow, UserRow};
use crowdfund_types::api::TransactionNotification;
use crowdfund_types::models::PaymentStatus;

use super::{blocking, campaigns};
use crate::error::ServiceError;
use crate::payment::{PaymentGateway, PaymentRequest};

pub fn get(db: &Database, id: i64) -> Result<TransactionRow, ServiceError> {
    db.get_transaction(id)?.ok_or(ServiceError::NotFound)
}

/// Transactions of a campaign, visible to its owner only.
pub fn for_campaign(db: &Database, campaign_id: i64, actor_id: i64) -> Result<Vec<TransactionRow>, ServiceError> {
    campaigns::ensure_owner(db, campaign_id, actor_id)?;
    Ok(db.list_transactions_by_campaign(campaign_id)?)
}

pub fn for_user(db: &Database, user_id: i64) -> Result<Vec<TransactionRow>, ServiceError> {
    Ok(db.list_transactions_by_user(user_id)?)
}

pub fn all(db: &Database) -> Result<Vec<TransactionRow>, ServiceError> {
    Ok(db.list_transactions()?)
}

/// Record a pending transaction, register it with the payment gateway and
/// store the returned payment URL.
pub async fn create(
    db: Arc<Database>,
    payments: &dyn PaymentGateway,
    funder: &UserRow,
    campaign_id: i64,
    amount: i64,
) -> Result<TransactionRow, ServiceError> {
    if amount <= 0 {
        return Err(ServiceError::invalid("amount must be greater than zero"));
    }

    let conn = db.clone();
    let funder_id = funder.id;
    let pending = blocking(move || {
        campaigns::get(&conn, campaign_id)?;
        let code = format!("ORDER-{}", Uuid::new_v4().simple());
        let id = conn.create_transaction(&NewTransaction {
            campaign_id,
            user_id: funder_id,
            amount,
            code: &code,
        })?;
        get(&conn, id)
    })
    .await?;

    let request = PaymentRequest {
        order_id: pending.id.to_string(),
        amount,
        customer_name: funder.name.clone(),
        customer_email: funder.email.clone(),
    };
    let payment_url = payments.payment_url(&request).await.map_err(|e| {
        warn!("Transaction {} left without payment URL", pending.id);
        ServiceError::Internal(e)
    })?;

    let id = pending.id;
    blocking(move || {
        db.set_transaction_payment_url(id, &payment_url)?;
        get(&db, id)
    })
    .await
}

/// Map a gateway notification onto our payment status. `None` means the
/// notification does not move the transaction.
pub fn status_for(notification: &TransactionNotification) -> Option<PaymentStatus> {
    match notification.transaction_status.as_str() {
        "capture"
            if notification.payment_type == "credit_card" && notification.fraud_status == "accept" =>
        {
            Some(PaymentStatus::Paid)
        }
        "settlement" => Some(PaymentStatus::Paid),
        "deny" => Some(PaymentStatus::Failed),
        "expire" | "cancel" => Some(PaymentStatus::Canceled),
        _ => None,
    }
}

/// Apply a gateway notification. Status change and campaign total
/// recomputation commit together.
pub fn process_notification(
    db: &Database,
    notification: &TransactionNotification,
) -> Result<TransactionRow, ServiceError> {
    let id: i64 = notification
        .order_id
        .trim()
        .parse()
        .map_err(|_| ServiceError::invalid("order_id is not a transaction id"))?;

    match status_for(notification) {
        Some(status) => {
            let row = db.apply_payment_status(id, status)?.ok_or(ServiceError::NotFound)?;
            info!("Transaction {} is now {}", id, status);
            Ok(row)
        }
        None => {
            info!(
                "Transaction {} unchanged by notification status '{}'",
                id, notification.transaction_status
            );
            get(db, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::campaigns::CampaignInput;
    use crowdfund_db::models::NewUser;
    use crowdfund_types::models::Role;

    struct FixedGateway;

    #[async_trait::async_trait]
    impl PaymentGateway for FixedGateway {
        async fn payment_url(&self, request: &PaymentRequest) -> anyhow::Result<String> {
            Ok(format!("https://pay.example/{}", request.order_id))
        }
    }

    struct DownGateway;

    #[async_trait::async_trait]
    impl PaymentGateway for DownGateway {
        async fn payment_url(&self, _request: &PaymentRequest) -> anyhow::Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    fn notification(status: &str, order_id: i64) -> TransactionNotification {
        TransactionNotification {
            transaction_status: status.to_string(),
            order_id: order_id.to_string(),
            ..Default::default()
        }
    }

    fn seed(db: &Database) -> (UserRow, i64) {
        let id = db
            .create_user(&NewUser {
                name: "Funder",
                occupation: "",
                email: "funder@example.com",
                password_hash: "hash",
                role: Role::User,
            })
            .unwrap();
        let funder = db.get_user_by_id(id).unwrap().unwrap();
        let campaign = campaigns::create(
            db,
            id,
            &CampaignInput {
                name: "Park".to_string(),
                short_description: "s".to_string(),
                description: "d".to_string(),
                goal_amount: 1_000,
                perks: "p".to_string(),
            },
        )
        .unwrap();
        (funder, campaign.id)
    }

    #[test]
    fn notification_status_mapping() {
        let mut capture = notification("capture", 1);
        assert_eq!(status_for(&capture), None);
        capture.payment_type = "credit_card".to_string();
        capture.fraud_status = "accept".to_string();
        assert_eq!(status_for(&capture), Some(PaymentStatus::Paid));

        assert_eq!(status_for(&notification("settlement", 1)), Some(PaymentStatus::Paid));
        assert_eq!(status_for(&notification("deny", 1)), Some(PaymentStatus::Failed));
        assert_eq!(status_for(&notification("expire", 1)), Some(PaymentStatus::Canceled));
        assert_eq!(status_for(&notification("cancel", 1)), Some(PaymentStatus::Canceled));
        assert_eq!(status_for(&notification("pending", 1)), None);
    }

    #[tokio::test]
    async fn create_stores_gateway_url() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (funder, campaign_id) = seed(&db);

        let tx = create(db.clone(), &FixedGateway, &funder, campaign_id, 250).await.unwrap();
        assert_eq!(tx.status, PaymentStatus::Pending);
        assert!(tx.code.starts_with("ORDER-"));
        assert_eq!(tx.payment_url, Some(format!("https://pay.example/{}", tx.id)));
    }

    #[tokio::test]
    async fn create_rejects_bad_input_and_surfaces_gateway_failure() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (funder, campaign_id) = seed(&db);

        assert!(matches!(
            create(db.clone(), &FixedGateway, &funder, campaign_id, 0).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            create(db.clone(), &FixedGateway, &funder, 999, 10).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            create(db.clone(), &DownGateway, &funder, campaign_id, 10).await,
            Err(ServiceError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn notifications_drive_campaign_total() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (funder, campaign_id) = seed(&db);

        for (amount, status) in [(100, "settlement"), (50, "settlement"), (30, "pending"), (20, "deny")] {
            let tx = create(db.clone(), &FixedGateway, &funder, campaign_id, amount).await.unwrap();
            process_notification(&db, &notification(status, tx.id)).unwrap();
        }

        let campaign = campaigns::get(&db, campaign_id).unwrap();
        assert_eq!(campaign.current_amount, 150);
        assert_eq!(campaign.backer_count, 2);
    }

    #[test]
    fn notification_for_unknown_order() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            process_notification(&db, &notification("settlement", 77)),
            Err(ServiceError::NotFound)
        ));
        let mut bad = notification("settlement", 1);
        bad.order_id = "ORDER-abc".to_string();
        assert!(matches!(process_notification(&db, &bad), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn campaign_transactions_are_owner_only() {
        let db = Database::open_in_memory().unwrap();
        let (funder, campaign_id) = seed(&db);
        assert!(for_campaign(&db, campaign_id, funder.id).unwrap().is_empty());
        assert!(matches!(
            for_campaign(&db, campaign_id, funder.id + 1),
            Err(ServiceError::NotOwner)
        ));
    }
}
