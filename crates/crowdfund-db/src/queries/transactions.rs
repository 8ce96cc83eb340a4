use anyhow::Result;
use crowdfund_types::models::PaymentStatus;
use rusqlite::{Connection, OptionalExtension, Row};

use super::parse_text;
use crate::Database;
use crate::models::{NewTransaction, TransactionRow};

const TRANSACTION_SELECT: &str = "
    SELECT t.id, t.campaign_id, t.user_id, t.amount, t.status, t.code, t.payment_url,
           u.name, c.name, i.file_name, t.created_at, t.updated_at
    FROM transactions t
    JOIN users u ON u.id = t.user_id
    JOIN campaigns c ON c.id = t.campaign_id
    LEFT JOIN campaign_images i ON i.campaign_id = c.id AND i.is_primary = 1";

impl Database {
    /// Insert a new transaction in the `pending` state.
    pub fn create_transaction(&self, tx: &NewTransaction<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO transactions (campaign_id, user_id, amount, status, code)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    tx.campaign_id,
                    tx.user_id,
                    tx.amount,
                    PaymentStatus::Pending.as_str(),
                    tx.code
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn set_transaction_payment_url(&self, id: i64, payment_url: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE transactions SET payment_url = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![payment_url, id],
            )?;
            Ok(n == 1)
        })
    }

    pub fn get_transaction(&self, id: i64) -> Result<Option<TransactionRow>> {
        self.with_conn(|conn| query_transaction(conn, id))
    }

    pub fn list_transactions_by_campaign(&self, campaign_id: i64) -> Result<Vec<TransactionRow>> {
        self.with_conn(|conn| {
            query_transactions(
                conn,
                &format!("{TRANSACTION_SELECT} WHERE t.campaign_id = ?1 ORDER BY t.id DESC"),
                [campaign_id],
            )
        })
    }

    pub fn list_transactions_by_user(&self, user_id: i64) -> Result<Vec<TransactionRow>> {
        self.with_conn(|conn| {
            query_transactions(
                conn,
                &format!("{TRANSACTION_SELECT} WHERE t.user_id = ?1 ORDER BY t.id DESC"),
                [user_id],
            )
        })
    }

    pub fn list_transactions(&self) -> Result<Vec<TransactionRow>> {
        self.with_conn(|conn| {
            query_transactions(conn, &format!("{TRANSACTION_SELECT} ORDER BY t.id DESC"), [])
        })
    }

    /// Set a transaction's payment status and recompute the owning campaign's
    /// raised total and backer count in one SQLite transaction.
    /// Returns `None` when the transaction does not exist.
    pub fn apply_payment_status(&self, id: i64, status: PaymentStatus) -> Result<Option<TransactionRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let campaign_id: Option<i64> = tx
                .query_row("SELECT campaign_id FROM transactions WHERE id = ?1", [id], |r| r.get(0))
                .optional()?;
            let Some(campaign_id) = campaign_id else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE transactions SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![status.as_str(), id],
            )?;
            recompute_campaign_totals(&tx, campaign_id)?;
            tx.commit()?;

            query_transaction(conn, id)
        })
    }
}

/// Raised total is the sum of `paid` amounts; backers are the `paid` rows.
fn recompute_campaign_totals(conn: &Connection, campaign_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE campaigns SET
            current_amount = (SELECT COALESCE(SUM(amount), 0) FROM transactions
                              WHERE campaign_id = ?1 AND status = 'paid'),
            backer_count   = (SELECT COUNT(*) FROM transactions
                              WHERE campaign_id = ?1 AND status = 'paid'),
            updated_at     = datetime('now')
         WHERE id = ?1",
        [campaign_id],
    )?;
    Ok(())
}

fn query_transaction(conn: &Connection, id: i64) -> Result<Option<TransactionRow>> {
    let row = conn
        .query_row(&format!("{TRANSACTION_SELECT} WHERE t.id = ?1"), [id], map_transaction)
        .optional()?;
    Ok(row)
}

fn query_transactions<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<TransactionRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        user_id: row.get(2)?,
        amount: row.get(3)?,
        status: parse_text(4, row.get(4)?)?,
        code: row.get(5)?,
        payment_url: row.get(6)?,
        user_name: row.get(7)?,
        campaign_name: row.get(8)?,
        campaign_image: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
