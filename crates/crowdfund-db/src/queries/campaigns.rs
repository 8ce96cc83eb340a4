use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

use crate::Database;
use crate::models::{CampaignChanges, CampaignImageRow, CampaignRow, NewCampaign};

// LEFT JOIN on the partial unique index yields at most one image per campaign.
const CAMPAIGN_SELECT: &str = "
    SELECT c.id, c.user_id, c.name, c.short_description, c.description, c.perks,
           c.backer_count, c.goal_amount, c.current_amount, c.slug, i.file_name,
           c.created_at, c.updated_at
    FROM campaigns c
    LEFT JOIN campaign_images i ON i.campaign_id = c.id AND i.is_primary = 1";

impl Database {
    pub fn create_campaign(&self, campaign: &NewCampaign<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO campaigns (user_id, name, short_description, description, perks, goal_amount, slug)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    campaign.user_id,
                    campaign.name,
                    campaign.short_description,
                    campaign.description,
                    campaign.perks,
                    campaign.goal_amount,
                    campaign.slug
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_campaign(&self, id: i64) -> Result<Option<CampaignRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(&format!("{CAMPAIGN_SELECT} WHERE c.id = ?1"), [id], map_campaign)
                .optional()?;
            Ok(row)
        })
    }

    pub fn campaign_slug_exists(&self, slug: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM campaigns WHERE slug = ?1", [slug], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// All campaigns, newest first, optionally restricted to one owner.
    pub fn list_campaigns(&self, owner_id: Option<i64>) -> Result<Vec<CampaignRow>> {
        self.with_conn(|conn| {
            let rows = match owner_id {
                Some(owner_id) => {
                    let mut stmt = conn.prepare(&format!(
                        "{CAMPAIGN_SELECT} WHERE c.user_id = ?1 ORDER BY c.id DESC"
                    ))?;
                    stmt.query_map([owner_id], map_campaign)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!("{CAMPAIGN_SELECT} ORDER BY c.id DESC"))?;
                    stmt.query_map([], map_campaign)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    /// Returns false when no campaign has the given id. The slug is fixed at
    /// creation and never rewritten.
    pub fn update_campaign(&self, id: i64, changes: &CampaignChanges<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE campaigns
                 SET name = ?1, short_description = ?2, description = ?3, perks = ?4,
                     goal_amount = ?5, updated_at = datetime('now')
                 WHERE id = ?6",
                rusqlite::params![
                    changes.name,
                    changes.short_description,
                    changes.description,
                    changes.perks,
                    changes.goal_amount,
                    id
                ],
            )?;
            Ok(n == 1)
        })
    }

    /// Attach an image to a campaign. A new primary image demotes the previous
    /// one in the same SQLite transaction.
    pub fn add_campaign_image(&self, campaign_id: i64, file_name: &str, is_primary: bool) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if is_primary {
                tx.execute(
                    "UPDATE campaign_images SET is_primary = 0 WHERE campaign_id = ?1 AND is_primary = 1",
                    [campaign_id],
                )?;
            }
            tx.execute(
                "INSERT INTO campaign_images (campaign_id, file_name, is_primary) VALUES (?1, ?2, ?3)",
                rusqlite::params![campaign_id, file_name, is_primary],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn list_campaign_images(&self, campaign_id: i64) -> Result<Vec<CampaignImageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, file_name, is_primary, created_at
                 FROM campaign_images WHERE campaign_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([campaign_id], map_image)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_campaign(row: &Row<'_>) -> rusqlite::Result<CampaignRow> {
    Ok(CampaignRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        short_description: row.get(3)?,
        description: row.get(4)?,
        perks: row.get(5)?,
        backer_count: row.get(6)?,
        goal_amount: row.get(7)?,
        current_amount: row.get(8)?,
        slug: row.get(9)?,
        primary_image: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn map_image(row: &Row<'_>) -> rusqlite::Result<CampaignImageRow> {
    Ok(CampaignImageRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        file_name: row.get(2)?,
        is_primary: row.get(3)?,
        created_at: row.get(4)?,
    })
}
