use tracing::info;

use crowdfund_db::Database;
use crowdfund_db::models::{CampaignChanges, CampaignImageRow, CampaignRow, NewCampaign, UserRow};

use super::require;
use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct CampaignInput {
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub goal_amount: i64,
    pub perks: String,
}

pub struct CampaignDetail {
    pub campaign: CampaignRow,
    pub owner: UserRow,
    pub images: Vec<CampaignImageRow>,
}

pub fn list(db: &Database, owner_id: Option<i64>) -> Result<Vec<CampaignRow>, ServiceError> {
    Ok(db.list_campaigns(owner_id)?)
}

pub fn get(db: &Database, id: i64) -> Result<CampaignRow, ServiceError> {
    db.get_campaign(id)?.ok_or(ServiceError::NotFound)
}

pub fn detail(db: &Database, id: i64) -> Result<CampaignDetail, ServiceError> {
    let campaign = get(db, id)?;
    let owner = db.get_user_by_id(campaign.user_id)?.ok_or(ServiceError::NotFound)?;
    let images = db.list_campaign_images(id)?;
    Ok(CampaignDetail { campaign, owner, images })
}

pub fn create(db: &Database, owner_id: i64, input: &CampaignInput) -> Result<CampaignRow, ServiceError> {
    validate(input)?;

    let slug = slugify(&format!("{} {}", input.name, owner_id));
    if db.campaign_slug_exists(&slug)? {
        return Err(ServiceError::invalid("you already have a campaign with this name"));
    }

    let id = db.create_campaign(&NewCampaign {
        user_id: owner_id,
        name: input.name.trim(),
        short_description: input.short_description.trim(),
        description: input.description.trim(),
        perks: input.perks.trim(),
        goal_amount: input.goal_amount,
        slug: &slug,
    })?;

    info!("Campaign {} created by user {}", id, owner_id);
    get(db, id)
}

/// Update a campaign on behalf of `actor_id`, who must own it.
pub fn update(
    db: &Database,
    id: i64,
    actor_id: i64,
    input: &CampaignInput,
) -> Result<CampaignRow, ServiceError> {
    ensure_owner(db, id, actor_id)?;
    validate(input)?;

    let updated = db.update_campaign(
        id,
        &CampaignChanges {
            name: input.name.trim(),
            short_description: input.short_description.trim(),
            description: input.description.trim(),
            perks: input.perks.trim(),
            goal_amount: input.goal_amount,
        },
    )?;
    if !updated {
        return Err(ServiceError::NotFound);
    }
    get(db, id)
}

pub fn ensure_owner(db: &Database, campaign_id: i64, actor_id: i64) -> Result<CampaignRow, ServiceError> {
    let campaign = get(db, campaign_id)?;
    if campaign.user_id != actor_id {
        return Err(ServiceError::NotOwner);
    }
    Ok(campaign)
}

/// Record an already stored image. Ownership is checked before the file is
/// written, see [`ensure_owner`].
pub fn attach_image(
    db: &Database,
    campaign_id: i64,
    file_name: &str,
    is_primary: bool,
) -> Result<i64, ServiceError> {
    Ok(db.add_campaign_image(campaign_id, file_name, is_primary)?)
}

/// Split the stored comma separated perks into a list.
pub fn perks(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|perk| !perk.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn validate(input: &CampaignInput) -> Result<(), ServiceError> {
    let mut errors = require(&[
        ("name", input.name.as_str()),
        ("short_description", input.short_description.as_str()),
        ("description", input.description.as_str()),
        ("perks", input.perks.as_str()),
    ]);
    if input.goal_amount <= 0 {
        errors.push("goal_amount must be greater than zero".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdfund_db::models::NewUser;
    use crowdfund_types::models::Role;

    fn user(db: &Database, email: &str) -> i64 {
        db.create_user(&NewUser {
            name: "Owner",
            occupation: "maker",
            email,
            password_hash: "hash",
            role: Role::User,
        })
        .unwrap()
    }

    fn input(name: &str) -> CampaignInput {
        CampaignInput {
            name: name.to_string(),
            short_description: "A short pitch".to_string(),
            description: "The long story".to_string(),
            goal_amount: 10_000,
            perks: "thanks card, tote bag".to_string(),
        }
    }

    #[test]
    fn slug_is_derived_from_name_and_owner() {
        assert_eq!(slugify("Solar Kiosk 7"), "solar-kiosk-7");
        assert_eq!(slugify("  Hello,  World!! 12 "), "hello-world-12");
    }

    #[test]
    fn perks_are_trimmed_list() {
        assert_eq!(perks(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(perks("").is_empty());
    }

    #[test]
    fn create_assigns_owner_and_slug() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner@example.com");

        let campaign = create(&db, owner, &input("Solar Kiosk")).unwrap();
        assert_eq!(campaign.user_id, owner);
        assert_eq!(campaign.slug, format!("solar-kiosk-{}", owner));
        assert_eq!(campaign.current_amount, 0);

        assert!(matches!(
            create(&db, owner, &input("Solar Kiosk")),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn only_owner_may_update() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner@example.com");
        let stranger = user(&db, "stranger@example.com");
        let campaign = create(&db, owner, &input("Solar Kiosk")).unwrap();

        assert!(matches!(
            update(&db, campaign.id, stranger, &input("Hijacked")),
            Err(ServiceError::NotOwner)
        ));
        assert_eq!(get(&db, campaign.id).unwrap().name, "Solar Kiosk");

        let updated = update(&db, campaign.id, owner, &input("Wind Kiosk")).unwrap();
        assert_eq!(updated.name, "Wind Kiosk");
        assert!(matches!(update(&db, 999, owner, &input("x")), Err(ServiceError::NotFound)));
    }

    #[test]
    fn invalid_goal_rejected() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner@example.com");
        let mut bad = input("Zero");
        bad.goal_amount = 0;
        assert!(matches!(create(&db, owner, &bad), Err(ServiceError::Validation(_))));
    }
}
