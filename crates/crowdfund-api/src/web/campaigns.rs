use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crowdfund_db::models::{CampaignRow, TransactionRow};

use super::users::UserView;
use super::{OrPage, error_page, found, image_url, page};
use crate::error::ServiceError;
use crate::service::campaigns::{self, CampaignInput};
use crate::service::{blocking, transactions, users};
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Serialize)]
struct CampaignView {
    id: i64,
    user_id: i64,
    name: String,
    short_description: String,
    description: String,
    perks: Vec<String>,
    goal_amount: i64,
    current_amount: i64,
    backer_count: i64,
    slug: String,
    image_url: String,
}

impl From<CampaignRow> for CampaignView {
    fn from(c: CampaignRow) -> Self {
        Self {
            image_url: image_url(c.primary_image.as_deref()),
            perks: campaigns::perks(&c.perks),
            id: c.id,
            user_id: c.user_id,
            name: c.name,
            short_description: c.short_description,
            description: c.description,
            goal_amount: c.goal_amount,
            current_amount: c.current_amount,
            backer_count: c.backer_count,
            slug: c.slug,
        }
    }
}

#[derive(Serialize)]
pub(super) struct TransactionView {
    pub id: i64,
    pub user_name: String,
    pub campaign_name: String,
    pub amount: i64,
    pub status: String,
    pub code: String,
    pub created_at: String,
}

impl From<TransactionRow> for TransactionView {
    fn from(t: TransactionRow) -> Self {
        Self {
            id: t.id,
            user_name: t.user_name,
            campaign_name: t.campaign_name,
            amount: t.amount,
            status: t.status.to_string(),
            code: t.code,
            created_at: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Admin campaign form. `goal_amount` arrives as text so a bad number is
/// reported next to the other field errors.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CampaignForm {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub goal_amount: String,
    pub perks: String,
}

impl CampaignForm {
    fn input(&self) -> Result<CampaignInput, ServiceError> {
        let goal_amount = self
            .goal_amount
            .trim()
            .parse()
            .map_err(|_| ServiceError::invalid("goal_amount must be a whole number"))?;
        Ok(CampaignInput {
            name: self.name.clone(),
            short_description: self.short_description.clone(),
            description: self.description.clone(),
            goal_amount,
            perks: self.perks.clone(),
        })
    }
}

impl From<&CampaignRow> for CampaignForm {
    fn from(c: &CampaignRow) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            name: c.name.clone(),
            short_description: c.short_description.clone(),
            description: c.description.clone(),
            goal_amount: c.goal_amount.to_string(),
            perks: c.perks.clone(),
        }
    }
}

#[derive(Serialize)]
struct FormPage<'a> {
    form: &'a CampaignForm,
    users: Vec<UserView>,
    errors: &'a [String],
}

#[derive(Serialize)]
struct IdPage {
    id: i64,
}

/// GET /campaigns
pub async fn index(State(state): State<AppState>) -> Result<Response, Response> {
    let db = state.db.clone();
    let rows = blocking(move || campaigns::list(&db, None)).await.or_page(&state)?;
    let campaigns: Vec<CampaignView> = rows.into_iter().map(CampaignView::from).collect();
    Ok(page(&state, "campaign_index.html", serde_json::json!({ "campaigns": campaigns })))
}

async fn form_page(state: &AppState, form: &CampaignForm, errors: &[String]) -> Result<Response, Response> {
    let db = state.db.clone();
    let users = blocking(move || users::all(&db)).await.or_page(state)?;
    Ok(page(
        state,
        "campaign_new.html",
        FormPage {
            form,
            users: users.into_iter().map(UserView::from).collect(),
            errors,
        },
    ))
}

/// GET /campaigns/new
pub async fn new(State(state): State<AppState>) -> Result<Response, Response> {
    form_page(&state, &CampaignForm::default(), &[]).await
}

/// POST /campaigns. The admin picks the owner from the user list.
pub async fn create(State(state): State<AppState>, Form(form): Form<CampaignForm>) -> Result<Response, Response> {
    let input = match form.input() {
        Ok(input) => input,
        Err(ServiceError::Validation(errors)) => return form_page(&state, &form, &errors).await,
        Err(e) => return Err(e).or_page(&state),
    };

    let db = state.db.clone();
    let owner_id = form.user_id;
    let created = blocking(move || {
        users::get(&db, owner_id).map_err(|e| match e {
            ServiceError::NotFound => ServiceError::invalid("user_id does not name a user"),
            other => other,
        })?;
        campaigns::create(&db, owner_id, &input)
    })
    .await;

    match created {
        Ok(campaign) => {
            info!("Admin created campaign {} for user {}", campaign.id, owner_id);
            Ok(found("/campaigns"))
        }
        Err(ServiceError::Validation(errors)) => form_page(&state, &form, &errors).await,
        Err(e) => Err(e).or_page(&state),
    }
}

/// GET /campaigns/image/{id}
pub async fn new_image(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, Response> {
    let db = state.db.clone();
    blocking(move || campaigns::get(&db, id)).await.or_page(&state)?;
    Ok(page(&state, "campaign_image.html", IdPage { id }))
}

/// POST /campaigns/image/{id}. The upload becomes the primary image and is
/// stored under the campaign owner's id.
pub async fn create_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let db = state.db.clone();
    let campaign = blocking(move || campaigns::get(&db, id)).await.or_page(&state)?;

    let upload = read_upload(multipart, "file").await.map_err(|e| {
        warn!("Unreadable image upload for campaign {}: {}", id, e);
        error_page(&state, StatusCode::BAD_REQUEST, "Could not read the upload")
    })?;
    let Some(file) = upload.file else {
        return Ok(page(&state, "campaign_image.html", IdPage { id }));
    };

    let path = state
        .storage
        .save(campaign.user_id, &file.file_name, &file.bytes)
        .await
        .map_err(ServiceError::Internal)
        .or_page(&state)?;

    let db = state.db.clone();
    blocking(move || campaigns::attach_image(&db, id, &path, true))
        .await
        .or_page(&state)?;
    info!("Admin added primary image to campaign {}", id);
    Ok(found("/campaigns"))
}

fn edit_page(state: &AppState, form: &CampaignForm, errors: &[String]) -> Response {
    page(
        state,
        "campaign_edit.html",
        FormPage {
            form,
            users: Vec::new(),
            errors,
        },
    )
}

/// GET /campaigns/edit/{id}
pub async fn edit(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, Response> {
    let db = state.db.clone();
    let campaign = blocking(move || campaigns::get(&db, id)).await.or_page(&state)?;
    Ok(edit_page(&state, &CampaignForm::from(&campaign), &[]))
}

/// POST /campaigns/update/{id}. The admin edits on behalf of the owner.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(mut form): Form<CampaignForm>,
) -> Result<Response, Response> {
    form.id = id;
    let input = match form.input() {
        Ok(input) => input,
        Err(ServiceError::Validation(errors)) => return Ok(edit_page(&state, &form, &errors)),
        Err(e) => return Err(e).or_page(&state),
    };

    let db = state.db.clone();
    let updated = blocking(move || {
        let campaign = campaigns::get(&db, id)?;
        campaigns::update(&db, id, campaign.user_id, &input)
    })
    .await;

    match updated {
        Ok(_) => Ok(found("/campaigns")),
        Err(ServiceError::Validation(errors)) => Ok(edit_page(&state, &form, &errors)),
        Err(e) => Err(e).or_page(&state),
    }
}

/// GET /campaigns/show/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, Response> {
    let db = state.db.clone();
    let (detail, rows) = blocking(move || {
        let detail = campaigns::detail(&db, id)?;
        let rows = transactions::for_campaign(&db, id, detail.campaign.user_id)?;
        Ok((detail, rows))
    })
    .await
    .or_page(&state)?;

    let images: Vec<serde_json::Value> = detail
        .images
        .iter()
        .map(|i| serde_json::json!({ "image_url": image_url(Some(i.file_name.as_str())), "is_primary": i.is_primary }))
        .collect();
    let transactions: Vec<TransactionView> = rows.into_iter().map(TransactionView::from).collect();

    Ok(page(
        &state,
        "campaign_show.html",
        serde_json::json!({
            "campaign": CampaignView::from(detail.campaign),
            "owner": UserView::from(detail.owner),
            "images": images,
            "transactions": transactions,
        }),
    ))
}
