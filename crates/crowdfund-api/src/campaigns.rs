use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
};
use tracing::{info, warn};

use crowdfund_db::models::CampaignRow;
use crowdfund_types::api::{
    CampaignDetailResponse, CampaignImageResponse, CampaignListQuery, CampaignOwner, CampaignRequest,
    CampaignResponse, UploadResult,
};

use crate::envelope::{ApiJson, ApiPath, ApiQuery, fail, ok, respond};
use crate::error::{ApiError, OrEnvelope, ServiceError};
use crate::middleware::CurrentUser;
use crate::service::blocking;
use crate::service::campaigns::{self, CampaignDetail, CampaignInput};
use crate::state::AppState;
use crate::upload::{is_checked, read_upload};

fn campaign_response(c: CampaignRow) -> CampaignResponse {
    CampaignResponse {
        id: c.id,
        user_id: c.user_id,
        name: c.name,
        short_description: c.short_description,
        image_url: c.primary_image.unwrap_or_default(),
        goal_amount: c.goal_amount,
        current_amount: c.current_amount,
        slug: c.slug,
    }
}

fn detail_response(detail: CampaignDetail) -> CampaignDetailResponse {
    let CampaignDetail { campaign: c, owner, images } = detail;
    CampaignDetailResponse {
        id: c.id,
        perks: campaigns::perks(&c.perks),
        name: c.name,
        short_description: c.short_description,
        description: c.description,
        image_url: c.primary_image.unwrap_or_default(),
        goal_amount: c.goal_amount,
        current_amount: c.current_amount,
        backer_count: c.backer_count,
        user_id: c.user_id,
        slug: c.slug,
        user: CampaignOwner {
            name: owner.name,
            image_url: owner.avatar_file_name.unwrap_or_default(),
        },
        images: images
            .into_iter()
            .map(|i| CampaignImageResponse {
                image_url: i.file_name,
                is_primary: i.is_primary,
            })
            .collect(),
    }
}

fn input(req: CampaignRequest) -> CampaignInput {
    CampaignInput {
        name: req.name,
        short_description: req.short_description,
        description: req.description,
        goal_amount: req.goal_amount,
        perks: req.perks,
    }
}

/// GET /api/v1/campaigns. `user_id` of 0 or absent lists every campaign.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CampaignListQuery>,
) -> Result<Response, ApiError> {
    let owner = query.user_id.filter(|id| *id != 0);
    let db = state.db.clone();
    let rows = blocking(move || campaigns::list(&db, owner))
        .await
        .or_envelope("Error to get campaigns")?;

    let data: Vec<CampaignResponse> = rows.into_iter().map(campaign_response).collect();
    Ok(ok("List of campaigns", data))
}

/// GET /api/v1/campaigns/{id}
pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let detail = blocking(move || campaigns::detail(&db, id))
        .await
        .or_envelope("Failed to get detail of campaign")?;
    Ok(ok("Campaign detail", detail_response(detail)))
}

/// POST /api/v1/campaigns
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CampaignRequest>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let input = input(req);
    let campaign = blocking(move || campaigns::create(&db, user.id, &input))
        .await
        .or_envelope("Failed to create campaign")?;

    Ok(respond(
        StatusCode::CREATED,
        "Success to create campaign",
        campaign_response(campaign),
    ))
}

/// PUT /api/v1/campaigns/{id}. Owner only.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CampaignRequest>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let input = input(req);
    let campaign = blocking(move || campaigns::update(&db, id, user.id, &input))
        .await
        .or_envelope("Failed to update campaign")?;
    Ok(ok("Success to update campaign", campaign_response(campaign)))
}

/// POST /api/v1/campaign-images. Multipart fields `campaign_id`, `is_primary`
/// and `file`. Ownership is checked before anything is written to disk.
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    const FAILED: &str = "Failed to upload campaign image";

    let upload = match read_upload(multipart, "file").await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Unreadable campaign image upload from user {}: {}", user.id, e);
            return Ok(fail(StatusCode::BAD_REQUEST, FAILED, UploadResult { is_uploaded: false }));
        }
    };

    let mut errors = Vec::new();
    let campaign_id = match upload.field("campaign_id").map(str::parse::<i64>) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            errors.push("campaign_id must be a number".to_string());
            None
        }
        None => {
            errors.push("campaign_id is required".to_string());
            None
        }
    };
    if upload.file.is_none() {
        errors.push("file is required".to_string());
    }
    let (Some(campaign_id), Some(file)) = (campaign_id, upload.file.as_ref()) else {
        return Err(ApiError::validation(FAILED, errors));
    };
    let is_primary = is_checked(upload.field("is_primary"));

    let db = state.db.clone();
    let user_id = user.id;
    blocking(move || campaigns::ensure_owner(&db, campaign_id, user_id))
        .await
        .or_envelope(FAILED)?;

    let path = state
        .storage
        .save(user_id, &file.file_name, &file.bytes)
        .await
        .map_err(ServiceError::Internal)
        .or_envelope(FAILED)?;

    let db = state.db.clone();
    blocking(move || campaigns::attach_image(&db, campaign_id, &path, is_primary))
        .await
        .or_envelope(FAILED)?;

    info!("User {} added an image to campaign {}", user_id, campaign_id);
    Ok(ok("Campaign image successfully uploaded", UploadResult { is_uploaded: true }))
}
