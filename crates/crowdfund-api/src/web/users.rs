use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crowdfund_db::models::UserRow;

use super::{OrPage, error_page, found, image_url, page};
use crate::error::ServiceError;
use crate::service::{blocking, users};
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub occupation: String,
    pub role: String,
    pub image_url: String,
}

impl From<UserRow> for UserView {
    fn from(user: UserRow) -> Self {
        Self {
            image_url: image_url(user.avatar_file_name.as_deref()),
            id: user.id,
            name: user.name,
            email: user.email,
            occupation: user.occupation,
            role: user.role.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub occupation: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Serialize)]
struct FormPage<'a> {
    form: &'a UserForm,
    errors: &'a [String],
}

#[derive(Serialize)]
struct IdPage {
    id: i64,
}

/// GET /users
pub async fn index(State(state): State<AppState>) -> Result<Response, Response> {
    let db = state.db.clone();
    let rows = blocking(move || users::all(&db)).await.or_page(&state)?;
    let users: Vec<UserView> = rows.into_iter().map(UserView::from).collect();
    Ok(page(&state, "user_index.html", serde_json::json!({ "users": users })))
}

/// GET /users/new
pub async fn new(State(state): State<AppState>) -> Response {
    page(
        &state,
        "user_new.html",
        FormPage {
            form: &UserForm::default(),
            errors: &[],
        },
    )
}

/// POST /users
pub async fn create(State(state): State<AppState>, Form(form): Form<UserForm>) -> Result<Response, Response> {
    let db = state.db.clone();
    let registration = users::Registration {
        name: form.name.clone(),
        occupation: form.occupation.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
    };

    match blocking(move || users::register(&db, &registration)).await {
        Ok(user) => {
            info!("Admin created user {}", user.id);
            Ok(found("/users"))
        }
        Err(ServiceError::Validation(errors)) => Ok(page(
            &state,
            "user_new.html",
            FormPage {
                form: &form,
                errors: &errors,
            },
        )),
        Err(e) => Err(e).or_page(&state),
    }
}

/// GET /users/edit/{id}
pub async fn edit(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, Response> {
    let db = state.db.clone();
    let user = blocking(move || users::get(&db, id)).await.or_page(&state)?;
    let form = UserForm {
        id: user.id,
        name: user.name,
        email: user.email,
        occupation: user.occupation,
        password: String::new(),
    };
    Ok(page(&state, "user_edit.html", FormPage { form: &form, errors: &[] }))
}

/// POST /users/update/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(mut form): Form<UserForm>,
) -> Result<Response, Response> {
    form.id = id;
    let db = state.db.clone();
    let changes = users::ProfileChanges {
        name: form.name.clone(),
        email: form.email.clone(),
        occupation: form.occupation.clone(),
    };

    match blocking(move || users::update(&db, id, &changes)).await {
        Ok(_) => Ok(found("/users")),
        Err(ServiceError::Validation(errors)) => Ok(page(
            &state,
            "user_edit.html",
            FormPage {
                form: &form,
                errors: &errors,
            },
        )),
        Err(e) => Err(e).or_page(&state),
    }
}

/// GET /users/avatar/{id}
pub async fn new_avatar(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    page(&state, "user_avatar.html", IdPage { id })
}

/// POST /users/avatar/{id}
pub async fn create_avatar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, Response> {
    let db = state.db.clone();
    blocking(move || users::get(&db, id)).await.or_page(&state)?;

    let upload = read_upload(multipart, "avatar").await.map_err(|e| {
        warn!("Unreadable avatar upload for user {}: {}", id, e);
        error_page(&state, StatusCode::BAD_REQUEST, "Could not read the upload")
    })?;
    let Some(file) = upload.file else {
        return Ok(page(&state, "user_avatar.html", IdPage { id }));
    };

    let path = state
        .storage
        .save(id, &file.file_name, &file.bytes)
        .await
        .map_err(ServiceError::Internal)
        .or_page(&state)?;

    let db = state.db.clone();
    blocking(move || users::save_avatar(&db, id, &path)).await.or_page(&state)?;
    info!("Admin replaced avatar of user {}", id);
    Ok(found("/users"))
}
