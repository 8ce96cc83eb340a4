use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{info, warn};

use crowdfund_db::Database;
use crowdfund_db::models::{NewUser, UserChanges, UserRow};
use crowdfund_types::models::Role;

use super::require;
use crate::error::ServiceError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub name: String,
    pub email: String,
    pub occupation: String,
}

pub fn register(db: &Database, input: &Registration) -> Result<UserRow, ServiceError> {
    let mut errors = require(&[
        ("name", input.name.as_str()),
        ("occupation", input.occupation.as_str()),
        ("email", input.email.as_str()),
    ]);
    if !input.email.trim().is_empty() && !input.email.contains('@') {
        errors.push("email is not a valid address".to_string());
    }
    if input.password.len() < MIN_PASSWORD_LENGTH {
        errors.push(format!("password must be at least {} characters", MIN_PASSWORD_LENGTH));
    }
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let email = input.email.trim();
    if db.get_user_by_email(email)?.is_some() {
        return Err(ServiceError::invalid("email has been registered"));
    }

    let password_hash = hash_password(&input.password)?;
    let id = db.create_user(&NewUser {
        name: input.name.trim(),
        occupation: input.occupation.trim(),
        email,
        password_hash: &password_hash,
        role: Role::User,
    })?;

    info!("Registered user {}", id);
    get(db, id)
}

/// Check an email/password pair. Unknown email and wrong password fail the
/// same way.
pub fn login(db: &Database, email: &str, password: &str) -> Result<UserRow, ServiceError> {
    let rejected = || ServiceError::invalid("email or password is incorrect");

    let user = db.get_user_by_email(email.trim())?.ok_or_else(rejected)?;
    if !verify_password(password, &user.password_hash) {
        return Err(rejected());
    }
    Ok(user)
}

pub fn is_email_available(db: &Database, email: &str) -> Result<bool, ServiceError> {
    Ok(db.get_user_by_email(email.trim())?.is_none())
}

pub fn get(db: &Database, id: i64) -> Result<UserRow, ServiceError> {
    db.get_user_by_id(id)?.ok_or(ServiceError::NotFound)
}

pub fn all(db: &Database) -> Result<Vec<UserRow>, ServiceError> {
    Ok(db.list_users()?)
}

pub fn update(db: &Database, id: i64, changes: &ProfileChanges) -> Result<UserRow, ServiceError> {
    let errors = require(&[
        ("name", changes.name.as_str()),
        ("email", changes.email.as_str()),
        ("occupation", changes.occupation.as_str()),
    ]);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let email = changes.email.trim();
    if let Some(other) = db.get_user_by_email(email)? {
        if other.id != id {
            return Err(ServiceError::invalid("email has been registered"));
        }
    }

    let updated = db.update_user(
        id,
        &UserChanges {
            name: changes.name.trim(),
            email,
            occupation: changes.occupation.trim(),
        },
    )?;
    if !updated {
        return Err(ServiceError::NotFound);
    }
    get(db, id)
}

pub fn save_avatar(db: &Database, id: i64, path: &str) -> Result<UserRow, ServiceError> {
    if !db.set_user_avatar(id, path)? {
        return Err(ServiceError::NotFound);
    }
    get(db, id)
}

/// Make sure an admin account exists for `email`, promoting an existing user
/// or creating a new one.
pub fn ensure_admin(db: &Database, email: &str, password: &str) -> Result<UserRow, ServiceError> {
    if let Some(user) = db.get_user_by_email(email)? {
        if user.role != Role::Admin {
            db.set_user_role(user.id, Role::Admin)?;
            info!("Promoted user {} to admin", user.id);
        }
        return get(db, user.id);
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::invalid(format!(
            "admin password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let password_hash = hash_password(password)?;
    let id = db.create_user(&NewUser {
        name: "Administrator",
        occupation: "admin",
        email,
        password_hash: &password_hash,
        role: Role::Admin,
    })?;
    info!("Created admin user {}", id);
    get(db, id)
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("password hashing failed: {}", e))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}
