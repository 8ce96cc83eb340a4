use anyhow::Result;
use crowdfund_types::models::Role;
use rusqlite::{OptionalExtension, Row};

use super::parse_text;
use crate::Database;
use crate::models::{NewUser, UserChanges, UserRow};

const USER_COLUMNS: &str =
    "id, name, occupation, email, password_hash, avatar_file_name, role, created_at, updated_at";

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, occupation, email, password_hash, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user.name,
                    user.occupation,
                    user.email,
                    user.password_hash,
                    user.role.as_str()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"))?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no user has the given id.
    pub fn update_user(&self, id: i64, changes: &UserChanges<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET name = ?1, email = ?2, occupation = ?3, updated_at = datetime('now')
                 WHERE id = ?4",
                rusqlite::params![changes.name, changes.email, changes.occupation, id],
            )?;
            Ok(n == 1)
        })
    }

    pub fn set_user_avatar(&self, id: i64, file_name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET avatar_file_name = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![file_name, id],
            )?;
            Ok(n == 1)
        })
    }

    pub fn set_user_role(&self, id: i64, role: Role) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET role = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![role.as_str(), id],
            )?;
            Ok(n == 1)
        })
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        occupation: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        avatar_file_name: row.get(5)?,
        role: parse_text(6, row.get(6)?)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            name: "Ada",
            occupation: "engineer",
            email,
            password_hash: "hash",
            role: Role::User,
        }
    }

    #[test]
    fn create_and_lookup_user() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_user(&new_user("ada@example.com")).unwrap();

        let by_id = db.get_user_by_id(id).unwrap().unwrap();
        let by_email = db.get_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(by_id.id, by_email.id);
        assert_eq!(by_id.role, Role::User);
        assert!(by_id.avatar_file_name.is_none());
        assert!(db.get_user_by_id(id + 1).unwrap().is_none());
    }

    #[test]
    fn email_is_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("dup@example.com")).unwrap();
        assert!(db.create_user(&new_user("dup@example.com")).is_err());
    }

    #[test]
    fn avatar_and_profile_updates() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_user(&new_user("ada@example.com")).unwrap();

        assert!(db.set_user_avatar(id, "images/1-me.png").unwrap());
        assert!(
            db.update_user(
                id,
                &UserChanges {
                    name: "Ada L",
                    email: "ada@example.com",
                    occupation: "mathematician",
                },
            )
            .unwrap()
        );
        assert!(db.set_user_role(id, Role::Admin).unwrap());

        let user = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(user.avatar_file_name.as_deref(), Some("images/1-me.png"));
        assert_eq!(user.occupation, "mathematician");
        assert_eq!(user.role, Role::Admin);
        assert!(!db.set_user_avatar(999, "x").unwrap());
    }
}
