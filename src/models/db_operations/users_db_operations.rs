use crate::models::User;
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError};

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

const USER_COLUMNS: &str = "id, name, email, role, is_active, last_login_time";

fn row_to_user(row: &rusqlite::Row) -> Result<User, RusqliteError> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get(4)?,
        last_login_time: row.get(5)?,
    })
}

/// Inserts a user. The email is stored lowercased so lookups are
/// case-insensitive; the password is bcrypt-hashed before it touches disk.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<User, RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    let email = email.trim().to_lowercase();
    conn.execute(
        "INSERT INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![name.trim(), email, hashed_password, role],
    )?;
    let id = conn.last_insert_rowid() as i32;
    Ok(User {
        id,
        name: name.trim().to_string(),
        email,
        role: role.to_string(),
        is_active: true,
        last_login_time: None,
    })
}

/// True once any admin-role account exists; the one-time setup flow is
/// refused from that point on.
pub fn admin_exists(conn: &Connection) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')",
        [],
        |row| row.get(0),
    )
}

pub fn read_user_by_email(conn: &Connection, email: &str) -> Option<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        [email.trim().to_lowercase()],
        row_to_user,
    )
    .ok()
}

/// Credential check: lookup by lowercased email, reject unknown accounts,
/// inactive accounts and hash mismatches. All three paths return `None` so
/// the route layer emits one uniform "invalid credentials" response and
/// nothing leaks which check failed.
pub fn verify_credentials(conn: &Connection, email: &str, password: &str) -> Option<User> {
    let email = email.trim().to_lowercase();
    let result: rusqlite::Result<(User, String)> = conn.query_row(
        &format!(
            "SELECT {}, password_hash FROM users WHERE email = ?1",
            USER_COLUMNS
        ),
        [&email],
        |row| Ok((row_to_user(row)?, row.get(6)?)),
    );

    if let Ok((user, password_hash)) = result {
        if user.is_active && verify(password, &password_hash).unwrap_or(false) {
            return Some(user);
        }
    }
    None
}

pub fn update_last_login_time(conn: &Connection, email: &str) -> Result<(), RusqliteError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET last_login_time = ?1 WHERE email = ?2",
        params![now, email.trim().to_lowercase()],
    )?;
    Ok(())
}

pub fn list_admins(conn: &Connection) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE role = 'admin' ORDER BY email",
        USER_COLUMNS
    ))?;
    let user_iter = stmt.query_map([], row_to_user)?;
    Ok(user_iter.filter_map(|u| u.ok()).collect())
}

pub fn change_password(
    conn: &Connection,
    email: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed_password =
        hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE email = ?2",
        params![hashed_password, email.trim().to_lowercase()],
    )
}

pub fn change_email(
    conn: &Connection,
    old_email: &str,
    new_email: &str,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE users SET email = ?1 WHERE email = ?2",
        params![
            new_email.trim().to_lowercase(),
            old_email.trim().to_lowercase()
        ],
    )
}
