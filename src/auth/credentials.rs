//! Storage for credential accounts, email confirmation and password reset tokens
//!
//! A credential account only counts as proof of its email once `verified_at`
//! is set. Both token kinds are single use, expire, and are consumed inside a
//! transaction together with the account change they authorize.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::models::CredentialUser;

/// Same layout as SQLite's `datetime('now')`, so stored values sort as text
pub fn sql_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub async fn find_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<CredentialUser>, sqlx::Error> {
    sqlx::query_as::<_, CredentialUser>("SELECT * FROM credential_users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<CredentialUser>, sqlx::Error> {
    sqlx::query_as::<_, CredentialUser>("SELECT * FROM credential_users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Inserts an unverified account
pub async fn insert_credential_user(
    db: &SqlitePool,
    id: &str,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
) -> Result<CredentialUser, sqlx::Error> {
    sqlx::query("INSERT INTO credential_users (id, email, password_hash, name) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .execute(db)
        .await?;

    sqlx::query_as::<_, CredentialUser>("SELECT * FROM credential_users WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn store_reset_token(
    db: &SqlitePool,
    token: &str,
    credential_user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (token, credential_user_id, expires_at) VALUES (?, ?, ?)",
    )
    .bind(token)
    .bind(credential_user_id)
    .bind(sql_timestamp(expires_at))
    .execute(db)
    .await?;

    Ok(())
}

pub async fn store_verification_token(
    db: &SqlitePool,
    token: &str,
    credential_user_id: &str,
    password_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO email_verification_tokens (token, credential_user_id, password_hash, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(token)
    .bind(credential_user_id)
    .bind(password_hash)
    .bind(sql_timestamp(expires_at))
    .execute(db)
    .await?;

    Ok(())
}

/// Consumes a confirmation token: marks the account verified and installs the
/// password hash the token was issued with.
///
/// Returns the credential user id, or `None` when the token is unknown,
/// already used or expired at `now`. Other outstanding confirmations for the
/// account are spent so a competing registration cannot be confirmed later.
pub async fn verify_email_with_token(
    db: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, sqlx::Error> {
    let now = sql_timestamp(now);
    let mut tx = db.begin().await?;

    let consumed = sqlx::query_as::<_, (String, String)>(
        r#"
        UPDATE email_verification_tokens
        SET used_at = ?
        WHERE token = ? AND used_at IS NULL AND expires_at > ?
        RETURNING credential_user_id, password_hash
        "#,
    )
    .bind(&now)
    .bind(token)
    .bind(&now)
    .fetch_optional(&mut *tx)
    .await?;

    let (user_id, password_hash) = match consumed {
        Some(row) => row,
        None => {
            tx.rollback().await?;
            return Ok(None);
        }
    };

    sqlx::query(
        r#"
        UPDATE credential_users
        SET password_hash = ?, verified_at = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&password_hash)
    .bind(&now)
    .bind(&user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE email_verification_tokens SET used_at = ? WHERE credential_user_id = ? AND used_at IS NULL",
    )
    .bind(&now)
    .bind(&user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(user_id))
}

/// Consumes `token` and stores the new hash in one transaction.
///
/// Returns the credential user id, or `None` when the token is unknown,
/// already used or expired at `now`. Every other outstanding token of the
/// same account is spent as well. Following a reset link proves the email,
/// so an unverified account becomes verified and its pending confirmations
/// are spent.
pub async fn reset_password_with_token(
    db: &SqlitePool,
    token: &str,
    new_password_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, sqlx::Error> {
    let now = sql_timestamp(now);
    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, String>(
        r#"
        UPDATE password_reset_tokens
        SET used_at = ?
        WHERE token = ? AND used_at IS NULL AND expires_at > ?
        RETURNING credential_user_id
        "#,
    )
    .bind(&now)
    .bind(token)
    .bind(&now)
    .fetch_optional(&mut *tx)
    .await?;

    let user_id = match user_id {
        Some(id) => id,
        None => {
            tx.rollback().await?;
            return Ok(None);
        }
    };

    sqlx::query(
        r#"
        UPDATE credential_users
        SET password_hash = ?, verified_at = COALESCE(verified_at, ?), updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(new_password_hash)
    .bind(&now)
    .bind(&user_id)
    .execute(&mut *tx)
    .await?;

    for table in ["password_reset_tokens", "email_verification_tokens"] {
        sqlx::query(&format!(
            "UPDATE {} SET used_at = ? WHERE credential_user_id = ? AND used_at IS NULL",
            table
        ))
        .bind(&now)
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some(user_id))
}
