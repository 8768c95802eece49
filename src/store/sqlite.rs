// src/store/sqlite.rs

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, error};

use super::{ConflictTarget, ProfileStore, StoreError, StoreResult};
use crate::identity::models::AuthProviderLink;
use crate::profile::models::{NewProfile, Profile, ProfileRow, ProfileUpdate};

const PROFILE_COLUMNS: &str = "id, email, username, full_name, avatar_url, tagline, social_links, \
     onboarding_complete, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    db: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn fetch_profile_where(&self, column: &str, value: &str) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE {} = ?", PROFILE_COLUMNS, column);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Profile::from))
    }
}

/// Maps a SQLite unique violation to the key it hit
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let message = db_err.message();
        if db_err.is_unique_violation() || message.starts_with("UNIQUE constraint failed") {
            let target = if message.contains("profiles.email") {
                ConflictTarget::Email
            } else if message.contains("profiles.username") {
                ConflictTarget::Username
            } else if message.contains("profiles.id") {
                ConflictTarget::ProfileId
            } else if message.contains("auth_provider_links.") {
                ConflictTarget::ProviderAccount
            } else {
                ConflictTarget::Other
            };
            return StoreError::Conflict(target);
        }
    }
    StoreError::Database(err)
}

/// Escapes LIKE wildcards so an email local part such as `a_b` matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        self.fetch_profile_where("username", username).await
    }

    async fn get_profile_by_id(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.fetch_profile_where("id", id).await
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> StoreResult<bool> {
        let social_links_json = update
            .social_links
            .as_ref()
            .map(|links| serde_json::to_string(links).unwrap_or_else(|_| "[]".to_string()));

        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                tagline = COALESCE(?, tagline),
                social_links = COALESCE(?, social_links),
                onboarding_complete = 1,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(update.tagline.as_deref())
        .bind(social_links_json.as_deref())
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, profile_id = %id, "Database error updating profile");
            StoreError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        self.fetch_profile_where("email", email).await
    }

    async fn count_usernames_with_prefix(&self, prefix: &str) -> StoreResult<i64> {
        let pattern = format!("{}%", escape_like(prefix));
        let count = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM profiles WHERE lower(username) LIKE lower(?) ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, username, full_name, avatar_url, social_links, onboarding_complete)
            VALUES (?, ?, ?, ?, ?, '[]', 0)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(profile.full_name.as_deref())
        .bind(profile.avatar_url.as_deref())
        .execute(&self.db)
        .await
        .map_err(classify)?;

        debug!(profile_id = %profile.id, "Inserted profile, fetching record");

        self.get_profile_by_id(&profile.id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_display_metadata(
        &self,
        id: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> StoreResult<()> {
        if full_name.is_none() && avatar_url.is_none() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE profiles SET
                full_name = COALESCE(?, full_name),
                avatar_url = COALESCE(?, avatar_url),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(full_name)
        .bind(avatar_url)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_auth_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> StoreResult<Option<AuthProviderLink>> {
        let link = sqlx::query_as::<_, AuthProviderLink>(
            "SELECT provider, provider_user_id, user_id, created_at FROM auth_provider_links \
             WHERE provider = ? AND provider_user_id = ?",
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(link)
    }

    async fn insert_auth_link(
        &self,
        provider: &str,
        provider_user_id: &str,
        user_id: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO auth_provider_links (provider, provider_user_id, user_id) VALUES (?, ?, ?)",
        )
        .bind(provider)
        .bind(provider_user_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn list_auth_links(&self, user_id: &str) -> StoreResult<Vec<AuthProviderLink>> {
        let links = sqlx::query_as::<_, AuthProviderLink>(
            "SELECT provider, provider_user_id, user_id, created_at FROM auth_provider_links \
             WHERE user_id = ? ORDER BY created_at, provider",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::setup_test_db;
    use crate::profile::models::{Platform, SocialLink};

    fn new_profile(id: &str, email: &str, username: &str) -> NewProfile {
        NewProfile {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            full_name: Some("Test User".to_string()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_profile() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        let inserted = store
            .insert_profile(&new_profile("P_1", "jane@example.com", "jane"))
            .await
            .unwrap();

        assert_eq!(inserted.username, "jane");
        assert!(!inserted.onboarding_complete);
        assert!(inserted.social_links.is_empty());

        let by_email = store.find_profile_by_email("jane@example.com").await.unwrap();
        assert_eq!(by_email.map(|p| p.id), Some("P_1".to_string()));

        let by_username = store.get_profile_by_username("jane").await.unwrap();
        assert_eq!(by_username.map(|p| p.id), Some("P_1".to_string()));

        assert!(store.get_profile_by_id("P_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_profile_reports_conflicts() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_1", "jane@example.com", "jane"))
            .await
            .unwrap();

        let email_clash = store
            .insert_profile(&new_profile("P_2", "jane@example.com", "jane99"))
            .await
            .unwrap_err();
        assert_eq!(email_clash.conflict_target(), Some(ConflictTarget::Email));

        let username_clash = store
            .insert_profile(&new_profile("P_3", "other@example.com", "JANE"))
            .await
            .unwrap_err();
        assert_eq!(
            username_clash.conflict_target(),
            Some(ConflictTarget::Username)
        );

        let id_clash = store
            .insert_profile(&new_profile("P_1", "third@example.com", "third"))
            .await
            .unwrap_err();
        assert_eq!(id_clash.conflict_target(), Some(ConflictTarget::ProfileId));
    }

    #[tokio::test]
    async fn test_count_usernames_with_prefix() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_1", "a@example.com", "jane"))
            .await
            .unwrap();
        store
            .insert_profile(&new_profile("P_2", "b@example.com", "Jane2"))
            .await
            .unwrap();
        store
            .insert_profile(&new_profile("P_3", "c@example.com", "janet_x"))
            .await
            .unwrap();
        store
            .insert_profile(&new_profile("P_4", "d@example.com", "janetxx"))
            .await
            .unwrap();

        assert_eq!(store.count_usernames_with_prefix("jane").await.unwrap(), 4);
        assert_eq!(store.count_usernames_with_prefix("JANE").await.unwrap(), 4);
        // `_` is literal, not a single-character wildcard
        assert_eq!(store.count_usernames_with_prefix("janet_").await.unwrap(), 1);
        assert_eq!(store.count_usernames_with_prefix("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_profile_sets_onboarding_and_keeps_omitted_fields() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_1", "jane@example.com", "jane"))
            .await
            .unwrap();

        let links = vec![SocialLink {
            id: "1700000000000".to_string(),
            platform: Platform::Tiktok,
            username: "jane_dances".to_string(),
            followers: "10.5k".to_string(),
        }];
        let updated = store
            .update_profile(
                "P_1",
                &ProfileUpdate {
                    tagline: Some("Dancer".to_string()),
                    social_links: Some(links.clone()),
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let updated = store
            .update_profile(
                "P_1",
                &ProfileUpdate {
                    tagline: Some("Dancer & creator".to_string()),
                    social_links: None,
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let profile = store.get_profile_by_id("P_1").await.unwrap().unwrap();
        assert!(profile.onboarding_complete);
        assert_eq!(profile.tagline.as_deref(), Some("Dancer & creator"));
        assert_eq!(profile.social_links, links);

        let missing = store
            .update_profile("P_missing", &ProfileUpdate::default())
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_auth_links() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_1", "jane@example.com", "jane"))
            .await
            .unwrap();

        store.insert_auth_link("google", "g-1", "P_1").await.unwrap();
        store
            .insert_auth_link("credentials", "C_1", "P_1")
            .await
            .unwrap();

        let duplicate = store
            .insert_auth_link("google", "g-1", "P_1")
            .await
            .unwrap_err();
        assert_eq!(
            duplicate.conflict_target(),
            Some(ConflictTarget::ProviderAccount)
        );

        let link = store.find_auth_link("google", "g-1").await.unwrap().unwrap();
        assert_eq!(link.user_id, "P_1");
        assert!(store.find_auth_link("google", "g-2").await.unwrap().is_none());

        assert_eq!(store.list_auth_links("P_1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_display_metadata_only_overwrites_supplied_fields() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_1", "jane@example.com", "jane"))
            .await
            .unwrap();

        store
            .update_display_metadata("P_1", None, Some("https://img.test/a.png"))
            .await
            .unwrap();

        let profile = store.get_profile_by_id("P_1").await.unwrap().unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Test User"));
        assert_eq!(profile.avatar_url.as_deref(), Some("https://img.test/a.png"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }
}
