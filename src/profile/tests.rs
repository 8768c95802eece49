//! Tests for profile module
//!
//! These tests verify core profile functionality including:
//! - Update validation limits and request shape
//! - Owner-only updates
//! - Card editor state
//! - Public lookup, card and update endpoints

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::auth::session::issue_session_token;
    use crate::common::test_support::{setup_test_db, spawn_app, TestApp, TEST_JWT_SECRET};
    use crate::common::{ApiError, Validator};
    use crate::store::{ProfileStore, SqliteProfileStore};
    use crate::profile::editor::{CardEditor, SocialLinkField};
    use crate::profile::models::*;

    fn link_input(id: &str, platform: &str) -> SocialLinkInput {
        SocialLinkInput {
            id: id.to_string(),
            platform: platform.to_string(),
            username: "jane".to_string(),
            followers: "1,200".to_string(),
        }
    }

    fn new_profile(id: &str, email: &str, username: &str) -> NewProfile {
        NewProfile {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            full_name: Some("Jane Doe".to_string()),
            avatar_url: None,
        }
    }

    // ============================================================================
    // Validator Tests
    // ============================================================================

    #[test]
    fn test_tagline_length_boundary() {
        let ok = UpdateProfileRequest {
            tagline: Some("é".repeat(100)),
            social_links: None,
        };
        assert!(validators::ProfileUpdateValidator.validate(&ok).is_valid);

        let too_long = UpdateProfileRequest {
            tagline: Some("a".repeat(101)),
            social_links: None,
        };
        let result = validators::ProfileUpdateValidator.validate(&too_long);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "tagline");
    }

    #[test]
    fn test_social_link_count_boundary() {
        let four = UpdateProfileRequest {
            tagline: None,
            social_links: Some(
                ["1", "2", "3", "4"]
                    .iter()
                    .map(|id| link_input(id, "instagram"))
                    .collect(),
            ),
        };
        assert!(validators::ProfileUpdateValidator.validate(&four).is_valid);

        let five = UpdateProfileRequest {
            tagline: None,
            social_links: Some(
                ["1", "2", "3", "4", "5"]
                    .iter()
                    .map(|id| link_input(id, "tiktok"))
                    .collect(),
            ),
        };
        let result = validators::ProfileUpdateValidator.validate(&five);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "socialLinks");
    }

    #[test]
    fn test_social_link_fields_reported_by_index() {
        let mut bad = link_input("", "myspace");
        bad.username = "u".repeat(51);
        bad.followers = "9".repeat(21);

        let request = UpdateProfileRequest {
            tagline: None,
            social_links: Some(vec![link_input("1", "x"), bad]),
        };
        let result = validators::ProfileUpdateValidator.validate(&request);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "socialLinks[1].id",
                "socialLinks[1].platform",
                "socialLinks[1].username",
                "socialLinks[1].followers",
            ]
        );
    }

    #[test]
    fn test_to_profile_update_keeps_free_text_followers() {
        let request = UpdateProfileRequest {
            tagline: Some("hi".to_string()),
            social_links: Some(vec![SocialLinkInput {
                followers: "10.5k".to_string(),
                ..link_input("1", "youtube")
            }]),
        };
        let update = validators::to_profile_update(request);
        let links = update.social_links.unwrap();
        assert_eq!(links[0].platform, Platform::Youtube);
        assert_eq!(links[0].followers, "10.5k");
    }

    #[test]
    fn test_parse_update_reports_missing_link_fields() {
        let body = json!({ "socialLinks": [{ "id": "1", "platform": "x" }] });
        let err = validators::parse_update_request(body).unwrap_err();

        match err {
            ApiError::Validation(_, details) => {
                let fields: Vec<&str> = details.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["socialLinks[0].username", "socialLinks[0].followers"]
                );
                assert_eq!(details[0].message, "Username is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_reports_every_wrong_type() {
        let body = json!({
            "tagline": 5,
            "socialLinks": [
                { "id": "1", "platform": "x", "username": "jane", "followers": 10 },
                "not a link"
            ]
        });
        let err = validators::parse_update_request(body).unwrap_err();

        match err {
            ApiError::Validation(_, details) => {
                let fields: Vec<&str> = details.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["tagline", "socialLinks[0].followers", "socialLinks[1]"]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(matches!(
            validators::parse_update_request(json!([1, 2])),
            Err(ApiError::Validation(_, _))
        ));
        assert!(matches!(
            validators::parse_update_request(json!({ "socialLinks": {} })),
            Err(ApiError::Validation(_, _))
        ));
    }

    #[test]
    fn test_parse_update_accepts_complete_body() {
        let request = validators::parse_update_request(json!({
            "tagline": null,
            "socialLinks": [
                { "id": "1", "platform": "tiktok", "username": "jane", "followers": "" }
            ]
        }))
        .unwrap();

        assert_eq!(request.tagline, None);
        assert_eq!(request.social_links.unwrap()[0].platform, "tiktok");
    }

    // ============================================================================
    // Service Tests
    // ============================================================================

    #[tokio::test]
    async fn test_update_rejects_other_subject_without_mutation() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_OWNER", "jane@example.com", "jane"))
            .await
            .unwrap();

        let request = UpdateProfileRequest {
            tagline: Some("hijacked".to_string()),
            social_links: None,
        };
        let result = service::update_own_profile(&store, "P_INTRUDER", "P_OWNER", request).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));

        let stored = store.get_profile_by_id("P_OWNER").await.unwrap().unwrap();
        assert_eq!(stored.tagline, None);
        assert!(!stored.onboarding_complete);
    }

    #[tokio::test]
    async fn test_update_marks_onboarding_complete() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        store
            .insert_profile(&new_profile("P_OWNER", "jane@example.com", "jane"))
            .await
            .unwrap();

        let request = UpdateProfileRequest {
            tagline: Some("Creator".to_string()),
            social_links: Some(vec![link_input("1", "instagram")]),
        };
        let profile = service::update_own_profile(&store, "P_OWNER", "P_OWNER", request)
            .await
            .unwrap();

        assert_eq!(profile.tagline.as_deref(), Some("Creator"));
        assert_eq!(profile.social_links.len(), 1);
        assert!(profile.onboarding_complete);
    }

    #[tokio::test]
    async fn test_update_unknown_profile_is_not_found() {
        let store = SqliteProfileStore::new(setup_test_db().await);
        let result = service::update_own_profile(
            &store,
            "P_GONE",
            "P_GONE",
            UpdateProfileRequest::default(),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    // ============================================================================
    // Card Editor Tests
    // ============================================================================

    fn seeded_profile() -> Profile {
        Profile {
            id: "P_1".to_string(),
            email: "jane@example.com".to_string(),
            username: "jane".to_string(),
            full_name: Some("Jane".to_string()),
            avatar_url: None,
            tagline: Some("Hello".to_string()),
            social_links: vec![SocialLink {
                id: "seed".to_string(),
                platform: Platform::X,
                username: "jane_x".to_string(),
                followers: "300".to_string(),
            }],
            onboarding_complete: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_editor_add_respects_limit() {
        let mut editor = CardEditor::new(&seeded_profile());
        assert!(!editor.is_dirty());

        let ids: Vec<String> = (0..3).filter_map(|_| editor.add_social_link()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(editor.add_social_link(), None);
        assert_eq!(editor.card().social_links.len(), MAX_SOCIAL_LINKS);

        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(unique.len(), 3);
        assert!(editor
            .card()
            .social_links
            .iter()
            .filter(|l| ids.contains(&l.id))
            .all(|l| l.platform == Platform::Instagram && l.username.is_empty()));
    }

    #[test]
    fn test_editor_update_remove_and_cancel() {
        let mut editor = CardEditor::new(&seeded_profile());

        assert!(editor.update_social_link("seed", SocialLinkField::Platform, "tiktok"));
        assert!(editor.update_social_link("seed", SocialLinkField::Followers, "12k"));
        assert!(!editor.update_social_link("seed", SocialLinkField::Platform, "myspace"));
        assert!(!editor.update_social_link("missing", SocialLinkField::Username, "x"));
        editor.set_tagline("New tagline");

        assert!(editor.is_dirty());
        assert_eq!(editor.card().social_links[0].platform, Platform::Tiktok);
        assert_eq!(editor.card().social_links[0].followers, "12k");

        let request = editor.to_update_request();
        assert_eq!(request.tagline.as_deref(), Some("New tagline"));
        assert_eq!(request.social_links.as_ref().unwrap()[0].platform, "tiktok");
        assert!(validators::ProfileUpdateValidator.validate(&request).is_valid);

        assert!(editor.remove_social_link("seed"));
        assert!(!editor.remove_social_link("seed"));

        editor.cancel();
        assert!(!editor.is_dirty());
        assert_eq!(editor.card().tagline, "Hello");
        assert_eq!(editor.card().social_links[0].platform, Platform::X);
    }

    // ============================================================================
    // HTTP Endpoint Tests
    // ============================================================================

    async fn seed(app: &TestApp, id: &str, email: &str, username: &str) -> String {
        app.state
            .profiles
            .insert_profile(&new_profile(id, email, username))
            .await
            .unwrap();
        issue_session_token(TEST_JWT_SECRET, 1, id, email).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_by_username() {
        let app = spawn_app().await;
        seed(&app, "P_JANE", "jane@example.com", "jane").await;

        let (status, _) = app.request("GET", "/api/profile", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.request("GET", "/api/profile?username=ghost", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.request("GET", "/api/profile?username=JANE", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "P_JANE");
        assert_eq!(body["fullName"], "Jane Doe");
        assert!(body.get("email").is_none());
    }

    #[tokio::test]
    async fn test_patch_own_profile_and_card_view() {
        let app = spawn_app().await;
        let token = seed(&app, "P_JANE", "jane@example.com", "jane").await;

        let (status, body) = app
            .request(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({
                    "tagline": "Travel creator",
                    "socialLinks": [
                        { "id": "1", "platform": "youtube", "username": "janetube", "followers": "1,260,000" },
                        { "id": "2", "platform": "x", "username": "jane", "followers": "950" }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["onboardingComplete"], true);

        let (status, card) = app.request("GET", "/api/cards/jane", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(card["name"], "Jane Doe");
        assert_eq!(card["tagline"], "Travel creator");
        assert_eq!(card["socialLinks"][0]["followersDisplay"], "1.3M");
        assert_eq!(card["socialLinks"][1]["followersDisplay"], "950");
    }

    #[tokio::test]
    async fn test_patch_requires_session_and_valid_body() {
        let app = spawn_app().await;
        let token = seed(&app, "P_JANE", "jane@example.com", "jane").await;

        let (status, _) = app
            .request("PATCH", "/api/profile", None, Some(json!({ "tagline": "x" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let links: Vec<_> = (0..5)
            .map(|i| json!({ "id": i.to_string(), "platform": "instagram", "username": "j", "followers": "1" }))
            .collect();
        let (status, body) = app
            .request(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({ "socialLinks": links })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "socialLinks");
    }

    #[tokio::test]
    async fn test_patch_rejects_incomplete_or_mistyped_links() {
        let app = spawn_app().await;
        let token = seed(&app, "P_JANE", "jane@example.com", "jane").await;

        let (status, body) = app
            .request(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({ "socialLinks": [{ "id": "1", "platform": "x" }] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"][0]["field"], "socialLinks[0].username");
        assert_eq!(body["details"][1]["field"], "socialLinks[0].followers");

        let (status, body) = app
            .request(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({
                    "tagline": 5,
                    "socialLinks": [{ "id": "1", "platform": "x", "username": "j", "followers": 10 }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);

        let stored = app.state.profiles.get_profile_by_id("P_JANE").await.unwrap().unwrap();
        assert!(stored.social_links.is_empty());
        assert!(!stored.onboarding_complete);
    }

    #[tokio::test]
    async fn test_patch_by_id_enforces_ownership() {
        let app = spawn_app().await;
        let jane = seed(&app, "P_JANE", "jane@example.com", "jane").await;
        seed(&app, "P_BOB", "bob@example.com", "bob").await;

        let (status, _) = app
            .request(
                "PATCH",
                "/api/profiles/P_BOB",
                Some(&jane),
                Some(json!({ "tagline": "owned" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Foreign target is refused even when the body is malformed
        let (status, _) = app
            .request(
                "PATCH",
                "/api/profiles/P_BOB",
                Some(&jane),
                Some(json!({ "tagline": 5 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let bob = app.state.profiles.get_profile_by_id("P_BOB").await.unwrap().unwrap();
        assert_eq!(bob.tagline, None);

        let (status, body) = app
            .request(
                "PATCH",
                "/api/profiles/P_JANE",
                Some(&jane),
                Some(json!({ "tagline": "mine" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tagline"], "mine");
    }
}
