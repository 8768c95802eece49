//! Authentication handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::credentials;
use super::extractors::AuthedUser;
use super::models::{
    CredentialUser, ForgotPasswordRequest, GoogleIdTokenPayload, LoginRequest, MeResponse,
    MessageResponse, RegisterRequest, ResetPasswordRequest, SessionProfile, SessionResponse,
    VerifyEmailRequest,
};
use super::passwords::{hash_password, verify_password};
use super::session::issue_session_token;
use super::validators::{RegisterValidator, ResetPasswordValidator};
use crate::common::helpers::safe_token_log;
use crate::common::validation::is_valid_email;
use crate::common::{
    generate_credential_user_id, generate_reset_token, normalize_email, safe_email_log,
    ApiError, AppState, Validator,
};
use crate::identity::{IdentityResolver, ProviderIdentity, SignInAttempt};
use crate::services::email::{
    generate_email_verification_email, generate_password_reset_email,
    EMAIL_VERIFICATION_SUBJECT, PASSWORD_RESET_SUBJECT,
};
use crate::services::google::{verify_id_token, GoogleError};
use crate::store::ProfileStore;

const SIGN_IN_FAILED: &str = "Could not sign in";
const RESET_LINK_INVALID: &str = "Reset link is invalid or has expired";
const FORGOT_PASSWORD_ACK: &str =
    "If an account exists for that email, a password reset link has been sent.";
const VERIFY_LINK_INVALID: &str = "Confirmation link is invalid or has expired";
const REGISTER_PENDING: &str =
    "Check your email for a link to confirm your account.";
const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

fn sign_in_failed() -> ApiError {
    ApiError::Unauthorized(SIGN_IN_FAILED.to_string())
}

/// Resolves the attempt to a profile and issues the session for it
async fn complete_sign_in(
    state: &AppState,
    attempt: SignInAttempt,
) -> Result<SessionResponse, ApiError> {
    let provider = attempt.identity.provider().to_string();

    let profile_id = IdentityResolver::new(&state.profiles)
        .resolve(&attempt)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                provider = %provider,
                email = %attempt.email.as_deref().map(safe_email_log).unwrap_or_default(),
                "Identity resolution failed, refusing sign-in"
            );
            sign_in_failed()
        })?;

    let profile = state
        .profiles
        .get_profile_by_id(&profile_id)
        .await?
        .ok_or_else(|| {
            error!(profile_id = %profile_id, "Resolved profile disappeared before session issue");
            sign_in_failed()
        })?;

    let token = issue_session_token(
        &state.config.jwt_secret,
        state.config.session_ttl_hours,
        &profile.id,
        &profile.email,
    )
    .map_err(|e| {
        error!(error = %e, profile_id = %profile.id, "JWT encoding error during authentication");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(
        profile_id = %profile.id,
        email = %safe_email_log(&profile.email),
        provider = %provider,
        "Sign-in successful"
    );

    Ok(SessionResponse {
        token,
        profile: SessionProfile::from(profile),
    })
}

fn credentials_attempt(user: &CredentialUser) -> SignInAttempt {
    SignInAttempt::new(
        ProviderIdentity::credentials(user.id.clone()),
        Some(user.email.clone()),
    )
    .with_display_name(user.name.clone())
}

/// POST /api/auth/google
/// Authenticates a user via Google OAuth ID token
///
/// # Request Body
/// ```json
/// {
///   "id_token": "<google id token>"
/// }
/// ```
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleIdTokenPayload>,
) -> Result<Json<SessionResponse>, ApiError> {
    info!("🔐 Received Google auth request");
    let state = state_lock.read().await.clone();

    let google = verify_id_token(
        &state.http,
        &payload.id_token,
        state.config.google_client_id.as_deref(),
    )
    .await
    .map_err(|e| match e {
        GoogleError::Unavailable(_) => {
            ApiError::InternalServer("google token validation service unavailable".to_string())
        }
        GoogleError::Malformed(_) | GoogleError::MissingFields => {
            ApiError::BadRequest("invalid or malformed id_token".to_string())
        }
        other => ApiError::Unauthorized(other.to_string()),
    })?;

    debug!(
        email = %safe_email_log(&google.email),
        provider = "google",
        provider_id = %google.sub,
        "Google token validation successful, resolving identity"
    );

    let attempt = SignInAttempt::new(
        ProviderIdentity::oauth("google", google.sub),
        Some(google.email),
    )
    .with_display_name(google.name)
    .with_avatar_url(google.picture);

    Ok(Json(complete_sign_in(&state, attempt).await?))
}

/// Mails a confirmation link that activates `password_hash` for `user`.
/// Delivery failures are logged only, so the response never reveals them.
async fn send_email_confirmation(
    state: &AppState,
    user: &CredentialUser,
    password_hash: &str,
) -> Result<(), ApiError> {
    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
    credentials::store_verification_token(&state.db, &token, &user.id, password_hash, expires_at)
        .await?;

    let link = format!("{}/verify-email?token={}", state.config.app_url, token);
    let html = generate_email_verification_email(&link);

    match state
        .mailer
        .send(&user.email, EMAIL_VERIFICATION_SUBJECT, &html)
        .await
    {
        Ok(()) => info!(credential_user_id = %user.id, "Email confirmation sent"),
        Err(e) => error!(
            error = %e,
            credential_user_id = %user.id,
            "Failed to send email confirmation"
        ),
    }

    Ok(())
}

fn hash_request_password(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("An unexpected error occurred.".to_string())
    })
}

/// POST /api/auth/register
///
/// A new or still unconfirmed account gets a confirmation email and a
/// `202 Accepted` acknowledgement; no session is issued until the link is
/// followed. For a confirmed account the request behaves as a login.
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    RegisterValidator.validate(&request).into_result()?;

    let email = normalize_email(&request.email);
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let (user, new_hash) = match credentials::find_by_email(&state.db, &email).await? {
        Some(existing) => (existing, None),
        None => {
            let password_hash = hash_request_password(&request.password)?;
            let id = generate_credential_user_id();
            let user = match credentials::insert_credential_user(
                &state.db,
                &id,
                &email,
                &password_hash,
                name,
            )
            .await
            {
                Ok(user) => {
                    info!(
                        credential_user_id = %user.id,
                        email = %safe_email_log(&email),
                        "Credential account created, awaiting email confirmation"
                    );
                    user
                }
                // Concurrent registration won the email: continue with its account
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    credentials::find_by_email(&state.db, &email)
                        .await?
                        .ok_or_else(sign_in_failed)?
                }
                Err(e) => return Err(ApiError::DatabaseError(e)),
            };
            (user, Some(password_hash))
        }
    };

    if user.is_verified() {
        debug!(email = %safe_email_log(&email), "Email already registered, treating as login");
        if !verify_password(&request.password, &user.password_hash) {
            warn!(email = %safe_email_log(&email), "Registration for existing email with wrong password");
            return Err(sign_in_failed());
        }
        let session = complete_sign_in(&state, credentials_attempt(&user)).await?;
        return Ok(Json(session).into_response());
    }

    let password_hash = match new_hash {
        Some(hash) => hash,
        None => hash_request_password(&request.password)?,
    };
    send_email_confirmation(&state, &user, &password_hash).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: REGISTER_PENDING.to_string(),
        }),
    )
        .into_response())
}

/// POST /api/auth/verify-email
/// Confirms the email from a registration link and signs the account in
pub async fn verify_email(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let token = request.token.trim();
    let user_id = match credentials::verify_email_with_token(&state.db, token, Utc::now()).await? {
        Some(user_id) => user_id,
        None => {
            warn!(
                token = %safe_token_log(token),
                "Email confirmation attempted with invalid or expired token"
            );
            return Err(ApiError::BadRequest(VERIFY_LINK_INVALID.to_string()));
        }
    };

    let user = credentials::find_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(sign_in_failed)?;
    info!(credential_user_id = %user.id, "Email confirmed");

    Ok(Json(complete_sign_in(&state, credentials_attempt(&user)).await?))
}

/// POST /api/auth/login
/// Unconfirmed accounts are refused like a wrong password
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(sign_in_failed());
    }

    let user = match credentials::find_by_email(&state.db, &email).await? {
        Some(user)
            if user.is_verified() && verify_password(&request.password, &user.password_hash) =>
        {
            user
        }
        _ => {
            warn!(email = %safe_email_log(&email), "Credential login rejected");
            return Err(sign_in_failed());
        }
    };

    Ok(Json(complete_sign_in(&state, credentials_attempt(&user)).await?))
}

/// POST /api/auth/forgot-password
///
/// Answers the same way whether or not the account exists
pub async fn forgot_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address.".to_string()));
    }

    let generic_failure = |e: sqlx::Error| {
        error!(error = %e, email = %safe_email_log(&email), "Database error during password reset request");
        ApiError::InternalServer("Something went wrong. Please try again.".to_string())
    };

    if let Some(user) = credentials::find_by_email(&state.db, &email)
        .await
        .map_err(generic_failure)?
    {
        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        credentials::store_reset_token(&state.db, &token, &user.id, expires_at)
            .await
            .map_err(generic_failure)?;

        let link = format!("{}/reset-password?token={}", state.config.app_url, token);
        let html = generate_password_reset_email(&link);

        match state.mailer.send(&user.email, PASSWORD_RESET_SUBJECT, &html).await {
            Ok(()) => info!(
                credential_user_id = %user.id,
                "Password reset email sent"
            ),
            Err(e) => error!(
                error = %e,
                credential_user_id = %user.id,
                "Failed to send password reset email"
            ),
        }
    } else {
        debug!(email = %safe_email_log(&email), "Password reset requested for unknown email");
    }

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_ACK.to_string(),
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    ResetPasswordValidator.validate(&request).into_result()?;

    let password_hash = hash_request_password(&request.password)?;

    match credentials::reset_password_with_token(
        &state.db,
        request.token.trim(),
        &password_hash,
        Utc::now(),
    )
    .await?
    {
        Some(user_id) => {
            info!(credential_user_id = %user_id, "Password reset completed");
            Ok(Json(MessageResponse {
                message: "Your password has been reset.".to_string(),
            }))
        }
        None => {
            warn!(
                token = %safe_token_log(request.token.trim()),
                "Password reset attempted with invalid or expired token"
            );
            Err(ApiError::BadRequest(RESET_LINK_INVALID.to_string()))
        }
    }
}

/// GET /api/me
/// Returns the caller's profile and the providers linked to it
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = state
        .profiles
        .get_profile_by_id(&authed.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".to_string()))?;
    let providers = state.profiles.list_auth_links(&authed.id).await?;

    Ok(Json(MeResponse { profile, providers }))
}

/// POST /api/auth/logout
/// Sessions are stateless JWTs; the client drops its token
pub async fn logout_handler(authed: AuthedUser) -> Result<Json<MessageResponse>, ApiError> {
    info!(profile_id = %authed.id, "User logout successful");
    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}
