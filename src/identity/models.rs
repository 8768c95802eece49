// src/identity/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Provider name used for accounts verified by the credentials (email + password) flow
pub const CREDENTIALS_PROVIDER: &str = "credentials";

/// Join row mapping one external account to one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuthProviderLink {
    pub provider: String,
    pub provider_user_id: String,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Who vouched for the person signing in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderIdentity {
    #[serde(rename_all = "camelCase")]
    Oauth {
        provider: String,
        provider_user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Credentials { user_id: String },
}

impl ProviderIdentity {
    pub fn oauth(provider: impl Into<String>, provider_user_id: impl Into<String>) -> Self {
        ProviderIdentity::Oauth {
            provider: provider.into(),
            provider_user_id: provider_user_id.into(),
        }
    }

    pub fn credentials(user_id: impl Into<String>) -> Self {
        ProviderIdentity::Credentials {
            user_id: user_id.into(),
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            ProviderIdentity::Oauth { provider, .. } => provider,
            ProviderIdentity::Credentials { .. } => CREDENTIALS_PROVIDER,
        }
    }

    pub fn provider_user_id(&self) -> &str {
        match self {
            ProviderIdentity::Oauth {
                provider_user_id, ..
            } => provider_user_id,
            ProviderIdentity::Credentials { user_id } => user_id,
        }
    }
}

/// Everything an identity provider hands over after a successful handshake
#[derive(Debug, Clone)]
pub struct SignInAttempt {
    pub identity: ProviderIdentity,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl SignInAttempt {
    pub fn new(identity: ProviderIdentity, email: Option<String>) -> Self {
        Self {
            identity,
            email,
            display_name: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }
}
