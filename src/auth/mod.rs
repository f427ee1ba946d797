// Account and profile management backed by Supabase
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::SupabaseClient;

use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use zeroize::Zeroize;

fn default_language() -> String {
    "en".to_string()
}

/// Signup payload.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub gpu: String,
    pub ros_level: String,
    pub programming_level: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

// Custom Debug impl that never logs the password
impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// A row of the profile table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub gpu: String,
    pub ros_level: String,
    pub programming_level: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

impl Profile {
    fn for_new_user(id: String, user: &NewUser) -> Self {
        Self {
            id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            gpu: user.gpu.clone(),
            ros_level: user.ros_level.clone(),
            programming_level: user.programming_level.clone(),
            preferred_language: user.preferred_language.clone(),
        }
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ros_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.gpu.is_none()
            && self.ros_level.is_none()
            && self.programming_level.is_none()
            && self.preferred_language.is_none()
    }
}

/// Session tokens returned by sign-in
#[derive(Clone, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

// Custom Debug impl that never logs tokens
impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub profile: Profile,
    pub tokens: SessionTokens,
}

/// Identity behind a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Signup, sign-in and profile operations.
pub struct AuthService {
    client: SupabaseClient,
}

impl AuthService {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Create the auth account, then the profile row.
    ///
    /// If the profile insert fails the auth account is deleted again so no
    /// credential is left without a profile.
    pub async fn create_user(&self, user: &NewUser) -> Result<String> {
        if user.email.trim().is_empty() || user.password.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "email and password are required".to_string(),
            ));
        }

        let user_id = self.client.sign_up(user).await?;
        let profile = Profile::for_new_user(user_id.clone(), user);

        if let Err(e) = self.client.insert_profile(&profile).await {
            warn!("Profile creation failed for {}, removing auth user: {}", user_id, e);
            if let Err(cleanup) = self.client.admin_delete_user(&user_id).await {
                error!("Could not remove orphaned auth user {}: {}", user_id, cleanup);
            }
            return Err(e);
        }

        info!("Created user {}", user_id);
        Ok(user_id)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SignedInUser> {
        let (user_id, tokens) = self.client.sign_in_with_password(email, password).await?;
        let profile = self
            .client
            .select_profile(&user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile for user {}", user_id)))?;

        Ok(SignedInUser { profile, tokens })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.client
            .select_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile for user {}", user_id)))
    }

    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return self.get_profile(user_id).await;
        }

        self.client
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile for user {}", user_id)))
    }

    pub async fn verify_token(&self, access_token: &str) -> Result<TokenUser> {
        self.client.get_user(access_token).await
    }
}
