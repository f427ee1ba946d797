// Supabase REST client (GoTrue auth + PostgREST profile table)
// Author: kelexine (https://github.com/kelexine)

use super::{NewUser, Profile, ProfileUpdate, SessionTokens, TokenUser};
use crate::config::SupabaseConfig;
use crate::error::{Result, ServiceError};
use crate::utils::logging::sanitize;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Thin client over the Supabase HTTP APIs. No retries.
pub struct SupabaseClient {
    http_client: Client,
    base_url: String,
    service_key: String,
    profiles_table: String,
}

#[derive(Deserialize)]
struct SignInResponse {
    access_token: String,
    refresh_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseClient {
    /// Build a client. Both the project URL and the service-role key are required.
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ServiceError::ConfigurationMissing("Supabase URL (set SUPABASE_URL)".to_string()))?;
        let service_key = config
            .service_role_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::ConfigurationMissing(
                    "Supabase service role key (set SUPABASE_SERVICE_ROLE_KEY)".to_string(),
                )
            })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            profiles_table: config.profiles_table.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn profiles_path(&self) -> String {
        format!("/rest/v1/{}", self.profiles_table)
    }

    fn profile_filter(&self, user_id: &str) -> String {
        format!("{}?id=eq.{}", self.profiles_path(), urlencoding::encode(user_id))
    }

    /// Extract error message from a GoTrue or PostgREST error body
    fn extract_error_message(response_text: &str) -> Option<String> {
        let value: Value = serde_json::from_str(response_text).ok()?;
        ["msg", "error_description", "message", "error"]
            .iter()
            .find_map(|field| value.get(*field).and_then(Value::as_str))
            .map(str::to_string)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            error!("Supabase {} request failed: {}", operation, e);
            ServiceError::RemoteUnavailable(format!("{}: HTTP error: {}", operation, e))
        })
    }

    /// Turn a non-success response into an error; client errors keep the upstream message.
    ///
    /// Used for requests made with the service-role key, so a 401/403 means the
    /// server's own credential was rejected rather than the end user's.
    async fn check(&self, operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = Self::extract_error_message(&body).unwrap_or_else(|| status.to_string());
        error!(
            "Supabase {} failed: HTTP {} - {}",
            operation,
            status,
            sanitize(&body)
        );

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::RemoteUnavailable(format!(
                "{}: service key rejected (HTTP {})",
                operation,
                status.as_u16()
            )),
            StatusCode::NOT_FOUND => ServiceError::NotFound(format!("{}: {}", operation, message)),
            s if s.is_client_error() => ServiceError::InvalidRequest(format!("{}: {}", operation, message)),
            _ => ServiceError::RemoteUnavailable(format!("{}: HTTP {}", operation, status.as_u16())),
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| ServiceError::RemoteUnavailable(format!("{}: invalid response: {}", operation, e)))
    }

    /// Create an auth account. Returns the new user id.
    pub async fn sign_up(&self, user: &NewUser) -> Result<String> {
        let body = json!({
            "email": user.email,
            "password": user.password,
            "data": { "full_name": user.full_name },
        });

        let response = self
            .send("signup", self.request(Method::POST, "/auth/v1/signup").json(&body))
            .await?;
        let response = self.check("signup", response).await?;
        let value: Value = Self::json("signup", response).await?;

        // With autoconfirm the user is nested next to a session, otherwise it is the body
        value
            .get("user")
            .and_then(|u| u.get("id"))
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ServiceError::RemoteUnavailable("signup: response has no user id".to_string()))
    }

    /// Password sign-in. Returns the user id and session tokens.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(String, SessionTokens)> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .send(
                "signin",
                self.request(Method::POST, "/auth/v1/token?grant_type=password").json(&body),
            )
            .await?;

        // GoTrue reports bad credentials as 400 invalid_grant
        if response.status() == StatusCode::BAD_REQUEST {
            debug!("Sign-in rejected for {}", email);
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        let response = self.check("signin", response).await?;
        let session: SignInResponse = Self::json("signin", response).await?;
        Ok((
            session.user.id,
            SessionTokens {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
            },
        ))
    }

    /// Resolve an access token to its user.
    pub async fn get_user(&self, access_token: &str) -> Result<TokenUser> {
        let request = self
            .http_client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(access_token);

        let response = self.send("verify token", request).await?;
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ServiceError::Unauthorized("Invalid token".to_string()));
        }
        let response = self.check("verify token", response).await?;
        Self::json("verify token", response).await
    }

    /// Delete an auth account with the admin API.
    pub async fn admin_delete_user(&self, user_id: &str) -> Result<()> {
        let path = format!("/auth/v1/admin/users/{}", urlencoding::encode(user_id));
        let response = self
            .send("delete user", self.request(Method::DELETE, &path))
            .await?;
        self.check("delete user", response).await?;
        Ok(())
    }

    pub async fn insert_profile(&self, profile: &Profile) -> Result<Profile> {
        let response = self
            .send(
                "insert profile",
                self.request(Method::POST, &self.profiles_path())
                    .header("Prefer", "return=representation")
                    .json(profile),
            )
            .await?;
        let response = self.check("insert profile", response).await?;
        let rows: Vec<Profile> = Self::json("insert profile", response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ServiceError::RemoteUnavailable("insert profile: no row returned".to_string()))
    }

    pub async fn select_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let path = format!("{}&select=*", self.profile_filter(user_id));
        let response = self
            .send("select profile", self.request(Method::GET, &path))
            .await?;
        let response = self.check("select profile", response).await?;
        let rows: Vec<Profile> = Self::json("select profile", response).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Option<Profile>> {
        let response = self
            .send(
                "update profile",
                self.request(Method::PATCH, &self.profile_filter(user_id))
                    .header("Prefer", "return=representation")
                    .json(update),
            )
            .await?;
        let response = self.check("update profile", response).await?;
        let rows: Vec<Profile> = Self::json("update profile", response).await?;
        Ok(rows.into_iter().next())
    }
}
