//! Token broker — admin and user token exchange.

use std::fmt;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::FleetClient;
use crate::error::{FleetError, FleetResult};

/// Service-level token authorizing fleet API calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

/// Session token for a customer account.
#[derive(Clone, PartialEq, Eq)]
pub struct UserToken(String);

impl AdminToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(<redacted>)")
    }
}

impl fmt::Debug for UserToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserToken(<redacted>)")
    }
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    jwt_token: String,
}

impl FleetClient {
    /// Exchange the static API key for an admin token.
    pub async fn admin_token(&self) -> FleetResult<AdminToken> {
        let resp = self
            .http
            .get(&self.config.auth_token_url)
            .header(AUTHORIZATION, self.config.api_key.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "admin token request failed");
                FleetError::auth("admin token request failed", Some(e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "admin token endpoint rejected the API key");
            return Err(FleetError::auth(
                format!("admin token endpoint returned HTTP {status}"),
                None,
            ));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FleetError::auth("failed to read admin token", Some(e)))?;
        let token = parse_admin_token(&body)?;
        debug!("admin token issued");
        Ok(token)
    }

    /// Exchange an admin token plus account credentials for a user token.
    pub async fn user_token(
        &self,
        admin: &AdminToken,
        email: &str,
        password: &str,
    ) -> FleetResult<UserToken> {
        let resp = self
            .http
            .post(self.api_url("customer-user-signin"))
            .bearer_auth(admin.as_str())
            .json(&SignInRequest { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "sign-in request failed");
                FleetError::auth("sign-in request failed", Some(e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, "sign-in rejected");
            return Err(FleetError::auth(
                format!("sign-in returned HTTP {status}"),
                None,
            ));
        }

        let body: SignInResponse = resp
            .json()
            .await
            .map_err(|e| FleetError::auth("unexpected sign-in response", Some(e)))?;
        if body.jwt_token.is_empty() {
            return Err(FleetError::auth("sign-in returned an empty token", None));
        }
        debug!("user token issued");
        Ok(UserToken(body.jwt_token))
    }
}

/// The auth endpoint answers with a bare token, a JSON string, or an object.
fn parse_admin_token(body: &str) -> FleetResult<AdminToken> {
    let body = body.trim();
    let token = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => ["token", "jwtToken", "accessToken"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string(),
        _ => body.to_string(),
    };
    if token.is_empty() {
        return Err(FleetError::auth("admin token endpoint returned no token", None));
    }
    Ok(AdminToken(token))
}
