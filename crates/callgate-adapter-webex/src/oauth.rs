//! OAuth authorization-code client for the Webex integration.

use crate::error::WebexError;
use callgate_core::AdminToken;
use serde::Deserialize;
use url::Url;

/// Client for the authorize and token endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorization_url: String,
    token_url: String,
}

/// Token endpoint response for both the code-exchange and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
    #[serde(default)]
    pub refresh_token_expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl TokenResponse {
    /// Stamp the response into a storable admin credential.
    pub fn into_admin_token(self, acquired_at: i64, session_token: String) -> AdminToken {
        AdminToken {
            expires_at: acquired_at + self.expires_in,
            acquired_at,
            access_token: self.access_token,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            refresh_token_expires_in: self.refresh_token_expires_in,
            token_type: self.token_type,
            scope: self.scope,
            session_token,
        }
    }
}

impl OAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
        }
    }

    /// Build the authorize URL the browser is redirected to.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> Result<String, WebexError> {
        let mut url = Url::parse(&self.authorization_url)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, WebexError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Obtain a fresh token pair from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, WebexError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, WebexError> {
        let response = self.http.post(&self.token_url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "token endpoint rejected the request");
            return Err(WebexError::Api { status, body });
        }
        Ok(response.json().await?)
    }
}
