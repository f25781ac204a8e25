//! Thin client for the Webex REST API.

use crate::error::WebexError;
use serde::Deserialize;

/// A Webex person record (the fields this service reads).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage<T> {
    #[serde(default)]
    items: Vec<T>,
}

/// A phone number as reported by the calling configuration API.
#[derive(Debug, Clone, Deserialize)]
pub struct CallingNumber {
    #[serde(default, rename = "directNumber")]
    pub direct_number: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
struct NumbersResponse {
    #[serde(default, rename = "phoneNumbers")]
    phone_numbers: Vec<CallingNumber>,
}

/// Bearer-authenticated client for the REST API.
#[derive(Clone)]
pub struct WebexClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl WebexClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// The authenticated account's own person record.
    pub async fn me(&self) -> Result<Person, WebexError> {
        self.get_json("people/me").await
    }

    /// One person by id.
    pub async fn person(&self, person_id: &str) -> Result<Person, WebexError> {
        self.get_json(&format!("people/{person_id}")).await
    }

    /// All people in the organization with Webex Calling enabled.
    pub async fn calling_people(&self) -> Result<Vec<Person>, WebexError> {
        let page: ItemsPage<Person> = self.get_json("people?callingData=true").await?;
        Ok(page.items)
    }

    /// Phone numbers assigned to a person. An empty list is not an error.
    pub async fn person_numbers(&self, person_id: &str) -> Result<Vec<CallingNumber>, WebexError> {
        let response: NumbersResponse = self
            .get_json(&format!("telephony/config/people/{person_id}/numbers"))
            .await?;
        Ok(response.phone_numbers)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, WebexError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, endpoint, "Webex API call failed");
            return Err(WebexError::Api { status, body });
        }
        Ok(response.json().await?)
    }
}
