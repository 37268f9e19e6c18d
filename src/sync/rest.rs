//! PostgREST client for the `profiles` and `custom_mode` tables.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{CustomModeDraft, CustomModeRow, CustomModeStore, SyncConfig, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Custom mode store backed by the REST API.
#[derive(Debug, Clone)]
pub struct RestCustomModeStore {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl RestCustomModeStore {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Accept", "application/json")
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, SyncError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        user_id: &str,
    ) -> Result<Vec<T>, SyncError> {
        debug!("GET {} where {}={}", table, column, user_id);
        let resp = self
            .authorize(self.client.get(self.table_url(table)))
            .query(&[(column, format!("eq.{}", user_id)), ("select", "*".to_string())])
            .send()
            .await?;
        Self::read_json(resp).await
    }
}

fn first_row(rows: Vec<CustomModeRow>) -> Result<CustomModeRow, SyncError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| SyncError::Decode("empty representation".to_string()))
}

impl CustomModeStore for RestCustomModeStore {
    async fn ensure_profile(&self, user_id: &str) -> Result<(), SyncError> {
        let existing: Vec<serde_json::Value> = self.select("profiles", "id", user_id).await?;
        if !existing.is_empty() {
            return Ok(());
        }

        debug!("Creating profile for {}", user_id);
        let resp = self
            .authorize(self.client.post(self.table_url("profiles")))
            .header("Prefer", "return=representation")
            .json(&json!({ "id": user_id }))
            .send()
            .await?;
        let _: Vec<serde_json::Value> = Self::read_json(resp).await?;
        Ok(())
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<CustomModeRow>, SyncError> {
        let rows: Vec<CustomModeRow> = self.select("custom_mode", "user_id", user_id).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(
        &self,
        user_id: &str,
        draft: &CustomModeDraft,
    ) -> Result<CustomModeRow, SyncError> {
        let mut body = serde_json::to_value(draft).map_err(|e| SyncError::Decode(e.to_string()))?;
        body["user_id"] = json!(user_id);

        let resp = self
            .authorize(self.client.post(self.table_url("custom_mode")))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        first_row(Self::read_json(resp).await?)
    }

    async fn update(
        &self,
        user_id: &str,
        draft: &CustomModeDraft,
    ) -> Result<CustomModeRow, SyncError> {
        let resp = self
            .authorize(self.client.patch(self.table_url("custom_mode")))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .header("Prefer", "return=representation")
            .json(draft)
            .send()
            .await?;
        let rows: Vec<CustomModeRow> = Self::read_json(resp).await?;
        rows.into_iter().next().ok_or(SyncError::NotFound)
    }
}
