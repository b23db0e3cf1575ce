use reqwest::{Client, RequestBuilder, Response};

use super::{decode_rows, RemoteStore, TaskRow};
use crate::error::RemoteError;

/// Client for a hosted PostgREST table (the Supabase REST surface).
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    table: String,
    http: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .build()
            .map_err(|e| RemoteError::Unreachable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            http,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let resp = self.authorized(request).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            log::warn!("{} returned {}: {}", what, status, body);
            return Err(RemoteError::Status { status, body });
        }
        Ok(resp)
    }
}

impl RemoteStore for RestStore {
    async fn fetch_all(&self) -> Result<Vec<TaskRow>, RemoteError> {
        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "updated_at.desc")]);
        let resp = self.send(request, "SELECT").await?;
        let body = resp.text().await?;
        let rows = decode_rows(&body)?;
        log::debug!("Fetched {} rows from {}", rows.len(), self.table);
        Ok(rows)
    }

    async fn insert(&self, row: &TaskRow) -> Result<(), RemoteError> {
        let request = self
            .http
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(request, "INSERT").await?;
        Ok(())
    }

    async fn update(&self, row: &TaskRow) -> Result<(), RemoteError> {
        let request = self
            .http
            .patch(self.table_url())
            .query(&[("id", format!("eq.{}", row.id))])
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(request, "UPDATE").await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let request = self
            .http
            .delete(self.table_url())
            .query(&[("id", format!("eq.{}", id))]);
        self.send(request, "DELETE").await?;
        Ok(())
    }
}
