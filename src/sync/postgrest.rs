use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::models::UserId;
use crate::sync::{RemoteRow, RemoteStore, SyncError};

/// Row-per-user table behind a PostgREST endpoint (as hosted by Supabase).
pub struct PostgrestRemote {
    http: Client,
    base_url: String,
    table: String,
    api_key: String,
}

impl PostgrestRemote {
    pub fn new(base_url: &str, table: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            api_key,
        })
    }

    /// Build a client from the `[sync]` section, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            anyhow::bail!("[sync] url is empty");
        }
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("Reading API key from ${}", config.api_key_env))?;
        Self::new(
            &config.url,
            &config.table,
            api_key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn check_response(response: Response) -> Result<Response, SyncError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Err(SyncError::Status { status, body })
    }

    fn check_response_json<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        let text = Self::check_response(response)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl RemoteStore for PostgrestRemote {
    fn fetch(&self, user: &UserId) -> Result<Option<RemoteRow>, SyncError> {
        let response = self
            .http
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("user_id", format!("eq.{}", user)),
                ("select", "*".to_string()),
            ])
            .send()?;
        let rows: Vec<RemoteRow> = Self::check_response_json(response)?;
        Ok(rows.into_iter().next())
    }

    fn upsert(&self, row: &RemoteRow) -> Result<(), SyncError> {
        let response = self
            .http
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", "user_id")])
            .json(row)
            .send()?;
        Self::check_response(response)?;
        Ok(())
    }

    fn delete(&self, user: &UserId) -> Result<(), SyncError> {
        let response = self
            .http
            .delete(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("user_id", format!("eq.{}", user))])
            .send()?;
        Self::check_response(response)?;
        Ok(())
    }
}
