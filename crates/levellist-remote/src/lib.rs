// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use levellist_app::{Dataset, DatasetSource, GatewayError, RemoteStore, Row};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Reported when the endpoint answers `ok: false` without an error message.
pub const SAVE_REJECTED: &str = "保存に失敗しました";

/// Blocking client for the shared dataset endpoint. `GET` returns the
/// dataset, `POST` replaces it and answers with `{"ok": bool}`.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            bail!("source.url must not be empty");
        }
        let endpoint =
            Url::parse(trimmed).with_context(|| format!("parse endpoint URL {trimmed:?}"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!(
                "endpoint {trimmed:?} uses unsupported scheme {:?}; use http or https",
                endpoint.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            endpoint,
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_dataset(&self) -> std::result::Result<Dataset, GatewayError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .map_err(|error| GatewayError::LoadFailed(connection_error(self.endpoint(), &error)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::LoadFailed(clean_error_response(status, &body)));
        }

        let dataset: Dataset = response.json().map_err(|error| {
            GatewayError::LoadFailed(format!("decode dataset from {}: {error}", self.endpoint))
        })?;
        debug!(
            endpoint = %self.endpoint,
            headers = dataset.headers.len(),
            rows = dataset.rows.len(),
            "fetched dataset"
        );
        Ok(dataset)
    }

    pub fn push_dataset(
        &self,
        headers: &[String],
        rows: &[Row],
    ) -> std::result::Result<(), GatewayError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&SaveRequest { headers, rows })
            .send()
            .map_err(|error| {
                GatewayError::RemoteSaveFailed(connection_error(self.endpoint(), &error))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::RemoteSaveFailed(clean_error_response(
                status, &body,
            )));
        }

        let ack: SaveAck = response.json().map_err(|error| {
            GatewayError::RemoteSaveFailed(format!("unreadable save acknowledgement: {error}"))
        })?;
        if !ack.ok {
            let detail = ack
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| SAVE_REJECTED.to_owned());
            return Err(GatewayError::RemoteSaveFailed(detail));
        }

        info!(endpoint = %self.endpoint, rows = rows.len(), "remote save acknowledged");
        Ok(())
    }
}

impl DatasetSource for Client {
    fn identity(&self) -> String {
        self.endpoint.path().to_owned()
    }

    fn load(&mut self) -> Result<Dataset> {
        Ok(self.fetch_dataset()?)
    }
}

impl RemoteStore for Client {
    fn save_remote(&mut self, headers: &[String], rows: &[Row]) -> Result<()> {
        Ok(self.push_dataset(headers, rows)?)
    }
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    headers: &'a [String],
    rows: &'a [Row],
}

#[derive(Debug, Deserialize)]
struct SaveAck {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn connection_error(endpoint: &str, error: &reqwest::Error) -> String {
    if error.is_timeout() {
        return format!("{endpoint} did not answer in time ({error})");
    }
    format!("cannot reach {endpoint} -- check [source].url and your network ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return format!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return format!("server error ({}): {}", status.as_u16(), body.trim());
    }

    format!("server returned {}", status.as_u16())
}
