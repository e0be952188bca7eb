//! REST / Storage バックエンドのクライアント
//!
//! PostgREST形式のテーブル・RPCと、オブジェクトストレージを1つのクライアントで扱う。

use crate::config::Config;
use crate::error::Result;
use crate::services::{MediaStore, PersistenceService, ServiceError, ServiceResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use spot_share_common::{NewSpot, Spot, SpotId};
use std::time::Duration;
use tracing::debug;

pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: SpotId,
}

impl SupabaseClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        bucket: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.get_project_url()?,
            &config.get_api_key()?,
            &config.spots_table,
            &config.image_bucket,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn object_url(&self, object_name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, object_name)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// 非2xxレスポンスを `ServiceError` に変換
async fn check(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.to_string());
    Err(ServiceError::with_status(status.as_u16(), message))
}

/// エラーボディからメッセージを抽出
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[async_trait]
impl PersistenceService for SupabaseClient {
    async fn select_spots(&self) -> ServiceResult<Vec<Spot>> {
        let url = self.rest_url(&self.table);
        let response = self
            .authed(self.http.get(&url))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn insert_spot(&self, spot: &NewSpot) -> ServiceResult<SpotId> {
        let url = self.rest_url(&self.table);
        debug!(%url, "inserting spot");
        let response = self
            .authed(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(&[spot])
            .send()
            .await?;

        let rows: Vec<InsertedRow> = check(response).await?.json().await?;
        rows.first()
            .map(|row| row.id)
            .ok_or_else(|| ServiceError::new("insert returned no rows"))
    }

    async fn rpc_strings(&self, procedure: &str) -> ServiceResult<Vec<String>> {
        let url = self.rest_url(&format!("rpc/{}", procedure));
        let response = self
            .authed(self.http.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl MediaStore for SupabaseClient {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control_secs: u32,
    ) -> ServiceResult<()> {
        let url = self.object_url(object_name);
        debug!(%url, size = bytes.len(), "uploading object");
        let response = self
            .authed(self.http.post(&url))
            .header("content-type", content_type)
            .header("cache-control", format!("max-age={}", cache_control_secs))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> Option<String> {
        let raw = format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, object_name
        );
        reqwest::Url::parse(&raw).ok().map(|url| url.to_string())
    }
}
