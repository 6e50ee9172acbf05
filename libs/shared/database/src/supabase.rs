use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::{StoreError, StoreResult};

/// PostgREST error code for unique violations.
const UNIQUE_VIOLATION: &str = "23505";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| StoreError::Backend(format!("Invalid API key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.anon_key))
            .map_err(|e| StoreError::Backend(format!("Invalid API key header: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(&'static str, &'static str)],
    ) -> StoreResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        for (name, value) in extra_headers {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("API error ({}): {}", status, error_text);

        Err(match status.as_u16() {
            409 => StoreError::Conflict(conflict_message(&error_text)),
            404 => StoreError::NotFound("Resource".to_string()),
            _ if error_text.contains(UNIQUE_VIOLATION) => StoreError::Conflict(conflict_message(&error_text)),
            _ => StoreError::Backend(format!("API error ({}): {}", status, error_text)),
        })
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, &[("prefer", "return=representation")])
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(&'static str, &'static str)],
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid response body: {}", e)))
    }

    /// GET with `Prefer: count=exact`, returning rows and the total from `Content-Range`.
    pub async fn request_with_count<T>(&self, path: &str) -> StoreResult<(T, u64)>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(Method::GET, path, None, &[("prefer", "count=exact")])
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|range| range.rsplit('/').next())
            .and_then(|total| total.parse::<u64>().ok())
            .unwrap_or(0);

        let rows = response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid response body: {}", e)))?;

        Ok((rows, total))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn conflict_message(error_text: &str) -> String {
    serde_json::from_str::<Value>(error_text)
        .ok()
        .and_then(|v| v.get("details").or_else(|| v.get("message")).and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| "Duplicate record".to_string())
}
