// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


use crate::errors::{HaError, HaResult};
use crate::types::{HaEntityState, HaStateUpdate, HaTemplateRequest};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Home Assistant REST API client
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Create a new HA client with custom configuration
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Create HA client using Supervisor API environment variables
    /// This is the standard method for HA addons
    pub fn from_supervisor() -> HaResult<Self> {
        let base_url = "http://supervisor/core";
        let token = std::env::var("SUPERVISOR_TOKEN").map_err(|_| {
            HaError::ConfigError(
                "SUPERVISOR_TOKEN environment variable not set. Are you running as an HA addon?"
                    .to_owned(),
            )
        })?;

        info!("Initializing HA client using Supervisor API");
        Self::new(base_url, token)
    }

    /// Create HA client from configuration values
    /// Falls back to environment variables if config values are not set
    pub fn from_config(ha_base_url: Option<String>, ha_token: Option<String>) -> HaResult<Self> {
        let base_url = ha_base_url
            .or_else(|| std::env::var("HA_BASE_URL").ok())
            .unwrap_or_else(|| "http://localhost:8123".to_owned());

        let token = ha_token
            .or_else(|| std::env::var("HA_TOKEN").ok())
            .ok_or_else(|| {
                HaError::ConfigError(
                    "HA token not found in config or HA_TOKEN environment variable".to_owned(),
                )
            })?;

        info!("Initializing HA client from configuration: {}", base_url);
        Self::new(base_url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn state_url(&self, entity_id: &str) -> String {
        format!(
            "{}/api/states/{}",
            self.base_url,
            urlencoding::encode(entity_id)
        )
    }

    /// Get the state of a specific entity
    pub async fn get_state(&self, entity_id: &str) -> HaResult<HaEntityState> {
        let url = self.state_url(entity_id);
        debug!("🔍 [HA QUERY] Getting state for entity: {}", entity_id);
        debug!("   URL: {}", url);

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => {
                let state = response.json::<HaEntityState>().await?;
                debug!("✅ [HA RESULT] Entity: {} = '{}'", entity_id, state.state);
                trace!("   Attributes: {:?}", state.attributes);
                trace!("   Last updated: {}", state.last_updated);
                Ok(state)
            }
            StatusCode::NOT_FOUND => {
                warn!("⚠️ [HA QUERY] Entity not found: {}", entity_id);
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!(
                    "❌ [HA ERROR] Authentication failed for entity: {}",
                    entity_id
                );
                Err(HaError::AuthenticationFailed)
            }
            status => Err(api_error(status, response).await),
        }
    }

    /// Create or overwrite an entity state
    ///
    /// HA answers 201 when the entity is new and 200 when it was updated.
    pub async fn set_state(&self, entity_id: &str, state: &str, attributes: Value) -> HaResult<()> {
        let url = self.state_url(entity_id);
        let body = HaStateUpdate { state, attributes };
        debug!("📝 [HA STATE] Setting {} = '{}'", entity_id, state);
        trace!("   Attributes: {:?}", body.attributes);

        let response = self
            .retry_request(|| async {
                self.client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&body)
                    .send()
                    .await
            })
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                debug!("✅ [HA STATE] Updated: {}", entity_id);
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA STATE] Authentication failed for: {}", entity_id);
                Err(HaError::AuthenticationFailed)
            }
            status => Err(api_error(status, response).await),
        }
    }

    /// Render a Jinja template on the HA side and return the raw output
    pub async fn render_template(&self, template: &str) -> HaResult<String> {
        let url = format!("{}/api/template", self.base_url);
        let body = HaTemplateRequest { template };
        debug!("🧩 [HA TEMPLATE] Rendering: {}", template);

        let response = self
            .retry_request(|| async {
                self.client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&body)
                    .send()
                    .await
            })
            .await?;

        match response.status() {
            StatusCode::OK => {
                let output = response.text().await?;
                trace!("   Output: '{}'", output);
                Ok(output)
            }
            StatusCode::BAD_REQUEST => {
                let message = response.text().await.unwrap_or_default();
                warn!("⚠️ [HA TEMPLATE] Rejected '{}': {}", template, message);
                Err(HaError::TemplateError(message))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HaError::AuthenticationFailed),
            status => Err(api_error(status, response).await),
        }
    }

    /// Health check - ping HA API
    pub async fn ping(&self) -> HaResult<bool> {
        let url = format!("{}/api/", self.base_url);
        debug!("Performing health check");

        match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) => {
                let is_ok = response.status().is_success();
                if is_ok {
                    debug!("Health check passed");
                } else {
                    warn!("Health check failed: status {}", response.status());
                }
                Ok(is_ok)
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false) // Don't error on health check failure
            }
        }
    }

    /// Get Home Assistant configuration (including timezone)
    pub async fn get_config(&self) -> HaResult<Value> {
        let url = format!("{}/api/config", self.base_url);
        debug!("Fetching Home Assistant configuration");

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => {
                let config = response.json::<Value>().await?;
                debug!("✅ Retrieved HA configuration");
                Ok(config)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HaError::AuthenticationFailed),
            status => Err(api_error(status, response).await),
        }
    }

    /// Get Home Assistant timezone
    pub async fn get_timezone(&self) -> HaResult<String> {
        let config = self.get_config().await?;

        config
            .get("time_zone")
            .and_then(Value::as_str)
            .map(|tz| {
                info!("🌍 Home Assistant timezone: {}", tz);
                tz.to_owned()
            })
            .ok_or_else(|| HaError::ParseError("time_zone not found in HA config".to_owned()))
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> HaResult<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Request failed after {} attempts: {}", attempts, e);
                    return Err(HaError::HttpError(e));
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Set custom retry configuration
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> HaError {
    let message = response.text().await.unwrap_or_default();
    error!("❌ [HA ERROR] Status {}: {}", status, message);
    HaError::ApiError {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn entity_body(entity_id: &str, attributes: Value) -> String {
        json!({
            "entity_id": entity_id,
            "state": "1.25",
            "attributes": attributes,
            "last_changed": "2025-10-02T10:00:00+00:00",
            "last_updated": "2025-10-02T10:00:00+00:00"
        })
        .to_string()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = HomeAssistantClient::new("http://homeassistant.local:8123/", "token").unwrap();
        assert_eq!(client.base_url(), "http://homeassistant.local:8123");
    }

    #[tokio::test]
    async fn test_get_state_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.spot_price")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(entity_body(
                "sensor.spot_price",
                json!({"raw_today": [{"hour": "2025-10-02T00:00:00+02:00", "price": 1.25}]}),
            ))
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let state = client.get_state("sensor.spot_price").await.unwrap();

        assert_eq!(state.entity_id, "sensor.spot_price");
        assert_eq!(state.state, "1.25");
        assert!(state.attributes["raw_today"].is_array());
        assert_eq!(state.last_updated, "2025-10-02T10:00:00+00:00");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.nonexistent")
            .match_header("authorization", "Bearer test_token")
            .with_status(404)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_state("sensor.nonexistent").await;

        assert!(matches!(result, Err(HaError::EntityNotFound(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.spot_price")
            .with_status(401)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "bad_token").unwrap();
        let result = client.get_state("sensor.spot_price").await;

        assert!(matches!(result, Err(HaError::AuthenticationFailed)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_state_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/binary_sensor.price_window")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({
                "state": "on",
                "attributes": {"friendly_name": "Price Window"}
            })))
            .with_status(201)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(format!("{}/", server.url()), "test_token").unwrap();
        let result = client
            .set_state(
                "binary_sensor.price_window",
                "on",
                json!({"friendly_name": "Price Window"}),
            )
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_state_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/binary_sensor.price_window")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client
            .set_state("binary_sensor.price_window", "off", json!({}))
            .await;

        assert!(matches!(
            result,
            Err(HaError::ApiError { status: 500, ref message }) if message == "boom"
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_render_template() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/template")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({
                "template": "{{ states('input_number.hours') }}"
            })))
            .with_status(200)
            .with_body("2.5")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let output = client
            .render_template("{{ states('input_number.hours') }}")
            .await
            .unwrap();

        assert_eq!(output, "2.5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_render_template_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/template")
            .with_status(400)
            .with_body("Error rendering template: UndefinedError")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.render_template("{{ nope() }}").await;

        assert!(matches!(result, Err(HaError::TemplateError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_timezone() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/config")
            .with_status(200)
            .with_body(json!({"time_zone": "Europe/Prague", "version": "2025.10.0"}).to_string())
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        assert_eq!(client.get_timezone().await.unwrap(), "Europe/Prague");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_timezone_missing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/config")
            .with_status(200)
            .with_body(json!({"version": "2025.10.0"}).to_string())
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        assert!(matches!(
            client.get_timezone().await,
            Err(HaError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_ping_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.ping().await.unwrap();

        assert!(result);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_unreachable_host() {
        // Nothing listens on port 9 (discard) in the test environment
        let client = HomeAssistantClient::new("http://127.0.0.1:9", "test_token")
            .unwrap()
            .with_retry_config(2, Duration::from_millis(10));

        let result = client.get_state("sensor.spot_price").await;
        assert!(matches!(result, Err(HaError::HttpError(_))));
    }
}
