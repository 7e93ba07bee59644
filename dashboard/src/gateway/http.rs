use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, warn};

use super::{Gateway, GatewayResult};
use crate::config::Config;
use crate::constants::http::{API_PREFIX, CONNECT_TIMEOUT_SECONDS, MAX_RETRY_DELAY_MILLIS};
use crate::errors::GatewayError;
use crate::models::{PortDetail, Service, ServiceId, UserDetail};
use crate::session::Session;

/// Response envelope used by every JSON route of the backend.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
    error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn failure_message(self) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

pub struct HttpGateway {
    base_url: String,
    client: Client,
    session: Arc<Session>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpGateway {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            session,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_millis),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send one request, retrying transient failures with a doubling backoff
    /// capped at [`MAX_RETRY_DELAY_MILLIS`]. A 401 clears the session.
    async fn send(&self, method: Method, endpoint: &str, body: Option<&Value>) -> GatewayResult<Response> {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, endpoint);
        let mut attempt = 0u32;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(token) = self.session.token().await {
                request = request.header("Authorization", format!("Bearer {}", token));
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("{} {} (attempt {})", method, endpoint, attempt + 1);

            let err = match request.send().await {
                Ok(response) if response.status() == StatusCode::UNAUTHORIZED => {
                    warn!("{} {} returned 401, clearing session", method, endpoint);
                    if let Err(e) = self.session.clear().await {
                        error!("Failed to clear session after 401: {}", e);
                    }
                    GatewayError::Unauthorized {
                        endpoint: endpoint.to_string(),
                    }
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => GatewayError::Timeout {
                    endpoint: endpoint.to_string(),
                },
                Err(e) => GatewayError::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                },
            };

            if !err.is_transient() || attempt >= self.max_retries {
                return Err(err);
            }

            let delay = retry_delay(self.retry_backoff, attempt);
            warn!("{} (retrying in {}ms)", err, delay.as_millis());
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Decode the envelope; `Ok(None)` when the backend sent `data: null`.
    async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> GatewayResult<Option<T>> {
        let response = self.send(method, endpoint, body).await?;
        let status = response.status();

        let envelope: ApiEnvelope<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(GatewayError::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(GatewayError::Rejected {
                    endpoint: endpoint.to_string(),
                    message: format!("HTTP {}", status),
                })
            }
        };

        if !envelope.success || !status.is_success() {
            return Err(GatewayError::Rejected {
                endpoint: endpoint.to_string(),
                message: envelope.failure_message(),
            });
        }

        Ok(envelope.data)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> GatewayResult<T> {
        self.request_data(method, endpoint, body)
            .await?
            .ok_or_else(|| GatewayError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "missing data field".to_string(),
            })
    }

    /// For routes where only the `success` flag matters.
    async fn request_ack(&self, method: Method, endpoint: &str, body: Option<&Value>) -> GatewayResult<()> {
        let response = self.send(method, endpoint, body).await?;
        let status = response.status();

        let envelope: ApiEnvelope<Value> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(GatewayError::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(GatewayError::Rejected {
                    endpoint: endpoint.to_string(),
                    message: format!("HTTP {}", status),
                })
            }
        };

        if envelope.success && status.is_success() {
            Ok(())
        } else {
            Err(GatewayError::Rejected {
                endpoint: endpoint.to_string(),
                message: envelope.failure_message(),
            })
        }
    }

    async fn request_bytes(&self, endpoint: &str) -> GatewayResult<Vec<u8>> {
        let response = self.send(Method::GET, endpoint, None).await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ApiEnvelope<Value>>().await {
                Ok(envelope) => envelope.failure_message(),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(GatewayError::Rejected {
                endpoint: endpoint.to_string(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| GatewayError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Backoff before retry number `attempt + 1`.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(Duration::from_millis(MAX_RETRY_DELAY_MILLIS))
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_services(&self) -> GatewayResult<Vec<Service>> {
        // An empty table is reported as `data: null`.
        let services: Option<Vec<Service>> =
            self.request_data(Method::GET, "/db/services", None).await?;
        Ok(services.unwrap_or_default())
    }

    async fn service_detail(
        &self,
        service_id: ServiceId,
        window_days: u32,
    ) -> GatewayResult<Map<String, Value>> {
        let endpoint = format!("/db/services/{}/traffic?days={}", service_id, window_days);
        self.request_json(Method::GET, &endpoint, None).await
    }

    async fn port_detail(
        &self,
        service_id: ServiceId,
        tag: &str,
        window_days: u32,
    ) -> GatewayResult<PortDetail> {
        let endpoint = format!(
            "/db/port-detail/{}/{}?days={}",
            service_id,
            segment(tag),
            window_days
        );
        self.request_json(Method::GET, &endpoint, None).await
    }

    async fn user_detail(
        &self,
        service_id: ServiceId,
        email: &str,
        window_days: u32,
    ) -> GatewayResult<UserDetail> {
        let endpoint = format!(
            "/db/user-detail/{}/{}?days={}",
            service_id,
            segment(email),
            window_days
        );
        self.request_json(Method::GET, &endpoint, None).await
    }

    async fn delete_service(&self, service_id: ServiceId) -> GatewayResult<()> {
        let endpoint = format!("/db/services/{}", service_id);
        self.request_ack(Method::DELETE, &endpoint, None).await
    }

    async fn rename_service(&self, service_id: ServiceId, custom_name: &str) -> GatewayResult<()> {
        let endpoint = format!("/db/services/{}/custom-name", service_id);
        let body = json!({ "custom_name": custom_name });
        self.request_ack(Method::PUT, &endpoint, Some(&body)).await
    }

    async fn rename_inbound(
        &self,
        service_id: ServiceId,
        tag: &str,
        custom_name: &str,
    ) -> GatewayResult<()> {
        let endpoint = format!("/db/inbound/{}/{}/custom-name", service_id, segment(tag));
        let body = json!({ "custom_name": custom_name });
        self.request_ack(Method::PUT, &endpoint, Some(&body)).await
    }

    async fn rename_client(
        &self,
        service_id: ServiceId,
        email: &str,
        custom_name: &str,
    ) -> GatewayResult<()> {
        let endpoint = format!("/db/client/{}/{}/custom-name", service_id, segment(email));
        let body = json!({ "custom_name": custom_name });
        self.request_ack(Method::PUT, &endpoint, Some(&body)).await
    }

    async fn download_port_history(
        &self,
        service_id: ServiceId,
        tag: &str,
    ) -> GatewayResult<Vec<u8>> {
        let endpoint = format!("/db/download/port-history/{}/{}", service_id, segment(tag));
        self.request_bytes(&endpoint).await
    }

    async fn download_user_history(
        &self,
        service_id: ServiceId,
        email: &str,
    ) -> GatewayResult<Vec<u8>> {
        let endpoint = format!("/db/download/user-history/{}/{}", service_id, segment(email));
        self.request_bytes(&endpoint).await
    }
}
