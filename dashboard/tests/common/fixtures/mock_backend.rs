//! Mock traffic backend for testing
//!
//! A wiremock server answering the `/api/db/...` routes the gateway calls.
//! Every `mock_*` helper takes the number of requests it must see; the
//! server verifies those counts when it is dropped at the end of the test.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use dashboard::{Config, HttpGateway, ServicesStore, Session};

use super::test_data::{self, TOKEN};

pub struct MockBackend {
    pub server: MockServer,
    pub base_url: String,
    temp_dir: TempDir,
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "message": "ok",
        "data": data
    }))
}

fn rejected(status: u16, error: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "success": false,
        "error": error
    }))
}

impl MockBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            server,
            base_url,
            temp_dir,
        }
    }

    /// Config pointing at the mock with retries disabled.
    pub fn config(&self) -> Config {
        let mut config = Config::with_base_url(self.base_url.clone());
        config.token_path = self.token_path().display().to_string();
        config.max_retries = 0;
        config.retry_backoff_millis = 10;
        config.request_timeout_seconds = 5;
        config
    }

    pub fn token_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("auth_token")
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::new(Session::with_token(self.token_path(), Some(TOKEN.to_string())))
    }

    pub fn gateway_with(&self, config: &Config, session: Arc<Session>) -> Arc<HttpGateway> {
        Arc::new(HttpGateway::new(config, session).expect("Failed to build gateway"))
    }

    pub fn gateway(&self) -> Arc<HttpGateway> {
        self.gateway_with(&self.config(), self.session())
    }

    pub fn store(&self) -> ServicesStore {
        ServicesStore::from_config(self.gateway(), &self.config())
    }

    pub fn store_arc(&self) -> Arc<ServicesStore> {
        Arc::new(self.store())
    }

    pub fn encoded(segment: &str) -> String {
        urlencoding::encode(segment).into_owned()
    }

    /// Mock the service list
    pub async fn mock_services(&self, services: Value, expected: u64) {
        self.mock_services_delayed(services, expected, Duration::ZERO)
            .await;
    }

    pub async fn mock_services_delayed(&self, services: Value, expected: u64, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/api/db/services"))
            .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ok(services).set_delay(delay))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Mock the sample two-service list
    pub async fn mock_sample_services(&self, expected: u64) {
        self.mock_services(test_data::service_list(), expected).await;
    }

    pub async fn mock_service_detail(&self, id: i64, payload: Value, expected: u64) {
        self.mock_service_detail_delayed(id, payload, expected, Duration::ZERO)
            .await;
    }

    pub async fn mock_service_detail_delayed(
        &self,
        id: i64,
        payload: Value,
        expected: u64,
        delay: Duration,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/services/{}/traffic", id)))
            .and(query_param("days", "7"))
            .respond_with(ok(payload).set_delay(delay))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_service_detail_failure(&self, id: i64, expected: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/services/{}/traffic", id)))
            .respond_with(rejected(500, "获取服务流量失败: database is locked"))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_port_detail(&self, id: i64, tag: &str, expected: u64) {
        self.mock_port_detail_delayed(id, tag, expected, Duration::ZERO)
            .await;
    }

    pub async fn mock_port_detail_delayed(&self, id: i64, tag: &str, expected: u64, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/port-detail/{}/{}", id, Self::encoded(tag))))
            .and(query_param("days", "7"))
            .respond_with(ok(test_data::port_payload(id, tag)).set_delay(delay))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Port detail that succeeds `times` times, to be followed by another mock.
    pub async fn mock_port_detail_once(&self, id: i64, tag: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/port-detail/{}/{}", id, Self::encoded(tag))))
            .respond_with(ok(test_data::port_payload(id, tag)))
            .up_to_n_times(times)
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_port_detail_failure(&self, id: i64, tag: &str, expected: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/port-detail/{}/{}", id, Self::encoded(tag))))
            .respond_with(rejected(404, "端口信息不存在"))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_user_detail(&self, id: i64, email: &str, expected: u64) {
        self.mock_user_detail_delayed(id, email, expected, Duration::ZERO)
            .await;
    }

    pub async fn mock_user_detail_delayed(&self, id: i64, email: &str, expected: u64, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(format!("/api/db/user-detail/{}/{}", id, Self::encoded(email))))
            .and(query_param("days", "7"))
            .respond_with(ok(test_data::user_payload(id, email)).set_delay(delay))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Mount list, details, ports and clients of the sample topology, each
    /// expected `expected` times.
    pub async fn mock_sample_topology(&self, expected: u64) {
        self.mock_sample_services(expected).await;
        for (id, tags, emails) in test_data::topology() {
            self.mock_service_detail(id, test_data::detail_payload(id, &tags, &emails), expected)
                .await;
            for tag in tags {
                self.mock_port_detail(id, tag, expected).await;
            }
            for email in emails {
                self.mock_user_detail(id, email, expected).await;
            }
        }
    }

    pub async fn mock_delete(&self, id: i64, success: bool, expected: u64) {
        let response = if success {
            ok(json!({ "deleted_service_id": id }))
        } else {
            rejected(500, "删除服务失败: service is busy")
        };
        Mock::given(method("DELETE"))
            .and(path(format!("/api/db/services/{}", id)))
            .respond_with(response)
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_rename(&self, route: String, custom_name: &str, expected: u64) {
        Mock::given(method("PUT"))
            .and(path(route))
            .and(body_json(json!({ "custom_name": custom_name })))
            .respond_with(ok(json!({})))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_download(&self, route: String, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/csv")
                    .set_body_bytes(body.to_vec()),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Any request answered with 401
    pub async fn mock_unauthorized(&self) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": "未授权"
            })))
            .mount(&self.server)
            .await;
    }
}
