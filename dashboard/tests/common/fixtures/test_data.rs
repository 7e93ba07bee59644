//! Common test data and payload builders

use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

/// Two services: #1 with two ports and two clients, #2 with one of each
pub mod services {
    pub const EDGE_1: i64 = 1;
    pub const EDGE_2: i64 = 2;
}

pub mod tags {
    pub const HTTPS: &str = "inbound-443";
    pub const ALT_HTTPS: &str = "inbound-8443";
    pub const HTTP: &str = "inbound-80";
}

pub mod emails {
    pub const ALICE: &str = "alice@example.com";
    pub const BOB: &str = "bob@example.com";
    pub const CAROL: &str = "carol@example.com";
}

/// Ports and clients of each sample service.
pub fn topology() -> Vec<(i64, Vec<&'static str>, Vec<&'static str>)> {
    vec![
        (
            services::EDGE_1,
            vec![tags::HTTPS, tags::ALT_HTTPS],
            vec![emails::ALICE, emails::BOB],
        ),
        (services::EDGE_2, vec![tags::HTTP], vec![emails::CAROL]),
    ]
}

/// Shallow record as returned by the service list.
pub fn list_record(id: i64) -> Value {
    json!({
        "id": id,
        "ip_address": format!("10.0.{}.*", id),
        "service_name": format!("edge-{}", id),
        "custom_name": "",
        "last_seen": "2024-05-01 12:00:00",
        "status": "active",
        "inbound_count": 0,
        "client_count": 0
    })
}

pub fn service_list() -> Value {
    Value::Array(topology().iter().map(|(id, _, _)| list_record(*id)).collect())
}

/// Detail payload shaped like `/db/services/{id}/traffic`.
pub fn detail_payload(id: i64, tags: &[&str], emails: &[&str]) -> Value {
    let inbound: Vec<Value> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            json!({
                "id": i + 1,
                "service_id": id,
                "tag": tag,
                "port": tag.trim_start_matches("inbound-").parse::<i64>().unwrap_or(0),
                "custom_name": "",
                "up": 1024 * (i as i64 + 1),
                "down": 2048 * (i as i64 + 1),
                "last_updated": "2024-05-01T12:00:00Z",
                "status": "active"
            })
        })
        .collect();
    let clients: Vec<Value> = emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            json!({
                "id": i + 1,
                "service_id": id,
                "email": email,
                "custom_name": "",
                "up": 100,
                "down": 200,
                "last_updated": "2024-05-01T12:00:00Z",
                "status": "active"
            })
        })
        .collect();

    json!({
        "service": {"id": id, "status": "active", "first_seen": "2024-04-01T00:00:00Z"},
        "inbound_traffics": inbound,
        "client_traffics": clients
    })
}

pub fn history() -> Value {
    json!([
        {"date": "2024-05-01", "daily_up": 10, "daily_down": 20, "total_daily": 30},
        {"date": "2024-04-30", "daily_up": 5, "daily_down": 5, "total_daily": 10}
    ])
}

pub fn port_payload(id: i64, tag: &str) -> Value {
    json!({
        "port_info": {
            "ip_address": format!("10.0.{}.*", id),
            "service_name": format!("edge-{}", id),
            "tag": tag,
            "port": 443,
            "total_up": 1024,
            "total_down": 2048,
            "last_seen": "2024-05-01T12:00:00Z",
            "is_active": true
        },
        "history": history()
    })
}

pub fn user_payload(id: i64, email: &str) -> Value {
    json!({
        "user_info": {
            "ip_address": format!("10.0.{}.*", id),
            "service_name": format!("edge-{}", id),
            "email": email,
            "inbound_tag": "inbound-443",
            "total_up": 100,
            "total_down": 200,
            "last_seen": "2024-05-01T12:00:00Z"
        },
        "history": history(),
        "debug": {"row_count": 2}
    })
}
