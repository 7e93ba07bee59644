//! Records exchanged with the traffic backend.
//!
//! The backend is loose about shapes: empty collections come back as `null`
//! and the service list and service detail endpoints return different
//! attribute sets for the same service. [`Service`] therefore keeps typed
//! collections plus an open attribute map, and detail payloads are
//! shallow-merged onto it with [`Service::merged_with`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type ServiceId = i64;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inbound_traffics: Vec<InboundTraffic>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_traffics: Vec<ClientTraffic>,
    /// Everything else the backend reported (`service_name`, `ip_address`,
    /// counters, the nested `service` record of a detail payload, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundTraffic {
    pub tag: String,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub up: i64,
    #[serde(default)]
    pub down: i64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTraffic {
    pub email: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub up: i64,
    #[serde(default)]
    pub down: i64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of a per-day traffic history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyTraffic {
    pub date: String,
    pub daily_up: i64,
    pub daily_down: i64,
    pub total_daily: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortInfo {
    pub ip_address: String,
    pub service_name: String,
    pub tag: String,
    pub port: i64,
    pub total_up: i64,
    pub total_down: i64,
    pub last_seen: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDetail {
    pub port_info: PortInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<DailyTraffic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub ip_address: String,
    pub service_name: String,
    pub email: String,
    pub inbound_tag: String,
    pub total_up: i64,
    pub total_down: i64,
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    pub user_info: UserInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<DailyTraffic>,
}

impl Service {
    /// Record carrying nothing but the id; base of last resort for a merge.
    pub fn bare(id: ServiceId) -> Self {
        Self {
            id,
            inbound_traffics: Vec::new(),
            client_traffics: Vec::new(),
            attributes: Map::new(),
        }
    }

    /// Shallow merge: every key of `patch` replaces the same key of `self`
    /// (an explicit `null` included), keys missing from `patch` keep their
    /// current value.
    pub fn merged_with(&self, patch: &Map<String, Value>) -> Result<Service, serde_json::Error> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        // The id is the identity of the record, a payload never moves it.
        merged.insert("id".to_string(), Value::from(self.id));
        serde_json::from_value(Value::Object(merged))
    }

    /// Custom name when set, otherwise the server-reported name.
    pub fn display_name(&self) -> String {
        let pick = |key: &str| {
            self.attributes
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        pick("custom_name")
            .or_else(|| pick("service_name"))
            .unwrap_or_else(|| format!("service-{}", self.id))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.inbound_traffics.iter().map(|i| i.tag.as_str())
    }

    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.client_traffics.iter().map(|c| c.email.as_str())
    }
}
