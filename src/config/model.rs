//! Serde data structures for the routesync configuration file.
//!
//! Contains [`ProviderConfig`] (the root), the ordered [`Instances`]
//! collection, [`InstanceConfig`] and [`Credentials`]. Field names follow
//! the camelCase convention of the router core that consumes the
//! published snapshots.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_POLL_INTERVAL: &str = "5s";
pub const DEFAULT_FETCH_TIMEOUT: &str = "10s";

fn default_poll_interval() -> String {
    DEFAULT_POLL_INTERVAL.to_string()
}

fn default_fetch_timeout() -> String {
    DEFAULT_FETCH_TIMEOUT.to_string()
}

fn default_service() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn is_default_poll_interval(v: &str) -> bool {
    v == DEFAULT_POLL_INTERVAL
}

fn is_default_fetch_timeout(v: &str) -> bool {
    v == DEFAULT_FETCH_TIMEOUT
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(
        default = "default_poll_interval",
        skip_serializing_if = "is_default_poll_interval"
    )]
    pub poll_interval: String,

    #[serde(
        default = "default_fetch_timeout",
        skip_serializing_if = "is_default_fetch_timeout"
    )]
    pub fetch_timeout: String,

    #[serde(default)]
    pub instances: Instances,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            fetch_timeout: default_fetch_timeout(),
            instances: Instances::default(),
        }
    }
}

/// One upstream proxy to poll, and how its routers are presented locally.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstanceConfig {
    /// Base URL of the upstream's management API.
    pub api_host: String,

    /// Address traffic is forwarded to. Informational; the service
    /// descriptor is what the router core actually uses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,

    #[serde(default)]
    pub cert_resolver: String,

    /// Backend service in the router core's schema, published verbatim.
    #[serde(default = "default_service")]
    pub service: serde_json::Value,
}

impl InstanceConfig {
    #[must_use]
    pub fn new(api_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            instance_host: None,
            credentials: None,
            entry_points: Vec::new(),
            cert_resolver: String::new(),
            service: default_service(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

/// Instance collection keyed by local name, in declaration order.
///
/// Iteration order decides which instance wins a router-name collision,
/// so it must be reproducible. Deserialization keeps duplicate keys so
/// that validation can report them instead of silently dropping one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instances(Vec<(String, InstanceConfig)>);

impl Instances {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace an instance. A replaced instance keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, instance: InstanceConfig) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = instance;
        } else {
            self.0.push((name, instance));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InstanceConfig> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstanceConfig)> {
        self.0.iter().map(|(n, i)| (n.as_str(), i))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, InstanceConfig)> for Instances {
    fn from_iter<T: IntoIterator<Item = (String, InstanceConfig)>>(iter: T) -> Self {
        let mut instances = Self::new();
        for (name, instance) in iter {
            instances.insert(name, instance);
        }
        instances
    }
}

impl Serialize for Instances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, instance) in &self.0 {
            map.serialize_entry(name, instance)?;
        }
        map.end()
    }
}

struct InstancesVisitor;

impl<'de> Visitor<'de> for InstancesVisitor {
    type Value = Instances;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of instance name to instance definition")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, instance)) = access.next_entry::<String, InstanceConfig>()? {
            entries.push((name, instance));
        }
        Ok(Instances(entries))
    }

    // `instances:` with no value in YAML
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Instances::new())
    }
}

impl<'de> Deserialize<'de> for Instances {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(InstancesVisitor)
    }
}
