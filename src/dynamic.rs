//! Dynamic configuration snapshot published to the router core.
//!
//! Only [`HttpConfiguration::routers`] and [`HttpConfiguration::services`]
//! are ever populated. The remaining sections exist because the consumer's
//! schema requires them to be present, so they always serialize as empty
//! objects rather than being omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque section entries this crate never populates.
pub type Opaque = serde_json::Value;

/// One complete, self-consistent configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub http: HttpConfiguration,
    pub tcp: TcpConfiguration,
    pub udp: UdpConfiguration,
    pub tls: TlsConfiguration,
}

impl Configuration {
    /// An empty snapshot with every section present.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn router_count(&self) -> usize {
        self.http.routers.len()
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.http.services.len()
    }

    /// Routers whose `service` has no entry in the service mapping.
    pub fn dangling_routers(&self) -> impl Iterator<Item = (&str, &Router)> {
        self.http
            .routers
            .iter()
            .filter(|(_, r)| !self.http.services.contains_key(&r.service))
            .map(|(n, r)| (n.as_str(), r))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfiguration {
    pub routers: BTreeMap<String, Router>,
    pub middlewares: BTreeMap<String, Opaque>,
    /// Service descriptors, passed through verbatim from instance config.
    pub services: BTreeMap<String, serde_json::Value>,
    pub servers_transports: BTreeMap<String, Opaque>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,
    pub service: String,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouterTls>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterTls {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_resolver: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpConfiguration {
    pub routers: BTreeMap<String, Opaque>,
    pub services: BTreeMap<String, Opaque>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UdpConfiguration {
    pub routers: BTreeMap<String, Opaque>,
    pub services: BTreeMap<String, Opaque>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsConfiguration {
    pub stores: BTreeMap<String, Opaque>,
    pub options: BTreeMap<String, Opaque>,
}
