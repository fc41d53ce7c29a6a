//! Rule remapper: presents one instance's upstream routers under local identity.
//!
//! Pure and infallible. A router's local name is its rule with any
//! `@<provider>` suffix cut off; the rule itself is republished untouched.

use crate::config::model::InstanceConfig;
use crate::dynamic::{Router, RouterTls};

use super::fetch::FetchedRoute;

/// A router ready to be inserted into a snapshot under `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRoute {
    pub name: String,
    pub router: Router,
}

/// Local router name for an upstream rule: everything before the first `@`.
#[must_use]
pub fn router_name(rule: &str) -> &str {
    rule.split_once('@').map_or(rule, |(name, _)| name)
}

#[must_use]
pub fn remap(
    instance_name: &str,
    instance: &InstanceConfig,
    routes: &[FetchedRoute],
) -> Vec<LocalRoute> {
    routes
        .iter()
        .map(|route| LocalRoute {
            name: router_name(&route.rule).to_string(),
            router: Router {
                entry_points: instance.entry_points.clone(),
                service: instance_name.to_string(),
                rule: route.rule.clone(),
                tls: Some(RouterTls {
                    cert_resolver: instance.cert_resolver.clone(),
                }),
            },
        })
        .collect()
}
