use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One bootstrap DNS entry: the upstream endpoint plus the hardcoded
/// addresses that make it reachable before any resolution works.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapUpstreamConfig {
    pub upstream: String,

    #[serde(default)]
    pub ips: Vec<IpAddr>,
}
