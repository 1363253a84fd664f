use serde::{Deserialize, Serialize};

mod bootstrap;
mod conditional;
mod ip_version;
mod upstream;

pub use bootstrap::BootstrapUpstreamConfig;
pub use conditional::ConditionalConfig;
pub use ip_version::IpVersion;
pub use upstream::{UpstreamGroups, DEFAULT_UPSTREAM_GROUP};

/// Resolution-core configuration. Parsing the file it comes from is the
/// host's concern; this crate only defines the shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub upstreams: UpstreamGroups,

    #[serde(default)]
    pub bootstrap_dns: Vec<BootstrapUpstreamConfig>,

    #[serde(default)]
    pub conditional: ConditionalConfig,

    #[serde(default)]
    pub connect_ip_version: IpVersion,

    /// Upper bound for a single upstream or system lookup, in
    /// milliseconds. Zero disables the timeout.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstreams: UpstreamGroups::default(),
            bootstrap_dns: Vec::new(),
            conditional: ConditionalConfig::default(),
            connect_ip_version: IpVersion::default(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

fn default_upstream_timeout_ms() -> u64 {
    2_000
}
