use crate::record_type::RecordType;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Address-family preference for outbound connections and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    #[default]
    Dual,
    V4,
    V6,
}

impl IpVersion {
    /// Question types to issue when looking up a hostname under this
    /// preference.
    pub fn record_types(&self) -> &'static [RecordType] {
        match self {
            IpVersion::Dual => &[RecordType::A, RecordType::AAAA],
            IpVersion::V4 => &[RecordType::A],
            IpVersion::V6 => &[RecordType::AAAA],
        }
    }

    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::Dual => true,
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::Dual => "dual",
            IpVersion::V4 => "v4",
            IpVersion::V6 => "v6",
        }
    }
}
