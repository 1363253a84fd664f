use async_trait::async_trait;
use crossbar_dns_application::ports::SystemResolver;
use crossbar_dns_domain::{DomainError, IpVersion};
use std::net::IpAddr;
use tracing::debug;

/// `SystemResolver` backed by the operating system's resolver via
/// `tokio::net::lookup_host`.
pub struct NetSystemResolver;

#[async_trait]
impl SystemResolver for NetSystemResolver {
    async fn lookup_addresses(
        &self,
        ip_version: IpVersion,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let addrs =
            tokio::net::lookup_host((host, 0u16))
                .await
                .map_err(|e| DomainError::LookupFailed {
                    host: host.to_string(),
                    reasons: e.to_string(),
                })?;

        let ips: Vec<IpAddr> = addrs
            .map(|addr| addr.ip())
            .filter(|ip| ip_version.matches(ip))
            .collect();

        if ips.is_empty() {
            return Err(DomainError::NoSuchHost(host.to_string()));
        }

        debug!(host, addresses = ips.len(), ip_version = ip_version.as_str(), "system lookup");

        Ok(ips)
    }
}
