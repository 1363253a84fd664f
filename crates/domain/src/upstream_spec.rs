use crate::errors::DomainError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Transport family an upstream is reachable over.
///
/// `TcpUdp` is classic port-53 DNS; its endpoint must be a literal IP
/// because nothing can resolve a hostname for it before the proxy is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetProtocol {
    #[default]
    TcpUdp,
    TcpTls,
    Https,
}

impl NetProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetProtocol::TcpUdp => "tcp+udp",
            NetProtocol::TcpTls => "tcp-tls",
            NetProtocol::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            NetProtocol::TcpUdp => 53,
            NetProtocol::TcpTls => 853,
            NetProtocol::Https => 443,
        }
    }

    /// Raw transports carry no server name, so their host must already be
    /// a literal address.
    pub fn requires_literal_host(&self) -> bool {
        matches!(self, NetProtocol::TcpUdp)
    }
}

impl fmt::Display for NetProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured upstream endpoint: protocol, host (literal IP or
/// hostname) and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct UpstreamSpec {
    pub protocol: NetProtocol,
    pub host: String,
    pub port: u16,
}

impl UpstreamSpec {
    /// True for the zero-value placeholder an unconfigured entry leaves
    /// behind.
    pub fn is_default(&self) -> bool {
        self.host.is_empty()
    }

    /// The host field parsed as a literal address, if it is one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }

    fn parse_endpoint(protocol: NetProtocol, rest: &str) -> Result<Self, DomainError> {
        // For HTTPS endpoints only the authority matters here; any DoH
        // path is the transport's business.
        let rest = match protocol {
            NetProtocol::Https => rest.split('/').next().unwrap_or(rest),
            _ => rest,
        };

        if rest.is_empty() {
            return Err(DomainError::InvalidUpstream("empty endpoint".into()));
        }

        if rest.parse::<IpAddr>().is_ok() {
            return Ok(Self {
                protocol,
                host: rest.to_string(),
                port: protocol.default_port(),
            });
        }

        if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            if inner.parse::<IpAddr>().is_err() {
                return Err(DomainError::InvalidUpstream(format!(
                    "'{}' is not a valid IPv6 address",
                    rest
                )));
            }
            return Ok(Self {
                protocol,
                host: inner.to_string(),
                port: protocol.default_port(),
            });
        }

        if let Some((host, port)) = split_host_port(rest) {
            return Ok(Self {
                protocol,
                host: host.to_string(),
                port,
            });
        }

        if rest.contains(':') {
            return Err(DomainError::InvalidUpstream(format!(
                "invalid host:port '{}'",
                rest
            )));
        }

        Ok(Self {
            protocol,
            host: rest.to_string(),
            port: protocol.default_port(),
        })
    }
}

/// Splits `host:port` (with bracketed IPv6 hosts) into its parts.
/// Returns `None` when there is no parseable port.
pub fn split_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        let port_str = rest.strip_prefix(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

impl FromStr for UpstreamSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("udp://").or_else(|| s.strip_prefix("tcp://")) {
            return Self::parse_endpoint(NetProtocol::TcpUdp, rest);
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            return Self::parse_endpoint(NetProtocol::TcpTls, rest);
        }
        if let Some(rest) = s.strip_prefix("https://") {
            return Self::parse_endpoint(NetProtocol::Https, rest);
        }
        Self::parse_endpoint(NetProtocol::TcpUdp, s)
    }
}

impl fmt::Display for UpstreamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.protocol {
            NetProtocol::TcpUdp => "udp",
            NetProtocol::TcpTls => "tls",
            NetProtocol::Https => "https",
        };
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_ip_with_default_port() {
        let spec: UpstreamSpec = "9.9.9.9".parse().unwrap();
        assert_eq!(spec.protocol, NetProtocol::TcpUdp);
        assert_eq!(spec.host, "9.9.9.9");
        assert_eq!(spec.port, 53);
        assert!(spec.ip().is_some());
    }

    #[test]
    fn parses_schemes_and_ports() {
        let spec: UpstreamSpec = "tls://dns.example.com:8853".parse().unwrap();
        assert_eq!(spec.protocol, NetProtocol::TcpTls);
        assert_eq!(spec.host, "dns.example.com");
        assert_eq!(spec.port, 8853);

        let spec: UpstreamSpec = "tls://dns.example.com".parse().unwrap();
        assert_eq!(spec.port, 853);

        let spec: UpstreamSpec = "https://doh.example.com/dns-query".parse().unwrap();
        assert_eq!(spec.protocol, NetProtocol::Https);
        assert_eq!(spec.host, "doh.example.com");
        assert_eq!(spec.port, 443);

        let spec: UpstreamSpec = "tcp://8.8.4.4:5353".parse().unwrap();
        assert_eq!(spec.protocol, NetProtocol::TcpUdp);
        assert_eq!(spec.port, 5353);
    }

    #[test]
    fn parses_ipv6_forms() {
        let spec: UpstreamSpec = "2620:fe::fe".parse().unwrap();
        assert_eq!(spec.host, "2620:fe::fe");
        assert_eq!(spec.port, 53);

        let spec: UpstreamSpec = "udp://[2620:fe::fe]:5353".parse().unwrap();
        assert_eq!(spec.host, "2620:fe::fe");
        assert_eq!(spec.port, 5353);

        let spec: UpstreamSpec = "tls://[2620:fe::9]".parse().unwrap();
        assert_eq!(spec.host, "2620:fe::9");
        assert_eq!(spec.port, 853);
    }

    #[test]
    fn rejects_garbage_ports() {
        assert!("udp://host:notaport".parse::<UpstreamSpec>().is_err());
        assert!("".parse::<UpstreamSpec>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        for input in ["udp://9.9.9.9:53", "tls://dns.example.com:853", "udp://[2620:fe::fe]:53"] {
            let spec: UpstreamSpec = input.parse().unwrap();
            assert_eq!(spec.to_string(), input);
            let again: UpstreamSpec = spec.to_string().parse().unwrap();
            assert_eq!(again, spec);
        }
    }

    #[test]
    fn default_spec_is_placeholder() {
        assert!(UpstreamSpec::default().is_default());
        assert!(!"9.9.9.9".parse::<UpstreamSpec>().unwrap().is_default());
    }

    #[test]
    fn split_host_port_handles_brackets() {
        assert_eq!(split_host_port("host:53"), Some(("host", 53)));
        assert_eq!(split_host_port("[::1]:853"), Some(("::1", 853)));
        assert_eq!(split_host_port("plainhost"), None);
        assert_eq!(split_host_port("[::1]"), None);
    }
}
