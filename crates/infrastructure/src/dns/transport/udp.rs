//! Plain DNS over UDP (RFC 1035 §4.2.1).
//!
//! Messages are sent as-is, one ephemeral socket per exchange. A response
//! with the TC bit set is surfaced as-is; retrying over TCP is the
//! caller's decision.

use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response, ResponseType};
use crossbar_dns_application::ports::UpstreamClient;
use crossbar_dns_domain::{DomainError, NetProtocol, UpstreamSpec};
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0).
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// `UpstreamClient` for plain DNS. Send and receive each run under
/// `timeout`.
pub struct UdpClient {
    timeout: Duration,
}

impl UdpClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn serialize(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDomainName(format!("Failed to serialize DNS message: {}", e))
        })?;
        Ok(buf)
    }
}

#[async_trait]
impl UpstreamClient for UdpClient {
    async fn exchange(
        &self,
        upstream: &UpstreamSpec,
        server: SocketAddr,
        request: &Request,
    ) -> Result<Response, DomainError> {
        if upstream.protocol != NetProtocol::TcpUdp {
            return Err(DomainError::UnsupportedTransport(upstream.to_string()));
        }

        let query_bytes = Self::serialize(request.message())?;

        let bind_addr: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::TransportFailed {
                server: server.to_string(),
                reason: format!("bind: {}", e),
            })?;

        tokio::time::timeout(self.timeout, socket.send_to(&query_bytes, server))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::TransportFailed {
                server: server.to_string(),
                reason: format!("send: {}", e),
            })?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let (len, from) = tokio::time::timeout(self.timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::TransportFailed {
                server: server.to_string(),
                reason: format!("recv: {}", e),
            })?;

        if from.ip() != server.ip() {
            warn!(expected = %server, received_from = %from, "UDP response from unexpected source");
        }

        buf.truncate(len);

        let message = Message::from_vec(&buf).map_err(|e| DomainError::TransportFailed {
            server: server.to_string(),
            reason: format!("decode: {}", e),
        })?;

        if message.id() != request.id() {
            return Err(DomainError::TransportFailed {
                server: server.to_string(),
                reason: "response ID mismatch".into(),
            });
        }

        if message.truncated() {
            warn!(server = %server, "truncated UDP response");
        }

        debug!(
            server = %server,
            answers = message.answers().len(),
            rcode = ?message.response_code(),
            "upstream response received"
        );

        Ok(Response::new(
            message,
            ResponseType::Resolved,
            format!("RESOLVED ({})", server),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbar_dns_domain::RecordType;

    #[test]
    fn serialize_roundtrips_through_decoder() {
        let request = Request::with_question("example.com", RecordType::A).unwrap();
        let bytes = UdpClient::serialize(request.message()).unwrap();

        // Header is 12 bytes; byte 2 carries the RD flag for queries.
        assert!(bytes.len() >= 12);
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");

        let decoded = Message::from_vec(&bytes).unwrap();
        assert_eq!(decoded.id(), request.id());
        assert_eq!(decoded.queries().len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_udp_upstreams() {
        let client = UdpClient::new(Duration::from_millis(100));
        let spec: UpstreamSpec = "tls://dns.example.com".parse().unwrap();
        let request = Request::with_question("example.com", RecordType::A).unwrap();

        let err = client
            .exchange(&spec, "127.0.0.1:53".parse().unwrap(), &request)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::UnsupportedTransport(_)));
    }
}
