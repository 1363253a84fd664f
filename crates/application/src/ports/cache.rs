use crate::model::Response;
use crossbar_dns_domain::RecordType;

/// Narrow view of the response cache consumed by the caching chain stage.
/// Storage, TTL accounting and eviction all live behind this port.
pub trait ResponseCache: Send + Sync {
    fn get(&self, domain: &str, record_type: RecordType) -> Option<Response>;

    fn insert(&self, domain: &str, record_type: RecordType, response: &Response);
}
