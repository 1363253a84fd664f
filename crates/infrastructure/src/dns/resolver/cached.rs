use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response, ResponseType};
use crossbar_dns_application::ports::{Resolver, ResponseCache};
use crossbar_dns_domain::DomainError;
use hickory_proto::op::ResponseCode;
use std::sync::Arc;
use tracing::{debug, trace};

/// Chain stage answering from the response cache and filling it from
/// downstream answers. What to keep, for how long, and when to evict is
/// the cache collaborator's call.
pub struct CachedResolver {
    cache: Arc<dyn ResponseCache>,
    next: Arc<dyn Resolver>,
}

impl CachedResolver {
    pub fn new(cache: Arc<dyn ResponseCache>, next: Arc<dyn Resolver>) -> Self {
        Self { cache, next }
    }
}

#[async_trait]
impl Resolver for CachedResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let key = request.domain().zip(request.record_type());

        if let Some((domain, record_type)) = &key {
            if let Some(mut hit) = self.cache.get(domain, *record_type) {
                debug!(domain = %domain, record_type = %record_type, "cache hit");
                hit.message.set_id(request.id());
                hit.response_type = ResponseType::Cached;
                hit.reason = "CACHED".to_string();
                return Ok(hit);
            }
        }

        trace!(next = self.next.name(), "cache miss");

        let response = self.next.resolve(request).await?;

        if response.rcode() == ResponseCode::NoError {
            if let Some((domain, record_type)) = &key {
                self.cache.insert(domain, *record_type, &response);
            }
        }

        Ok(response)
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}
