use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response, ResponseType};
use crossbar_dns_application::ports::{BlockFilter, FilterDecision, Resolver};
use crossbar_dns_domain::DomainError;
use hickory_proto::op::ResponseCode;
use std::sync::Arc;
use tracing::{debug, trace};

/// Chain stage consulting the filtering rule engine before anything else
/// sees the query. Blocked domains short-circuit with NXDOMAIN.
pub struct FilteredResolver {
    filter: Arc<dyn BlockFilter>,
    next: Arc<dyn Resolver>,
}

impl FilteredResolver {
    pub fn new(filter: Arc<dyn BlockFilter>, next: Arc<dyn Resolver>) -> Self {
        Self { filter, next }
    }
}

#[async_trait]
impl Resolver for FilteredResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        if let Some(domain) = request.domain() {
            if self.filter.check(&domain) == FilterDecision::Block {
                debug!(domain = %domain, "query blocked by filter");
                return Ok(Response::empty_for(
                    request,
                    ResponseCode::NXDomain,
                    ResponseType::Blocked,
                    "BLOCKED",
                ));
            }
        }

        trace!(next = self.next.name(), "filter passed");

        self.next.resolve(request).await
    }

    fn name(&self) -> &'static str {
        "filtered"
    }
}
