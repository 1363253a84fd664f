use super::upstream::UpstreamResolver;
use crate::dns::bootstrap::Bootstrap;
use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response};
use crossbar_dns_application::ports::{Resolver, UpstreamClient};
use crossbar_dns_domain::{ConfigErrors, DomainError, UpstreamSpec};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Terminal fan-out over one named group of upstream resolvers.
///
/// Members race concurrently inside the caller's task; the first success
/// wins and the remaining futures are dropped, which cancels their
/// in-flight work. Upstream health and ranking are not this resolver's
/// concern.
pub struct ParallelGroupResolver {
    group: String,
    members: Vec<Arc<dyn Resolver>>,
}

impl ParallelGroupResolver {
    /// Builds the group's member resolvers from endpoint strings. Every
    /// invalid endpoint is reported; an empty group is itself an error.
    pub fn from_group(
        group: &str,
        endpoints: &[String],
        client: &Arc<dyn UpstreamClient>,
        bootstrap: Weak<Bootstrap>,
    ) -> Result<Self, DomainError> {
        if endpoints.is_empty() {
            return Err(DomainError::ConfigError(format!(
                "upstream group '{}' is empty",
                group
            )));
        }

        let mut errors = ConfigErrors::new();
        let mut members: Vec<Arc<dyn Resolver>> = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            match endpoint.parse::<UpstreamSpec>() {
                Ok(spec) => members.push(Arc::new(UpstreamResolver::new_unchecked(
                    spec,
                    Arc::clone(client),
                    Weak::clone(&bootstrap),
                ))),
                Err(e) => errors.push(format!("'{}': {}", endpoint, e)),
            }
        }

        errors.into_result(&format!("invalid upstream group '{}'", group))?;

        Ok(Self::with_members(group, members))
    }

    /// Wraps already-constructed members. Callers guarantee the list is
    /// non-empty.
    pub fn with_members(group: impl Into<String>, members: Vec<Arc<dyn Resolver>>) -> Self {
        debug_assert!(!members.is_empty());
        Self {
            group: group.into(),
            members,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[async_trait]
impl Resolver for ParallelGroupResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        if self.members.len() == 1 {
            return self.members[0].resolve(request).await;
        }

        debug!(group = %self.group, members = self.members.len(), "racing upstream group");

        let mut in_flight: FuturesUnordered<_> = self
            .members
            .iter()
            .map(|member| member.resolve(request))
            .collect();

        let mut failures = Vec::with_capacity(self.members.len());

        while let Some(result) = in_flight.next().await {
            match result {
                Ok(response) => {
                    trace!(group = %self.group, "fastest member answered");
                    return Ok(response);
                }
                Err(e) => failures.push(e.to_string()),
            }
        }

        Err(DomainError::UpstreamGroupFailed {
            group: self.group.clone(),
            reasons: failures.join("; "),
        })
    }

    fn name(&self) -> &'static str {
        "parallel_group"
    }
}
