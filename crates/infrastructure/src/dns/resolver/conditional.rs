use super::parallel::ParallelGroupResolver;
use crate::dns::bootstrap::Bootstrap;
use crate::dns::redact;
use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response, ResponseType};
use crossbar_dns_application::ports::{Resolver, UpstreamClient};
use crossbar_dns_domain::{ConditionalConfig, ConfigErrors, DomainError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Mapping key that routes single-label (unqualified) names.
const UNQUALIFIED_KEY: &str = ".";

/// Chain link routing queries for configured domains through a dedicated
/// upstream group instead of the default pipeline.
pub struct ConditionalUpstreamResolver {
    mapping: HashMap<String, Arc<ParallelGroupResolver>>,
    next: Arc<dyn Resolver>,
}

impl ConditionalUpstreamResolver {
    /// Builds one isolated single-group pipeline per mapping entry,
    /// keyed by the lower-cased domain. Any invalid entry fails the
    /// whole constructor.
    pub fn new(
        config: &ConditionalConfig,
        bootstrap: &Arc<Bootstrap>,
        client: &Arc<dyn UpstreamClient>,
        next: Arc<dyn Resolver>,
    ) -> Result<Self, DomainError> {
        let mut mapping = HashMap::with_capacity(config.mapping.len());
        let mut errors = ConfigErrors::new();

        for (domain, endpoints) in &config.mapping {
            match ParallelGroupResolver::from_group(
                domain,
                endpoints,
                client,
                Arc::downgrade(bootstrap),
            ) {
                Ok(group) => {
                    mapping.insert(domain.to_lowercase(), Arc::new(group));
                }
                Err(e) => errors.push(format!("'{}': {}", domain, e)),
            }
        }

        errors.into_result("invalid conditional mapping")?;

        debug!(entries = mapping.len(), "conditional routing table built");

        Ok(Self { mapping, next })
    }

    async fn resolve_routed(
        &self,
        route: &ParallelGroupResolver,
        matched: &str,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let Some(question) = request.question() else {
            return self.next.resolve(request).await;
        };

        let original_name = question.name().clone();
        let mut fqdn = original_name.clone();
        fqdn.set_fqdn(true);

        // The sub-pipeline sees a derived request; the caller's question
        // is never touched, so the restore below cannot be missed on any
        // path.
        let sub_request = request.rewritten(fqdn);
        let mut response = route.resolve(&sub_request).await?;

        response.reason = "CONDITIONAL".to_string();
        response.response_type = ResponseType::Conditional;
        response.restore_question_name(&original_name);

        debug!(
            answer = %response.answer_summary(),
            domain = %redact::obfuscate(matched),
            upstream = %route.group(),
            "received response from conditional upstream"
        );

        Ok(response)
    }
}

/// Most-specific suffix match: the full domain first, then the name with
/// its leftmost label stripped, one label at a time. Single-label names
/// only ever match the `"."` entry.
fn find_route<'a, T>(
    mapping: &'a HashMap<String, T>,
    domain: &'a str,
) -> Option<(&'a T, &'a str)> {
    if domain.contains('.') {
        let mut candidate = domain;
        loop {
            if let Some(route) = mapping.get(candidate) {
                return Some((route, candidate));
            }
            let Some((_, rest)) = candidate.split_once('.') else {
                break;
            };
            candidate = rest;
        }
        None
    } else {
        mapping
            .get(UNQUALIFIED_KEY)
            .map(|route| (route, UNQUALIFIED_KEY))
    }
}

#[async_trait]
impl Resolver for ConditionalUpstreamResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        if !self.mapping.is_empty() {
            if let Some(domain) = request.domain() {
                if let Some((route, matched)) = find_route(&self.mapping, &domain) {
                    let route = Arc::clone(route);
                    return self.resolve_routed(&route, matched, request).await;
                }

                trace!(
                    domain = %redact::obfuscate(&domain),
                    next = self.next.name(),
                    "no conditional match, go to next resolver"
                );
            }
        }

        self.next.resolve(request).await
    }

    fn name(&self) -> &'static str {
        "conditional_upstream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping_of(keys: &[&str]) -> HashMap<String, u32> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i as u32))
            .collect()
    }

    #[test]
    fn prefers_most_specific_suffix() {
        let mapping = mapping_of(&["example.com", "b.example.com"]);

        let (route, matched) = find_route(&mapping, "a.b.example.com").unwrap();
        assert_eq!(matched, "b.example.com");
        assert_eq!(*route, 1);

        let (_, matched) = find_route(&mapping, "c.example.com").unwrap();
        assert_eq!(matched, "example.com");
    }

    #[test]
    fn exact_domain_matches() {
        let mapping = mapping_of(&["example.com"]);
        let (_, matched) = find_route(&mapping, "example.com").unwrap();
        assert_eq!(matched, "example.com");
    }

    #[test]
    fn root_entry_only_matches_single_labels() {
        let mapping = mapping_of(&["example.com", "."]);

        let (_, matched) = find_route(&mapping, "intranet").unwrap();
        assert_eq!(matched, ".");

        // Dotted names never fall back to the root entry.
        assert!(find_route(&mapping, "foo.org").is_none());
    }

    #[test]
    fn no_match_without_root_entry() {
        let mapping = mapping_of(&["example.com"]);
        assert!(find_route(&mapping, "intranet").is_none());
        assert!(find_route(&mapping, "examplexcom").is_none());
    }
}
