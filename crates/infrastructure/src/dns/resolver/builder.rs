use super::cached::CachedResolver;
use super::conditional::ConditionalUpstreamResolver;
use super::filtered::FilteredResolver;
use super::parallel::ParallelGroupResolver;
use crate::dns::bootstrap::Bootstrap;
use crossbar_dns_application::ports::{BlockFilter, Resolver, ResponseCache, UpstreamClient};
use crossbar_dns_domain::{ConditionalConfig, DomainError, UpstreamGroups, DEFAULT_UPSTREAM_GROUP};
use std::sync::Arc;
use tracing::info;

/// Assembles the inbound resolution chain:
/// filter → conditional → cache → default upstream group.
/// Stages without a configured collaborator are simply left out.
pub struct ResolverBuilder {
    bootstrap: Arc<Bootstrap>,
    client: Arc<dyn UpstreamClient>,
    filter: Option<Arc<dyn BlockFilter>>,
    cache: Option<Arc<dyn ResponseCache>>,
    conditional: Option<ConditionalConfig>,
}

impl ResolverBuilder {
    pub fn new(bootstrap: Arc<Bootstrap>, client: Arc<dyn UpstreamClient>) -> Self {
        Self {
            bootstrap,
            client,
            filter: None,
            cache: None,
            conditional: None,
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn BlockFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_conditional(mut self, config: ConditionalConfig) -> Self {
        self.conditional = Some(config);
        self
    }

    pub fn build(self, upstreams: &UpstreamGroups) -> Result<Arc<dyn Resolver>, DomainError> {
        info!(
            filter = self.filter.is_some(),
            cache = self.cache.is_some(),
            conditional = self.conditional.is_some(),
            "building resolution chain"
        );

        let endpoints = upstreams.default_group().ok_or_else(|| {
            DomainError::ConfigError(format!(
                "no '{}' upstream group configured",
                DEFAULT_UPSTREAM_GROUP
            ))
        })?;

        let mut resolver: Arc<dyn Resolver> = Arc::new(ParallelGroupResolver::from_group(
            DEFAULT_UPSTREAM_GROUP,
            endpoints,
            &self.client,
            Arc::downgrade(&self.bootstrap),
        )?);

        if let Some(cache) = self.cache {
            resolver = Arc::new(CachedResolver::new(cache, resolver));
        }

        if let Some(config) = &self.conditional {
            if !config.mapping.is_empty() {
                resolver = Arc::new(ConditionalUpstreamResolver::new(
                    config,
                    &self.bootstrap,
                    &self.client,
                    resolver,
                )?);
            }
        }

        if let Some(filter) = self.filter {
            resolver = Arc::new(FilteredResolver::new(filter, resolver));
        }

        Ok(resolver)
    }
}
