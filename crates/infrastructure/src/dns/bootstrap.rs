use crate::dns::ip_set::IpSet;
use crate::dns::resolver::{
    CachedResolver, FilteredResolver, ParallelGroupResolver, UpstreamResolver,
};
use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response};
use crossbar_dns_application::ports::{
    BlockFilter, Resolver, ResponseCache, SystemResolver, UpstreamClient,
};
use crossbar_dns_domain::{
    BootstrapUpstreamConfig, Config, ConfigErrors, DomainError, IpVersion, RecordType,
    UpstreamSpec, DEFAULT_UPSTREAM_GROUP,
};
use hickory_proto::op::ResponseCode;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Identity of an upstream resolver instance, keyed by allocation
/// address and never by configuration value: two identically-configured
/// upstreams stay distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ResolverId(usize);

impl ResolverId {
    fn of(resolver: &UpstreamResolver) -> Self {
        Self(resolver as *const UpstreamResolver as usize)
    }
}

struct BootstrappedUpstream {
    resolver: Arc<UpstreamResolver>,
    ips: Vec<IpAddr>,
}

/// Resolves the hostnames of configured upstreams through a dedicated
/// filter → cache → parallel-upstream pipeline, or through the system
/// resolver when no bootstrap DNS is configured.
///
/// Upstream resolvers need the bootstrap to find their addresses, and the
/// bootstrap's own pipeline is made of upstream resolvers. The cycle is
/// closed with `Arc::new_cyclic`: members are constructed unchecked
/// against a `Weak` handle and registered in an identity-keyed table,
/// then the pipeline referencing them becomes this struct's `resolver`.
/// Lookups for registered members return their hardcoded addresses
/// instead of re-entering that pipeline.
pub struct Bootstrap {
    resolver: Option<Arc<dyn Resolver>>,
    bootstrapped: HashMap<ResolverId, BootstrappedUpstream>,
    system: Arc<dyn SystemResolver>,
    connect_ip_version: IpVersion,
    /// Zero means unbounded.
    lookup_timeout: Duration,
}

impl Bootstrap {
    pub fn new(
        config: &Config,
        filter: Arc<dyn BlockFilter>,
        cache: Arc<dyn ResponseCache>,
        client: Arc<dyn UpstreamClient>,
        system: Arc<dyn SystemResolver>,
    ) -> Result<Arc<Self>, DomainError> {
        let validated = validate_entries(&config.bootstrap_dns)?;
        let lookup_timeout = Duration::from_millis(config.upstream_timeout_ms);

        if validated.is_empty() {
            info!("bootstrap DNS not configured, hostnames resolve via the system resolver");
            return Ok(Arc::new(Self {
                resolver: None,
                bootstrapped: HashMap::new(),
                system,
                connect_ip_version: config.connect_ip_version,
                lookup_timeout,
            }));
        }

        let bootstrap = Arc::new_cyclic(|weak: &Weak<Bootstrap>| {
            let mut bootstrapped = HashMap::with_capacity(validated.len());
            let mut members: Vec<Arc<dyn Resolver>> = Vec::with_capacity(validated.len());

            for (spec, ips) in validated {
                let resolver = Arc::new(UpstreamResolver::new_unchecked(
                    spec,
                    Arc::clone(&client),
                    Weak::clone(weak),
                ));
                bootstrapped.insert(
                    ResolverId::of(&resolver),
                    BootstrappedUpstream {
                        resolver: Arc::clone(&resolver),
                        ips,
                    },
                );
                members.push(resolver);
            }

            let parallel = ParallelGroupResolver::with_members(DEFAULT_UPSTREAM_GROUP, members);
            let chain: Arc<dyn Resolver> = Arc::new(FilteredResolver::new(
                filter,
                Arc::new(CachedResolver::new(cache, Arc::new(parallel))),
            ));

            Self {
                resolver: Some(chain),
                bootstrapped,
                system,
                connect_ip_version: config.connect_ip_version,
                lookup_timeout,
            }
        });

        debug!(
            upstreams = bootstrap.bootstrapped.len(),
            "bootstrap pipeline ready"
        );

        Ok(bootstrap)
    }

    /// Addresses to dial for `resolver`'s upstream, round-robin ready.
    ///
    /// A literal-address host short-circuits without any resolution; this
    /// also keeps bootstrap members from deadlocking while they answer
    /// the very lookups that would resolve them.
    pub async fn upstream_ips(&self, resolver: &UpstreamResolver) -> Result<IpSet, DomainError> {
        if let Some(ip) = resolver.upstream().ip() {
            return Ok(IpSet::new(vec![ip]));
        }

        let host = resolver.upstream().host.as_str();
        let ips = self.resolve_upstream(resolver, host).await?;

        Ok(IpSet::new(ips))
    }

    async fn resolve_upstream(
        &self,
        resolver: &UpstreamResolver,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError> {
        if self.resolver.is_none() {
            return self.system_lookup(host).await;
        }

        // Registered members resolve to their hardcoded addresses; going
        // through the chain here would recurse forever.
        if let Some(entry) = self.bootstrapped.get(&ResolverId::of(resolver)) {
            return Ok(entry.ips.clone());
        }

        self.resolve_addresses(host, IpVersion::Dual.record_types())
            .await
    }

    async fn system_lookup(&self, host: &str) -> Result<Vec<IpAddr>, DomainError> {
        let lookup = self.system.lookup_addresses(self.connect_ip_version, host);

        if self.lookup_timeout.is_zero() {
            return lookup.await;
        }

        tokio::time::timeout(self.lookup_timeout, lookup)
            .await
            .map_err(|_| DomainError::LookupFailed {
                host: host.to_string(),
                reasons: format!("system lookup timed out after {:?}", self.lookup_timeout),
            })?
    }

    /// Resolves `hostname` through the bootstrap pipeline, one query per
    /// requested record type. Succeeds as soon as any type yields an
    /// address; per-type failures surface only when nothing resolved at
    /// all, and a clean zero-record outcome reports "no such host".
    pub async fn resolve_addresses(
        &self,
        hostname: &str,
        record_types: &[RecordType],
    ) -> Result<Vec<IpAddr>, DomainError> {
        let mut ips = Vec::with_capacity(record_types.len());
        let mut failures = Vec::new();

        for record_type in record_types {
            match self.resolve_type(hostname, *record_type).await {
                Ok(mut found) => ips.append(&mut found),
                Err(e) => failures.push(format!("{}: {}", record_type, e)),
            }
        }

        if ips.is_empty() {
            if failures.is_empty() {
                return Err(DomainError::NoSuchHost(hostname.to_string()));
            }
            return Err(DomainError::LookupFailed {
                host: hostname.to_string(),
                reasons: failures.join("; "),
            });
        }

        if !failures.is_empty() {
            warn!(host = hostname, failures = %failures.join("; "), "partial bootstrap resolution");
        }

        Ok(ips)
    }

    async fn resolve_type(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Vec<IpAddr>, DomainError> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| DomainError::ConfigError("bootstrap DNS is not configured".into()))?;

        let request = Request::with_question(hostname, record_type)?;
        let response = resolver.resolve(&request).await?;

        if response.rcode() != ResponseCode::NoError {
            trace!(host = hostname, rcode = ?response.rcode(), "non-success rcode, treating as empty");
            return Ok(Vec::new());
        }

        Ok(response.addresses())
    }

    /// Dialer whose hostname lookups go through this bootstrap.
    pub fn dialer(self: &Arc<Self>) -> BootstrapDialer {
        BootstrapDialer {
            bootstrap: Arc::clone(self),
        }
    }

    /// Registered bootstrap members with their hardcoded address lists.
    pub fn bootstrapped_upstreams(&self) -> Vec<(Arc<UpstreamResolver>, Vec<IpAddr>)> {
        self.bootstrapped
            .values()
            .map(|entry| (Arc::clone(&entry.resolver), entry.ips.clone()))
            .collect()
    }
}

#[async_trait]
impl Resolver for Bootstrap {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| DomainError::ConfigError("bootstrap DNS is not configured".into()))?;

        resolver.resolve(request).await
    }

    fn name(&self) -> &'static str {
        "bootstrap"
    }
}

fn validate_entries(
    entries: &[BootstrapUpstreamConfig],
) -> Result<Vec<(UpstreamSpec, Vec<IpAddr>)>, DomainError> {
    let mut errors = ConfigErrors::new();
    let mut validated = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        // User-visible index starts at 1.
        let item = i + 1;

        if entry.upstream.is_empty() {
            errors.push(format!(
                "item {}: upstream not configured (ips={:?})",
                item, entry.ips
            ));
            continue;
        }

        let spec = match entry.upstream.parse::<UpstreamSpec>() {
            Ok(spec) if !spec.is_default() => spec,
            Ok(_) => {
                errors.push(format!(
                    "item {}: upstream not configured (ips={:?})",
                    item, entry.ips
                ));
                continue;
            }
            Err(e) => {
                errors.push(format!("item {}: {}", item, e));
                continue;
            }
        };

        let ips = if spec.protocol.requires_literal_host() {
            match spec.ip() {
                Some(ip) => vec![ip],
                None => {
                    errors.push(format!(
                        "item {}: '{}': protocol {} must use an IP address instead of a hostname",
                        item, spec, spec.protocol
                    ));
                    continue;
                }
            }
        } else {
            if entry.ips.is_empty() {
                errors.push(format!(
                    "item {}: '{}': protocol {} requires hardcoded ips",
                    item, spec, spec.protocol
                ));
                continue;
            }
            entry.ips.clone()
        };

        validated.push((spec, ips));
    }

    errors.into_result("invalid bootstrap_dns configuration")?;

    Ok(validated)
}

/// Outbound TCP dialer that resolves hostnames through the bootstrap
/// pipeline instead of the operating system.
pub struct BootstrapDialer {
    bootstrap: Arc<Bootstrap>,
}

impl BootstrapDialer {
    /// Connects to `addr` (`host:port`). `network` follows the usual
    /// `"tcp"`/`"tcp4"`/`"tcp6"` convention; a globally forced IP version
    /// wins over the suffix. One address is picked at random from the
    /// resolved set per attempt; there is no retry at this layer.
    pub async fn dial(&self, network: &str, addr: &str) -> Result<TcpStream, DomainError> {
        // Without a bootstrap pipeline, the operating system resolves the
        // address during connect.
        if self.bootstrap.resolver.is_none() {
            return TcpStream::connect(addr)
                .await
                .map_err(|e| DomainError::DialFailed {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                });
        }

        let (host, port) =
            crossbar_dns_domain::split_host_port(addr).ok_or_else(|| DomainError::DialFailed {
                addr: addr.to_string(),
                reason: "missing or invalid port".into(),
            })?;

        let forced = self.bootstrap.connect_ip_version;
        let record_types = if forced != IpVersion::Dual {
            forced.record_types()
        } else if network.ends_with('4') {
            IpVersion::V4.record_types()
        } else if network.ends_with('6') {
            IpVersion::V6.record_types()
        } else {
            IpVersion::Dual.record_types()
        };

        let ips = self.bootstrap.resolve_addresses(host, record_types).await?;
        let ip = ips[fastrand::usize(..ips.len())];
        let target = SocketAddr::new(ip, port);

        trace!(host, %target, network, "dialing through bootstrap");

        TcpStream::connect(target)
            .await
            .map_err(|e| DomainError::DialFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })
    }
}
