#![allow(dead_code)]

use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response, ResponseType};
use crossbar_dns_application::ports::{
    BlockFilter, FilterDecision, Resolver, ResponseCache, SystemResolver, UpstreamClient,
};
use crossbar_dns_domain::{DomainError, IpVersion, RecordType, UpstreamSpec};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;

/// NOERROR answer to `request` carrying the given addresses.
pub fn answer_with(request: &Request, addresses: &[IpAddr]) -> Response {
    let mut message = Message::new(request.id(), MessageType::Response, OpCode::Query);
    message.set_recursion_desired(request.message().recursion_desired());
    message.set_response_code(ResponseCode::NoError);
    message.add_queries(request.message().queries().to_vec());

    if let Some(question) = request.question() {
        for ip in addresses {
            let rdata = match ip {
                IpAddr::V4(v4) => RData::A(A(*v4)),
                IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
            };
            message.add_answer(Record::from_rdata(question.name().clone(), 300, rdata));
        }
    }

    Response::new(message, ResponseType::Resolved, "RESOLVED (mock)")
}

#[derive(Debug, Clone)]
pub struct ExchangeCall {
    pub server: SocketAddr,
    pub domain: String,
    pub record_type: Option<RecordType>,
    pub fqdn_question: bool,
}

type ExchangeFn =
    dyn Fn(&UpstreamSpec, SocketAddr, &Request) -> Result<Response, DomainError> + Send + Sync;

/// Recording `UpstreamClient` with pluggable behavior.
pub struct MockClient {
    calls: Mutex<Vec<ExchangeCall>>,
    behavior: Box<ExchangeFn>,
}

impl MockClient {
    pub fn with_behavior(
        behavior: impl Fn(&UpstreamSpec, SocketAddr, &Request) -> Result<Response, DomainError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            behavior: Box::new(behavior),
        }
    }

    /// Answers every question with the subset of `addresses` matching the
    /// question's address family.
    pub fn answering(addresses: Vec<IpAddr>) -> Self {
        Self::with_behavior(move |_, _, request| {
            let wanted: Vec<IpAddr> = addresses
                .iter()
                .copied()
                .filter(|ip| match request.record_type() {
                    Some(RecordType::A) => ip.is_ipv4(),
                    Some(RecordType::AAAA) => ip.is_ipv6(),
                    _ => true,
                })
                .collect();
            Ok(answer_with(request, &wanted))
        })
    }

    /// Fails every exchange with a transport error.
    pub fn failing() -> Self {
        Self::with_behavior(|_, server, _| {
            Err(DomainError::TransportFailed {
                server: server.to_string(),
                reason: "mock refused".into(),
            })
        })
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn servers_seen(&self) -> Vec<SocketAddr> {
        self.calls.lock().unwrap().iter().map(|c| c.server).collect()
    }
}

#[async_trait]
impl UpstreamClient for MockClient {
    async fn exchange(
        &self,
        upstream: &UpstreamSpec,
        server: SocketAddr,
        request: &Request,
    ) -> Result<Response, DomainError> {
        self.calls.lock().unwrap().push(ExchangeCall {
            server,
            domain: request.domain().unwrap_or_default(),
            record_type: request.record_type(),
            fqdn_question: request
                .question()
                .map(|q| q.name().is_fqdn())
                .unwrap_or(false),
        });
        (self.behavior)(upstream, server, request)
    }
}

/// Recording `SystemResolver` answering from a fixed table.
pub struct MockSystemResolver {
    calls: Mutex<Vec<(IpVersion, String)>>,
    answers: HashMap<String, Vec<IpAddr>>,
}

impl MockSystemResolver {
    pub fn empty() -> Self {
        Self::with_answers(HashMap::new())
    }

    pub fn with_answers(answers: HashMap<String, Vec<IpAddr>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            answers,
        }
    }

    pub fn calls(&self) -> Vec<(IpVersion, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SystemResolver for MockSystemResolver {
    async fn lookup_addresses(
        &self,
        ip_version: IpVersion,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((ip_version, host.to_string()));

        let ips: Vec<IpAddr> = self
            .answers
            .get(host)
            .map(|ips| {
                ips.iter()
                    .copied()
                    .filter(|ip| ip_version.matches(ip))
                    .collect()
            })
            .unwrap_or_default();

        if ips.is_empty() {
            return Err(DomainError::NoSuchHost(host.to_string()));
        }

        Ok(ips)
    }
}

/// `BlockFilter` blocking an explicit list of domains.
pub struct MockFilter {
    blocked: Vec<String>,
}

impl MockFilter {
    pub fn allow_all() -> Self {
        Self { blocked: vec![] }
    }

    pub fn blocking(domains: &[&str]) -> Self {
        Self {
            blocked: domains.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl BlockFilter for MockFilter {
    fn check(&self, domain: &str) -> FilterDecision {
        if self.blocked.iter().any(|b| b == domain) {
            FilterDecision::Block
        } else {
            FilterDecision::Allow
        }
    }
}

/// In-memory `ResponseCache` with no TTL handling.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, RecordType), Response>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn contains(&self, domain: &str, record_type: RecordType) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&(domain.to_string(), record_type))
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, domain: &str, record_type: RecordType) -> Option<Response> {
        self.entries
            .lock()
            .unwrap()
            .get(&(domain.to_string(), record_type))
            .cloned()
    }

    fn insert(&self, domain: &str, record_type: RecordType, response: &Response) {
        self.entries
            .lock()
            .unwrap()
            .insert((domain.to_string(), record_type), response.clone());
    }
}

/// Chain tail that answers every query with fixed addresses and counts
/// how often it was reached.
pub struct StaticResolver {
    addresses: Vec<IpAddr>,
    calls: Mutex<usize>,
}

impl StaticResolver {
    pub fn answering(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        *self.calls.lock().unwrap() += 1;
        Ok(answer_with(request, &self.addresses))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Resolver that fails every request with a transport error.
pub struct FailingResolver;

#[async_trait]
impl Resolver for FailingResolver {
    async fn resolve(&self, _request: &Request) -> Result<Response, DomainError> {
        Err(DomainError::TransportFailed {
            server: "mock".into(),
            reason: "always fails".into(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Resolver answering every query with an empty response carrying the
/// given rcode.
pub struct RcodeResolver {
    rcode: ResponseCode,
}

impl RcodeResolver {
    pub fn with(rcode: ResponseCode) -> Self {
        Self { rcode }
    }
}

#[async_trait]
impl Resolver for RcodeResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        Ok(Response::empty_for(
            request,
            self.rcode,
            ResponseType::Resolved,
            "RESOLVED (mock)",
        ))
    }

    fn name(&self) -> &'static str {
        "rcode"
    }
}
