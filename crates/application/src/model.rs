use crossbar_dns_domain::{DomainError, RecordType};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType as WireRecordType};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A single DNS question travelling down a resolver chain.
///
/// The question is fixed once constructed; stages that need a different
/// name derive a copy via [`Request::rewritten`] instead of mutating the
/// caller's request.
#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
}

impl Request {
    /// Builds a recursive query for `domain` with a random message ID.
    pub fn with_question(domain: &str, record_type: RecordType) -> Result<Self, DomainError> {
        let name = Name::from_str(domain).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(WireRecordType::from(record_type.to_u16()));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        Ok(Self { message })
    }

    /// Wraps a message decoded elsewhere (e.g. one read off the wire).
    pub fn from_message(message: Message) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn id(&self) -> u16 {
        self.message.id()
    }

    pub fn question(&self) -> Option<&Query> {
        self.message.queries().first()
    }

    /// Question name, lower-cased with any trailing dot removed.
    pub fn domain(&self) -> Option<String> {
        self.question().map(|q| extract_domain(q.name()))
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.question()
            .and_then(|q| RecordType::from_u16(u16::from(q.query_type())))
    }

    /// Copy of this request with the question name swapped out, keeping
    /// the message ID, flags, question type and class.
    pub fn rewritten(&self, name: Name) -> Self {
        let mut message = Message::new(self.message.id(), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(self.message.recursion_desired());
        if let Some(query) = self.question() {
            let mut rewritten = query.clone();
            rewritten.set_name(name);
            message.add_query(rewritten);
        }
        Self { message }
    }
}

/// Which pipeline stage produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Resolved,
    Cached,
    Blocked,
    Conditional,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Resolved => "RESOLVED",
            ResponseType::Cached => "CACHED",
            ResponseType::Blocked => "BLOCKED",
            ResponseType::Conditional => "CONDITIONAL",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer message plus provenance: which stage produced it and a
/// free-text reason for query logs.
#[derive(Debug, Clone)]
pub struct Response {
    pub message: Message,
    pub reason: String,
    pub response_type: ResponseType,
}

impl Response {
    pub fn new(
        message: Message,
        response_type: ResponseType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message,
            reason: reason.into(),
            response_type,
        }
    }

    /// Response answering `request` with no records and the given rcode.
    pub fn empty_for(
        request: &Request,
        rcode: ResponseCode,
        response_type: ResponseType,
        reason: impl Into<String>,
    ) -> Self {
        let mut message = Message::new(request.id(), MessageType::Response, OpCode::Query);
        message.set_recursion_desired(request.message().recursion_desired());
        message.set_response_code(rcode);
        message.add_queries(request.message().queries().to_vec());
        Self::new(message, response_type, reason)
    }

    pub fn rcode(&self) -> ResponseCode {
        self.message.response_code()
    }

    /// Addresses carried in A/AAAA answer records; other record kinds are
    /// ignored.
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.message
            .answers()
            .iter()
            .filter_map(|record| match record.data() {
                RData::A(a) => Some(IpAddr::V4(a.0)),
                RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
                _ => None,
            })
            .collect()
    }

    /// Compact answer rendering for logs.
    pub fn answer_summary(&self) -> String {
        let addresses = self.addresses();
        if addresses.is_empty() {
            format!("{:?} (no address records)", self.rcode())
        } else {
            addresses
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    /// Stamps `name` back onto every question of the answer message, so
    /// the caller sees the name it asked with.
    pub fn restore_question_name(&mut self, name: &Name) {
        let restored: Vec<Query> = self
            .message
            .take_queries()
            .into_iter()
            .map(|mut q| {
                q.set_name(name.clone());
                q
            })
            .collect();
        self.message.add_queries(restored);
    }
}

/// Lower-cased question name without the trailing root dot.
pub fn extract_domain(name: &Name) -> String {
    let mut domain = name.to_utf8().to_lowercase();
    if domain.ends_with('.') {
        domain.pop();
    }
    domain
}
