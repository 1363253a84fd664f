//! Crossbar DNS domain layer: pure types shared by every other crate.
pub mod config;
pub mod errors;
pub mod record_type;
pub mod upstream_spec;

pub use config::{
    BootstrapUpstreamConfig, ConditionalConfig, Config, IpVersion, UpstreamGroups,
    DEFAULT_UPSTREAM_GROUP,
};
pub use errors::{ConfigErrors, DomainError};
pub use record_type::RecordType;
pub use upstream_spec::{split_host_port, NetProtocol, UpstreamSpec};
