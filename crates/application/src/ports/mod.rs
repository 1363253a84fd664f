pub mod block_filter;
pub mod cache;
pub mod resolver;
pub mod system_resolver;
pub mod upstream_client;

pub use block_filter::{BlockFilter, FilterDecision};
pub use cache::ResponseCache;
pub use resolver::Resolver;
pub use system_resolver::SystemResolver;
pub use upstream_client::UpstreamClient;
