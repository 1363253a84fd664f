pub mod builder;
pub mod cached;
pub mod conditional;
pub mod filtered;
pub mod parallel;
pub mod upstream;

pub use builder::ResolverBuilder;
pub use cached::CachedResolver;
pub use conditional::ConditionalUpstreamResolver;
pub use filtered::FilteredResolver;
pub use parallel::ParallelGroupResolver;
pub use upstream::UpstreamResolver;
