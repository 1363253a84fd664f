//! Crossbar DNS application layer: the request/response model that flows
//! through resolver chains, and the ports external collaborators plug
//! into.
pub mod model;
pub mod ports;

pub use model::{extract_domain, Request, Response, ResponseType};
