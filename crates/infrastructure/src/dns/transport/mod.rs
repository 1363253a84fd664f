pub mod udp;

pub use udp::UdpClient;
