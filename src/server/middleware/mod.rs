//! HTTP middleware implementations

mod trusted_subnet;

pub use crate::utils::net::REAL_IP_HEADER;
pub use trusted_subnet::{TrustedSubnet, TrustedSubnetService, client_ip};
