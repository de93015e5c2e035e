//! Discovery errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket setup or an HTTP request failed
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A description or SSDP reply could not be read
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An entry of `networks_to_scan` is not a usable IPv4 network
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
