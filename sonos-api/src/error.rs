use soap_client::SoapError;
use thiserror::Error;

/// High-level API errors for Sonos operations
///
/// Abstracts away the underlying SOAP communication details. Callers that only
/// care whether a device was reachable can use [`ApiError::is_connection_error`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The device could not be reached at all
    ///
    /// Connection refused, host unreachable, DNS failure, or a connect/read
    /// timeout. Usually means the speaker is powered off or changed address.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The device answered, but not with a usable HTTP response
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response parsing error
    ///
    /// The device returned a response whose content could not be parsed into
    /// the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// SOAP fault returned by device
    ///
    /// The device rejected the action. AVTransport returns 701 ("transition
    /// not available") when there is nothing queued to play.
    #[error("SOAP fault: error code {0}")]
    SoapFault(u16),

    /// Invalid parameter value supplied by the caller
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device-level issue such as a missing topology entry
    #[error("Device error: {0}")]
    DeviceError(String),
}

impl ApiError {
    /// Whether this error means the device was unreachable
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ApiError::ConnectionError(_))
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Connection(msg) => ApiError::ConnectionError(msg),
            SoapError::Http(status) => ApiError::NetworkError(format!("HTTP status {}", status)),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault(code) => ApiError::SoapFault(code),
        }
    }
}
