use thiserror::Error;

/// Why a control call did not produce a response body
#[derive(Debug, Error)]
pub enum SoapError {
    /// The device could not be reached (refused, unreachable, timed out)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status without a SOAP fault body
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The body was not a SOAP envelope with a `Body` element
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// UPnP error code from a `s:Fault` body (e.g. 701 transition not available)
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}
