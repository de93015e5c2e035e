//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal, blocking SOAP client for talking to the
//! control endpoints of UPnP devices such as Sonos speakers. Every call is a
//! single HTTP POST; there is no connection state beyond the pooled agent.

mod error;

pub use error::SoapError;

use std::time::Duration;
use xmltree::Element;

/// Port every Sonos player serves its UPnP endpoints on
pub const DEVICE_PORT: u16 = 1400;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
    port: u16,
}

impl SoapClient {
    /// Create a new SOAP client with the default timeouts (5s connect, 10s read)
    pub fn new() -> Self {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
            port: DEVICE_PORT,
        }
    }

    /// Target a port other than 1400 (device simulators, test fixtures)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Send a SOAP request and return the `<{action}Response>` element
    ///
    /// # Arguments
    /// * `ip` - Device address (the client's port, 1400 by default, is appended)
    /// * `endpoint` - Control endpoint path, e.g. "MediaRenderer/AVTransport/Control"
    /// * `service_uri` - Service URN used for the SOAPACTION header
    /// * `action` - Action name, e.g. "Play"
    /// * `payload` - XML arguments placed inside the action element
    pub fn call(
        &self,
        ip: &str,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = envelope(service_uri, action, payload);
        let url = format!("http://{}:{}/{}", ip, self.port, endpoint);
        let soap_action = format!("\"{}#{}\"", service_uri, action);

        let xml_text = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Connection(e.to_string()))?,
            // Sonos reports failed actions as HTTP 500 with a fault body
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                return Err(fault_from_body(&text).unwrap_or(SoapError::Http(status)));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(SoapError::Connection(transport.to_string()));
            }
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn envelope(service_uri: &str, action: &str, payload: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#,
        action = action,
        service_uri = service_uri,
        payload = payload
    )
}

/// Parse an error body and return the SOAP fault it carries, if any
fn fault_from_body(text: &str) -> Option<SoapError> {
    let xml = Element::parse(text.as_bytes()).ok()?;
    let body = xml.get_child("Body")?;
    body.get_child("Fault").map(fault_code).map(SoapError::Fault)
}

fn fault_code(fault: &Element) -> u16 {
    fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"))
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(500)
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        return Err(SoapError::Fault(fault_code(fault)));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}
