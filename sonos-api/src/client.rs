use soap_client::SoapClient;

use crate::{Result, ServiceInfo, SonosOperation};

/// Runs [`SonosOperation`]s against speakers by IP
///
/// Clones share one HTTP agent, so one client can serve every speaker.
#[derive(Debug, Clone, Default)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured transport (timeouts, control port)
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Send `request` to the speaker at `ip` and decode its reply
    ///
    /// SOAP faults surface as [`crate::ApiError::SoapFault`] carrying the UPnP
    /// error code; an unreachable speaker is a connection error.
    ///
    /// # Example
    /// ```rust,no_run
    /// use sonos_api::SonosClient;
    /// use sonos_api::operations::av_transport::{GetTransportInfoOperation, GetTransportInfoOperationRequest};
    ///
    /// let client = SonosClient::new();
    /// let request = GetTransportInfoOperationRequest { instance_id: 0 };
    /// let info = client.execute::<GetTransportInfoOperation>("192.168.1.100", &request)?;
    /// println!("{}", info.current_transport_state);
    /// # Ok::<(), sonos_api::ApiError>(())
    /// ```
    pub fn execute<Op: SonosOperation>(&self, ip: &str, request: &Op::Request) -> Result<Op::Response> {
        let ServiceInfo { endpoint, service_uri } = Op::SERVICE.info();
        let body = self
            .soap_client
            .call(ip, endpoint, service_uri, Op::ACTION, &Op::build_payload(request))?;
        Op::parse_response(&body)
    }
}
