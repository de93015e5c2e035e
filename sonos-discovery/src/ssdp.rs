//! SSDP (Simple Service Discovery Protocol) client
//!
//! Internal only. Sends M-SEARCH datagrams to the UPnP multicast group and
//! reads unicast replies until the socket read timeout expires.

use std::net::UdpSocket;
use std::time::Duration;

use crate::error::{DiscoveryError, Result};

const MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Number of M-SEARCH datagrams sent per search; UDP may drop any one of them
const SEARCH_REPEATS: usize = 3;

/// SSDP response containing device information
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub urn: String,
    pub usn: String,
    pub server: Option<String>,
}

/// SSDP client for device discovery
pub(crate) struct SsdpClient {
    socket: UdpSocket,
    mx: u64,
}

impl SsdpClient {
    /// Create a new SSDP client whose reads give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to bind UDP socket: {}", e)))?;

        socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set read timeout: {}", e)))?;

        socket
            .set_multicast_ttl_v4(4)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set multicast TTL: {}", e)))?;

        Ok(Self {
            socket,
            mx: timeout.as_secs().clamp(1, 5),
        })
    }

    /// Send M-SEARCH requests and return an iterator over the replies
    pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>> {
        let request = search_request(search_target, self.mx);

        for _ in 0..SEARCH_REPEATS {
            self.socket
                .send_to(request.as_bytes(), MULTICAST_ADDR)
                .map_err(|e| DiscoveryError::NetworkError(format!("Failed to send M-SEARCH: {}", e)))?;
        }

        Ok(SsdpResponseIterator {
            socket: &self.socket,
            buffer: [0; 2048],
            finished: false,
        })
    }
}

fn search_request(search_target: &str, mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         \r\n",
        MULTICAST_ADDR, mx, search_target
    )
}

/// Iterator for SSDP responses; ends at the first read timeout
pub(crate) struct SsdpResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl Iterator for SsdpResponseIterator<'_> {
    type Item = Result<SsdpResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((size, _)) => {
                    let parsed = std::str::from_utf8(&self.buffer[..size])
                        .ok()
                        .and_then(parse_ssdp_response);
                    if let Some(response) = parsed {
                        return Some(Ok(response));
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(DiscoveryError::NetworkError(format!("Socket error: {}", e))));
                }
            }
        }
        None
    }
}

/// Parse an SSDP response from HTTP text
fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut urn = None;
    let mut usn = None;
    let mut server = None;

    for line in response.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match name.trim().to_ascii_uppercase().as_str() {
            "LOCATION" => location = Some(value),
            "ST" => urn = Some(value),
            "USN" => usn = Some(value),
            "SERVER" => server = Some(value),
            _ => {}
        }
    }

    Some(SsdpResponse {
        location: location.filter(|l| !l.is_empty())?,
        urn: urn?,
        usn: usn?,
        server,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ssdp_response_valid() {
        let response = "HTTP/1.1 200 OK\r\n\
            CACHE-CONTROL: max-age = 1800\r\n\
            LOCATION: http://192.168.1.100:1400/xml/device_description.xml\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            SERVER: Linux/3.14.0 UPnP/1.0 Sonos/70.3-35220\r\n\
            X-RINCON-HOUSEHOLD: Sonos_abc\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response).unwrap();

        assert_eq!(parsed.location, "http://192.168.1.100:1400/xml/device_description.xml");
        assert_eq!(parsed.urn, "urn:schemas-upnp-org:device:ZonePlayer:1");
        assert_eq!(
            parsed.usn,
            "uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1"
        );
        assert_eq!(parsed.server.as_deref(), Some("Linux/3.14.0 UPnP/1.0 Sonos/70.3-35220"));
    }

    #[test]
    fn test_parse_ssdp_response_case_insensitive_headers() {
        let response = "HTTP/1.1 200 OK\r\n\
            location: http://192.168.1.102:1400/xml/device_description.xml\r\n\
            st: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            Usn: uuid:RINCON_000E58A0ABCDEF::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response).unwrap();
        assert_eq!(parsed.location, "http://192.168.1.102:1400/xml/device_description.xml");
        assert_eq!(parsed.server, None);
    }

    #[test]
    fn test_parse_ssdp_response_requires_location_st_and_usn() {
        let missing_location = "HTTP/1.1 200 OK\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_000E58A0123456\r\n\r\n";
        let empty_location = "HTTP/1.1 200 OK\r\n\
            LOCATION:\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_000E58A0123456\r\n\r\n";
        let missing_usn = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.100:1400/xml/device_description.xml\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\r\n";

        assert!(parse_ssdp_response(missing_location).is_none());
        assert!(parse_ssdp_response(empty_location).is_none());
        assert!(parse_ssdp_response(missing_usn).is_none());
        assert!(parse_ssdp_response("").is_none());
        assert!(parse_ssdp_response("garbage without headers").is_none());
    }

    #[test]
    fn test_search_request_format() {
        let request = search_request("urn:schemas-upnp-org:device:ZonePlayer:1", 2);

        assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(request.contains("HOST: 239.255.255.250:1900\r\n"));
        assert!(request.contains("MAN: \"ssdp:discover\"\r\n"));
        assert!(request.contains("MX: 2\r\n"));
        assert!(request.contains("ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_mx_is_clamped_to_timeout() {
        let client = SsdpClient::new(Duration::from_millis(200)).unwrap();
        assert_eq!(client.mx, 1);

        let client = SsdpClient::new(Duration::from_secs(30)).unwrap();
        assert_eq!(client.mx, 5);
    }
}
