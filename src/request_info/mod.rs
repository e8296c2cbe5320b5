//! Request metadata extraction
//!
//! Turns the parts of an inbound request (peer address, HTTP version,
//! headers) into the [`ResponseInfo`] echoed back to the client.

mod model;

pub use model::{IpFamily, IpInfo, ResponseInfo, UaInfo};

use chrono::{DateTime, SecondsFormat, Utc};
use hyper::header::{HeaderMap, USER_AGENT};
use hyper::Version;
use std::net::IpAddr;

pub const SEC_CH_UA: &str = "sec-ch-ua";
pub const SEC_CH_UA_MOBILE: &str = "sec-ch-ua-mobile";
pub const SEC_CH_UA_PLATFORM: &str = "sec-ch-ua-platform";

/// Reported when the server cannot name the protocol version
pub const UNKNOWN_PROTOCOL: &str = "Unknown";

impl ResponseInfo {
    /// Build the response for a request received now.
    pub fn collect(headers: &HeaderMap, version: Version, peer_address: &str) -> Self {
        Self::collect_at(Utc::now(), headers, version, peer_address)
    }

    pub fn collect_at(
        now: DateTime<Utc>,
        headers: &HeaderMap,
        version: Version,
        peer_address: &str,
    ) -> Self {
        Self {
            time: format_time(now),
            ip: IpInfo {
                address: peer_address.to_string(),
                family: classify_family(peer_address),
                protocol: protocol_label(version).to_string(),
            },
            ua: client_hints(headers),
        }
    }
}

/// ISO-8601 UTC with microseconds and a literal `Z`, e.g. `2024-01-01T12:00:00.000000Z`.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Classify an address string by IP version.
///
/// Anything that is not an IP literal is `Unknown`; callers still echo the
/// original string.
pub fn classify_family(address: &str) -> IpFamily {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => IpFamily::IPv4,
        Ok(IpAddr::V6(_)) => IpFamily::IPv6,
        Err(_) => IpFamily::Unknown,
    }
}

pub fn protocol_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => UNKNOWN_PROTOCOL,
    }
}

/// Read the user-agent and `Sec-CH-UA*` client hints. Header names are
/// case-insensitive; values are kept verbatim.
pub fn client_hints(headers: &HeaderMap) -> UaInfo {
    UaInfo {
        user_agent: header_value(headers, USER_AGENT.as_str()),
        sec_ch_ua: header_value(headers, SEC_CH_UA),
        sec_ch_ua_mobile: header_value(headers, SEC_CH_UA_MOBILE),
        sec_ch_ua_platform: header_value(headers, SEC_CH_UA_PLATFORM),
    }
}

// Non-UTF-8 bytes are replaced rather than treating the header as absent.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
