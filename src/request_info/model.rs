//! JSON shape of the request-info response.
//!
//! Field order here is the key order on the wire.

use serde::Serialize;

/// Everything echoed back for one request. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseInfo {
    pub time: String,
    pub ip: IpInfo,
    pub ua: UaInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpInfo {
    pub address: String,
    pub family: IpFamily,
    pub protocol: String,
}

/// Browser identification headers.
///
/// Absent headers serialize as `null`; the keys are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UaInfo {
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
    #[serde(rename = "sec-ch-ua")]
    pub sec_ch_ua: Option<String>,
    #[serde(rename = "sec-ch-ua-mobile")]
    pub sec_ch_ua_mobile: Option<String>,
    #[serde(rename = "sec-ch-ua-platform")]
    pub sec_ch_ua_platform: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpFamily {
    IPv4,
    IPv6,
    Unknown,
}
