//! Client attribute extraction for click analytics.
//!
//! Turns the request's peer address and headers into a [`ClickContext`]:
//! client IP, device class, browser, operating system and referrer. The
//! classification is stateless; anything that cannot be determined is
//! recorded as `"unknown"` (or an empty referrer).

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;
use woothee::parser::Parser;

use crate::domain::entities::click::UNKNOWN;
use crate::domain::entities::{ClickContext, DeviceType};

/// Device, browser and OS derived from a user agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
}

impl Default for UserAgentInfo {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Unknown,
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

/// Classifies a user agent string.
///
/// Tablets are detected from well-known markers before falling back to
/// woothee's category: `pc` is a desktop, `smartphone`/`mobilephone` is
/// mobile, and crawlers or appliances stay unknown.
pub fn parse_user_agent(user_agent: &str) -> UserAgentInfo {
    let user_agent = user_agent.trim();
    if user_agent.is_empty() {
        return UserAgentInfo::default();
    }

    let result = Parser::new().parse(user_agent).unwrap_or_default();

    let device_type = if is_tablet(user_agent) {
        DeviceType::Tablet
    } else {
        match result.category {
            "pc" => DeviceType::Desktop,
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            _ => DeviceType::Unknown,
        }
    };

    UserAgentInfo {
        device_type,
        browser: known_or_unknown(result.name),
        os: known_or_unknown(result.os),
    }
}

fn is_tablet(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ua.contains("ipad")
        || ua.contains("tablet")
        || (ua.contains("android") && !ua.contains("mobile"))
}

fn known_or_unknown(value: &str) -> String {
    if value.is_empty() || value.eq_ignore_ascii_case("UNKNOWN") {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// Determines the client IP.
///
/// Behind a trusted proxy the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`; otherwise the socket peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Builds the click context for a request.
pub fn extract_click_context(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    behind_proxy: bool,
) -> ClickContext {
    let ua = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(parse_user_agent)
        .unwrap_or_default();

    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    ClickContext {
        ip: client_ip(headers, peer, behind_proxy),
        device_type: ua.device_type,
        browser: ua.browser,
        os: ua.os,
        country: UNKNOWN.to_string(),
        referrer,
    }
}
