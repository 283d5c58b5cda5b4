//! Click entity representing a single resolved visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder stored when a client attribute could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Coarse device classification derived from the user agent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    #[default]
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = std::convert::Infallible;

    /// Unrecognised values fall back to [`DeviceType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mobile" => DeviceType::Mobile,
            "tablet" => DeviceType::Tablet,
            "desktop" => DeviceType::Desktop,
            _ => DeviceType::Unknown,
        })
    }
}

/// Client attributes extracted from an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickContext {
    pub ip: String,
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
    pub country: String,
    pub referrer: String,
}

impl Default for ClickContext {
    fn default() -> Self {
        Self {
            ip: UNKNOWN.to_string(),
            device_type: DeviceType::Unknown,
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            referrer: String::new(),
        }
    }
}

/// One immutable analytics record, appended when a link is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
    pub country: String,
    pub referrer: String,
}

impl ClickEvent {
    pub fn new(timestamp: DateTime<Utc>, context: ClickContext) -> Self {
        Self {
            timestamp,
            ip: context.ip,
            device_type: context.device_type,
            browser: context.browser,
            os: context.os,
            country: context.country,
            referrer: context.referrer,
        }
    }
}
