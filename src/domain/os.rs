use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::{Uptime, NOT_AVAILABLE};

/// Who and where the snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub host_name: String,
    pub user_name: String,
    pub domain: String,
    pub captured_at: DateTime<Utc>,
}

impl Identity {
    pub fn unavailable(captured_at: DateTime<Utc>) -> Self {
        Self {
            host_name: NOT_AVAILABLE.to_string(),
            user_name: NOT_AVAILABLE.to_string(),
            domain: NOT_AVAILABLE.to_string(),
            captured_at,
        }
    }
}

/// Operating system description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub distro: String,
    pub release: String,
    /// `"<distro> <release>"`
    pub name: String,
    pub kernel: String,
    pub platform: String,
    pub arch: String,
    pub uptime: Uptime,
}

impl OsInfo {
    pub fn new(
        distro: String,
        release: String,
        kernel: String,
        platform: String,
        arch: String,
        uptime_seconds: u64,
    ) -> Self {
        let name = format!("{} {}", distro, release).trim().to_string();
        Self {
            distro,
            release,
            name,
            kernel,
            platform,
            arch,
            uptime: Uptime::new(uptime_seconds),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            distro: NOT_AVAILABLE.to_string(),
            release: NOT_AVAILABLE.to_string(),
            name: NOT_AVAILABLE.to_string(),
            kernel: NOT_AVAILABLE.to_string(),
            platform: NOT_AVAILABLE.to_string(),
            arch: NOT_AVAILABLE.to_string(),
            uptime: Uptime::new(0),
        }
    }
}
