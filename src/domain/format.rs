use serde::{Deserialize, Serialize};

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const GIB: u64 = 1024 * 1024 * 1024;

/// Placeholder for scalar text fields whose source could not be read
pub const NOT_AVAILABLE: &str = "N/A";

/// Byte count paired with its human-readable rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteSize {
    pub bytes: u64,
    pub display: String,
}

impl ByteSize {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes,
            display: format_bytes(bytes),
        }
    }

    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Whole gibibytes, rounded to nearest
    pub fn whole_gb(&self) -> u64 {
        let whole = self.bytes / GIB;
        if self.bytes % GIB >= GIB / 2 {
            whole + 1
        } else {
            whole
        }
    }
}

/// Uptime in seconds with its `Nd Nh Nm` rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub seconds: u64,
    pub display: String,
}

impl Uptime {
    pub fn new(seconds: u64) -> Self {
        Self {
            seconds,
            display: format_uptime(seconds),
        }
    }
}

/// Render a byte count with 1024-based units and at most two decimals.
///
/// Trailing zeros are dropped, so 1536 renders as `1.5 KB` and 2^30 as `1 GB`.
/// Values past the terabyte range stay in TB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit + 1 < BYTE_UNITS.len() && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, BYTE_UNITS[unit])
}

pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

/// `round(used / total * 100)`, clamped to 0..=100; 0 when `total` is 0
pub fn usage_percent(used: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (used as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Clock speed rendering, e.g. `3.6GHz`
pub fn format_ghz(ghz: f64) -> String {
    let rendered = format!("{:.2}", ghz);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{}GHz", rendered)
}
