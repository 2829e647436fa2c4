use serde::{Deserialize, Serialize};

use super::format::{format_ghz, usage_percent, ByteSize, NOT_AVAILABLE};

/// Processor description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub manufacturer: String,
    pub brand: String,
    /// Manufacturer and brand combined, without repeating the manufacturer
    pub model: String,
    pub speed_ghz: f64,
    pub speed: String,
    pub logical_cores: u32,
    pub physical_cores: u32,
}

impl CpuInfo {
    pub fn new(
        manufacturer: String,
        brand: String,
        speed_ghz: f64,
        logical_cores: u32,
        physical_cores: u32,
    ) -> Self {
        let model = if brand.starts_with(&manufacturer) || manufacturer.is_empty() {
            brand.clone()
        } else {
            format!("{} {}", manufacturer, brand)
        };

        Self {
            manufacturer,
            brand,
            model,
            speed_ghz,
            speed: format_ghz(speed_ghz),
            logical_cores,
            physical_cores,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            manufacturer: NOT_AVAILABLE.to_string(),
            brand: NOT_AVAILABLE.to_string(),
            model: NOT_AVAILABLE.to_string(),
            speed_ghz: 0.0,
            speed: NOT_AVAILABLE.to_string(),
            logical_cores: 0,
            physical_cores: 0,
        }
    }
}

/// Physical memory totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: ByteSize,
    pub used: ByteSize,
    pub free: ByteSize,
    pub total_gb: u64,
    pub usage_percent: u8,
}

impl MemoryInfo {
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        let total = ByteSize::new(total_bytes);
        Self {
            total_gb: total.whole_gb(),
            usage_percent: usage_percent(used_bytes, total_bytes),
            used: ByteSize::new(used_bytes),
            free: ByteSize::new(total_bytes.saturating_sub(used_bytes)),
            total,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(0, 0)
    }
}

/// Graphics controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuController {
    pub vendor: String,
    pub model: String,
    /// `None` renders as "N/A"
    pub vram: Option<ByteSize>,
    pub driver_version: String,
}

impl GpuController {
    pub fn new(vendor: String, model: String) -> Self {
        Self {
            vendor,
            model,
            vram: None,
            driver_version: NOT_AVAILABLE.to_string(),
        }
    }

    pub fn with_vram(mut self, vram_bytes: Option<u64>) -> Self {
        self.vram = vram_bytes.filter(|b| *b > 0).map(ByteSize::new);
        self
    }

    pub fn with_driver_version(mut self, driver_version: Option<String>) -> Self {
        self.driver_version = driver_version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        self
    }
}

/// Machine identity from SMBIOS/DMI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemIdentity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiosInfo {
    pub vendor: String,
    pub version: String,
    pub release_date: String,
}
