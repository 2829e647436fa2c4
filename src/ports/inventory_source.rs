use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Why a single probe produced no usable reading
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("not supported on {0}")]
    Unsupported(&'static str),

    #[error("malformed result: {0}")]
    Malformed(String),

    #[error("timed out after {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("probe task failed: {0}")]
    Join(String),
}

impl ProbeError {
    pub fn unsupported() -> Self {
        Self::Unsupported(std::env::consts::OS)
    }

    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Raw CPU data as reported by the provider
#[derive(Debug, Clone, Default)]
pub struct CpuReading {
    pub vendor: String,
    pub brand: String,
    pub frequency_mhz: f64,
    pub logical_cores: usize,
    pub physical_cores: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// OS release data plus the identity of the machine and session
#[derive(Debug, Clone, Default)]
pub struct OsReading {
    pub host_name: Option<String>,
    pub user_name: Option<String>,
    pub domain: Option<String>,
    pub distro: Option<String>,
    pub release: Option<String>,
    pub kernel: Option<String>,
    pub platform: String,
    pub arch: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Default)]
pub struct GpuReading {
    pub vendor: String,
    pub model: String,
    pub vram_bytes: Option<u64>,
    pub driver_version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DiskReading {
    pub device: String,
    pub model: Option<String>,
    pub kind: Option<String>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FilesystemReading {
    pub device: String,
    pub mount_point: String,
    pub filesystem: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SystemReading {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BiosReading {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceReading {
    pub name: String,
    pub ipv4: Vec<String>,
    pub mac: String,
    /// `None` when the provider cannot tell
    pub link_type: Option<String>,
    pub speed_mbps: Option<u64>,
    pub dhcp: Option<bool>,
}

/// One logged-in session
#[derive(Debug, Clone, Default)]
pub struct UserReading {
    pub name: String,
    pub terminal: Option<String>,
    pub host: Option<String>,
    pub login_time: Option<String>,
    /// Session state such as `active` or `disc`
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessReading {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
}

/// Processes together with the memory total their share is measured against
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    pub total_memory_bytes: u64,
    pub processes: Vec<ProcessReading>,
}

/// Port for the host inventory probes.
///
/// Each method is one independent probe. Implementations must not make one
/// probe wait on another, so a capture can run them all at once.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn cpu(&self) -> ProbeResult<CpuReading>;

    async fn memory(&self) -> ProbeResult<MemoryReading>;

    /// OS release, host name, current user and domain
    async fn os(&self) -> ProbeResult<OsReading>;

    async fn graphics(&self) -> ProbeResult<Vec<GpuReading>>;

    /// Physical disks, independent of partitioning
    async fn disk_layout(&self) -> ProbeResult<Vec<DiskReading>>;

    /// Mounted filesystems with their sizes
    async fn filesystems(&self) -> ProbeResult<Vec<FilesystemReading>>;

    async fn system(&self) -> ProbeResult<SystemReading>;

    async fn bios(&self) -> ProbeResult<BiosReading>;

    async fn network_interfaces(&self) -> ProbeResult<Vec<InterfaceReading>>;

    /// Users logged in right now, one reading per session
    async fn users(&self) -> ProbeResult<Vec<UserReading>>;

    async fn processes(&self) -> ProbeResult<ProcessTable>;
}
