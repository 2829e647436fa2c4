mod command;
mod parser;
#[cfg(target_os = "linux")]
mod sysfs;
#[cfg(target_os = "windows")]
mod windows;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::ports::{
    BiosReading, CpuReading, DiskReading, FilesystemReading, GpuReading, InterfaceReading,
    InventorySource, MemoryReading, OsReading, ProbeError, ProbeResult, ProcessReading,
    ProcessTable, SystemReading, UserReading,
};

/// Where the host adapter looks for kernel-exported data (useful for container mounts)
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub sys_path: PathBuf,
    /// systemd-networkd DHCP lease directory
    pub lease_dir: PathBuf,
}

impl HostConfig {
    pub fn new(sys_path: impl Into<PathBuf>) -> Self {
        Self {
            sys_path: sys_path.into(),
            ..Self::default()
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sys_path: PathBuf::from("/sys"),
            lease_dir: PathBuf::from("/run/systemd/netif/leases"),
        }
    }
}

/// Production inventory source for the machine the process runs on
#[derive(Debug, Clone)]
pub struct HostAdapter {
    config: Arc<HostConfig>,
}

impl HostAdapter {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run a blocking OS query off the async workers
    async fn blocking<T, F>(&self, probe: F) -> ProbeResult<T>
    where
        F: FnOnce(&HostConfig) -> ProbeResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || probe(&config))
            .await
            .map_err(|e| ProbeError::Join(e.to_string()))?
    }
}

#[cfg(unix)]
fn current_user_name() -> Option<String> {
    use nix::unistd::{geteuid, User};

    match User::from_uid(geteuid()) {
        Ok(Some(user)) => Some(user.name),
        _ => std::env::var("USER").ok(),
    }
}

#[cfg(not(unix))]
fn current_user_name() -> Option<String> {
    std::env::var("USERNAME").ok()
}

/// NVIDIA cards from nvidia-smi, empty when the tool is missing
#[cfg(any(target_os = "linux", target_os = "windows"))]
async fn nvidia_gpus() -> ProbeResult<Vec<GpuReading>> {
    Ok(command::query_nvidia_gpus()
        .await
        .map(|out| parser::parse_nvidia_smi_csv(&out))
        .transpose()?
        .unwrap_or_default())
}

#[cfg(target_os = "linux")]
impl HostAdapter {
    async fn read_graphics(&self) -> ProbeResult<Vec<GpuReading>> {
        let nvidia = nvidia_gpus().await?;
        let skip_nvidia = !nvidia.is_empty();
        let cards = self
            .blocking(move |config| Ok(sysfs::read_drm_cards(&config.sys_path, skip_nvidia)?))
            .await;

        match cards {
            Ok(cards) => Ok(nvidia.into_iter().chain(cards).collect()),
            Err(e) if skip_nvidia => {
                tracing::debug!(error = %e, "drm listing failed, keeping nvidia-smi results");
                Ok(nvidia)
            }
            Err(e) => Err(e),
        }
    }

    async fn read_disk_layout(&self) -> ProbeResult<Vec<DiskReading>> {
        self.blocking(|config| Ok(sysfs::read_disk_layout(&config.sys_path)?))
            .await
    }

    async fn read_system(&self) -> ProbeResult<SystemReading> {
        self.blocking(|config| Ok(sysfs::read_system(&config.sys_path)?))
            .await
    }

    async fn read_bios(&self) -> ProbeResult<BiosReading> {
        self.blocking(|config| Ok(sysfs::read_bios(&config.sys_path)?))
            .await
    }
}

#[cfg(target_os = "windows")]
impl HostAdapter {
    async fn read_graphics(&self) -> ProbeResult<Vec<GpuReading>> {
        // AdapterRAM is a 32-bit counter, so nvidia-smi wins for NVIDIA cards
        let nvidia = nvidia_gpus().await?;
        let others = windows::video_controllers()
            .await?
            .into_iter()
            .filter(|gpu| nvidia.is_empty() || !gpu.vendor.to_ascii_uppercase().contains("NVIDIA"));
        Ok(nvidia.into_iter().chain(others).collect())
    }

    async fn read_disk_layout(&self) -> ProbeResult<Vec<DiskReading>> {
        windows::disk_drives().await
    }

    async fn read_system(&self) -> ProbeResult<SystemReading> {
        windows::computer_system_product().await
    }

    async fn read_bios(&self) -> ProbeResult<BiosReading> {
        windows::bios().await
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
impl HostAdapter {
    async fn read_graphics(&self) -> ProbeResult<Vec<GpuReading>> {
        match command::query_nvidia_gpus().await {
            Some(out) => Ok(parser::parse_nvidia_smi_csv(&out)?),
            None => Err(ProbeError::unsupported()),
        }
    }

    async fn read_disk_layout(&self) -> ProbeResult<Vec<DiskReading>> {
        Err(ProbeError::unsupported())
    }

    async fn read_system(&self) -> ProbeResult<SystemReading> {
        Err(ProbeError::unsupported())
    }

    async fn read_bios(&self) -> ProbeResult<BiosReading> {
        Err(ProbeError::unsupported())
    }
}

#[cfg(unix)]
async fn read_sessions() -> ProbeResult<Vec<UserReading>> {
    let raw = command::run_who().await?;
    Ok(parser::parse_who(&raw)?)
}

#[cfg(target_os = "windows")]
async fn read_sessions() -> ProbeResult<Vec<UserReading>> {
    windows::logged_on_users().await
}

#[cfg(not(any(unix, target_os = "windows")))]
async fn read_sessions() -> ProbeResult<Vec<UserReading>> {
    Err(ProbeError::unsupported())
}

/// sysinfo reports each process against one core; rescale so 100 means every core
fn machine_cpu_percent(per_core: f32, cpu_count: usize) -> f64 {
    per_core as f64 / cpu_count.max(1) as f64
}

/// Link type, speed and DHCP flag where the platform exposes them
#[cfg(target_os = "linux")]
fn enrich_interface(config: &HostConfig, mut iface: InterfaceReading) -> InterfaceReading {
    let details = sysfs::read_link_details(&config.sys_path, &config.lease_dir, &iface.name);
    iface.link_type = details.link_type;
    iface.speed_mbps = details.speed_mbps;
    iface.dhcp = details.dhcp;
    iface
}

#[cfg(not(target_os = "linux"))]
fn enrich_interface(_config: &HostConfig, iface: InterfaceReading) -> InterfaceReading {
    iface
}

#[async_trait]
impl InventorySource for HostAdapter {
    async fn cpu(&self) -> ProbeResult<CpuReading> {
        self.blocking(|_| {
            let mut sys = System::new();
            sys.refresh_cpu_all();

            let cpus = sys.cpus();
            let first = cpus.first();
            Ok(CpuReading {
                vendor: first.map(|c| c.vendor_id().to_string()).unwrap_or_default(),
                brand: first.map(|c| c.brand().to_string()).unwrap_or_default(),
                frequency_mhz: first.map(|c| c.frequency() as f64).unwrap_or(0.0),
                logical_cores: cpus.len(),
                physical_cores: sys.physical_core_count(),
            })
        })
        .await
    }

    async fn memory(&self) -> ProbeResult<MemoryReading> {
        self.blocking(|_| {
            let mut sys = System::new();
            sys.refresh_memory();
            Ok(MemoryReading {
                total_bytes: sys.total_memory(),
                used_bytes: sys.used_memory(),
            })
        })
        .await
    }

    async fn os(&self) -> ProbeResult<OsReading> {
        self.blocking(|_| {
            Ok(OsReading {
                host_name: System::host_name(),
                user_name: current_user_name(),
                domain: std::env::var("USERDOMAIN").ok(),
                distro: System::name(),
                release: System::os_version(),
                kernel: System::kernel_version(),
                platform: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
                uptime_seconds: System::uptime(),
            })
        })
        .await
    }

    async fn graphics(&self) -> ProbeResult<Vec<GpuReading>> {
        self.read_graphics().await
    }

    async fn disk_layout(&self) -> ProbeResult<Vec<DiskReading>> {
        self.read_disk_layout().await
    }

    async fn filesystems(&self) -> ProbeResult<Vec<FilesystemReading>> {
        self.blocking(|_| {
            let disks = Disks::new_with_refreshed_list();
            Ok(disks
                .iter()
                .map(|d| FilesystemReading {
                    device: d.name().to_string_lossy().to_string(),
                    mount_point: d.mount_point().to_string_lossy().to_string(),
                    filesystem: d.file_system().to_string_lossy().to_string(),
                    total_bytes: d.total_space(),
                    available_bytes: d.available_space(),
                })
                .collect())
        })
        .await
    }

    async fn system(&self) -> ProbeResult<SystemReading> {
        self.read_system().await
    }

    async fn bios(&self) -> ProbeResult<BiosReading> {
        self.read_bios().await
    }

    async fn network_interfaces(&self) -> ProbeResult<Vec<InterfaceReading>> {
        self.blocking(|config| {
            let networks = Networks::new_with_refreshed_list();
            Ok(networks
                .iter()
                .map(|(name, data)| {
                    let ipv4 = data
                        .ip_networks()
                        .iter()
                        .filter(|ip| matches!(ip.addr, IpAddr::V4(_)))
                        .map(|ip| ip.addr.to_string())
                        .collect();
                    let iface = InterfaceReading {
                        name: name.clone(),
                        ipv4,
                        mac: data.mac_address().to_string(),
                        ..Default::default()
                    };
                    enrich_interface(config, iface)
                })
                .collect())
        })
        .await
    }

    async fn users(&self) -> ProbeResult<Vec<UserReading>> {
        read_sessions().await
    }

    async fn processes(&self) -> ProbeResult<ProcessTable> {
        self.blocking(|_| {
            let mut sys = System::new();
            sys.refresh_memory();
            sys.refresh_cpu_all();

            // CPU usage is a delta between two refreshes
            sys.refresh_processes(ProcessesToUpdate::All, true);
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_processes(ProcessesToUpdate::All, true);

            let cpu_count = sys.cpus().len();

            let processes = sys
                .processes()
                .values()
                .map(|p| ProcessReading {
                    pid: p.pid().as_u32(),
                    name: p.name().to_string_lossy().to_string(),
                    cpu_percent: machine_cpu_percent(p.cpu_usage(), cpu_count),
                    memory_bytes: p.memory(),
                })
                .collect();

            Ok(ProcessTable {
                total_memory_bytes: sys.total_memory(),
                processes,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::new("/host/sys");
        assert_eq!(config.sys_path, PathBuf::from("/host/sys"));
        assert_eq!(config.lease_dir, PathBuf::from("/run/systemd/netif/leases"));
    }

    #[tokio::test]
    async fn test_os_probe_reports_build_target() {
        let adapter = HostAdapter::new(HostConfig::default());
        let os = adapter.os().await.unwrap();
        assert_eq!(os.platform, std::env::consts::OS);
        assert_eq!(os.arch, std::env::consts::ARCH);
    }

    #[tokio::test]
    async fn test_memory_probe_is_consistent() {
        let adapter = HostAdapter::new(HostConfig::default());
        let memory = adapter.memory().await.unwrap();
        assert!(memory.used_bytes <= memory.total_bytes);
    }

    #[tokio::test]
    async fn test_missing_sysfs_fails_only_that_probe() {
        let adapter = HostAdapter::new(HostConfig::new("/nonexistent/hostinv-sys"));
        if cfg!(target_os = "linux") {
            assert!(adapter.system().await.is_err());
            assert!(adapter.disk_layout().await.is_err());
        }
        assert!(adapter.memory().await.is_ok());
    }

    #[test]
    fn test_cpu_percent_is_share_of_all_cpus() {
        assert_eq!(machine_cpu_percent(100.0, 4), 25.0);
        assert_eq!(machine_cpu_percent(350.0, 8), 43.75);
        assert_eq!(machine_cpu_percent(12.5, 0), 12.5);
    }
}
