use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Snapshot, SourceId, SourceStatus, StorageInfo};
use crate::ports::{InventorySource, ProbeError, ProbeResult};

use super::normalize;

/// One probe that produced no usable value in a capture
#[derive(Debug, Error)]
#[error("{source_id}: {cause}")]
pub struct ProbeFailure {
    pub source_id: SourceId,
    pub cause: ProbeError,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("every inventory source failed ({} probes)", .failures.len())]
    SourceUnavailable { failures: Vec<ProbeFailure> },
}

/// Capture tuning
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Deadline applied to each probe independently
    pub probe_timeout: Duration,
    /// Processes kept in the snapshot, 0 keeps all
    pub process_limit: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            process_limit: 50,
        }
    }
}

/// Main application service: builds one snapshot per call from every probe
pub struct InventoryService {
    source: Arc<dyn InventorySource>,
    options: CaptureOptions,
}

impl InventoryService {
    pub fn new(source: Arc<dyn InventorySource>, options: CaptureOptions) -> Self {
        Self { source, options }
    }

    /// Run one probe under the capture deadline
    async fn settle<T, F>(&self, source_id: SourceId, probe: F) -> ProbeResult<T>
    where
        F: Future<Output = ProbeResult<T>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.options.probe_timeout, probe).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ProbeError::TimedOut(self.options.probe_timeout)),
        };
        debug!(
            source = %source_id,
            ok = outcome.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "probe settled"
        );
        outcome
    }

    /// Collect a complete host snapshot.
    ///
    /// All probes run concurrently and every one is awaited, whatever its
    /// siblings do. Failed probes leave their fields at the documented
    /// sentinels and are recorded in `source_status`. Only when no probe
    /// succeeds does the capture itself fail.
    pub async fn capture_snapshot(&self) -> Result<Snapshot, CaptureError> {
        let captured_at = Utc::now();
        let started = Instant::now();
        let source = &self.source;

        let (
            cpu,
            memory,
            os,
            graphics,
            disks,
            filesystems,
            system,
            bios,
            network,
            users,
            processes,
        ) = tokio::join!(
            self.settle(SourceId::Cpu, source.cpu()),
            self.settle(SourceId::Memory, source.memory()),
            self.settle(SourceId::Os, source.os()),
            self.settle(SourceId::Graphics, source.graphics()),
            self.settle(SourceId::DiskLayout, source.disk_layout()),
            self.settle(SourceId::Filesystems, source.filesystems()),
            self.settle(SourceId::System, source.system()),
            self.settle(SourceId::Bios, source.bios()),
            self.settle(SourceId::Network, source.network_interfaces()),
            self.settle(SourceId::Users, source.users()),
            self.settle(SourceId::Processes, source.processes()),
        );

        let mut merge = Merge::default();

        let cpu = merge.accept(SourceId::Cpu, cpu.and_then(normalize::normalize_cpu));
        let memory = merge.accept(SourceId::Memory, memory.and_then(normalize::normalize_memory));
        let os = merge.accept(
            SourceId::Os,
            os.and_then(|reading| normalize::normalize_os(reading, captured_at)),
        );
        let graphics = merge.accept(
            SourceId::Graphics,
            graphics.and_then(normalize::normalize_graphics),
        );
        let disks = merge.accept(SourceId::DiskLayout, disks.and_then(normalize::normalize_disks));
        let volumes = merge.accept(
            SourceId::Filesystems,
            filesystems.and_then(normalize::normalize_filesystems),
        );
        let system = merge.accept(SourceId::System, system.and_then(normalize::normalize_system));
        let bios = merge.accept(SourceId::Bios, bios.and_then(normalize::normalize_bios));
        let network = merge.accept(
            SourceId::Network,
            network.and_then(normalize::normalize_network),
        );
        let users = merge.accept(SourceId::Users, users.and_then(normalize::normalize_users));
        let process_limit = self.options.process_limit;
        let processes = merge.accept(
            SourceId::Processes,
            processes.and_then(|table| normalize::normalize_processes(table, process_limit)),
        );

        if merge.succeeded == 0 {
            warn!("every inventory source failed");
            return Err(CaptureError::SourceUnavailable {
                failures: merge.failures,
            });
        }

        let mut snapshot = Snapshot::new(captured_at);
        for (source_id, status) in merge.statuses {
            snapshot = snapshot.with_status(source_id, status);
        }
        if let Some((identity, os)) = os {
            snapshot = snapshot.with_identity(identity, os);
        }
        if let Some(cpu) = cpu {
            snapshot = snapshot.with_cpu(cpu);
        }
        if let Some(memory) = memory {
            snapshot = snapshot.with_memory(memory);
        }
        let snapshot = snapshot
            .with_graphics(graphics.unwrap_or_default())
            .with_storage(StorageInfo::from_sources(disks, volumes))
            .with_system(system, bios)
            .with_network(network.unwrap_or_default())
            .with_users(users.unwrap_or_default())
            .with_processes(processes.unwrap_or_default());

        info!(
            ok = merge.succeeded,
            failed = merge.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot captured"
        );

        Ok(snapshot)
    }
}

/// Status bookkeeping while probe outcomes are folded into a snapshot
#[derive(Default)]
struct Merge {
    statuses: Vec<(SourceId, SourceStatus)>,
    succeeded: usize,
    failures: Vec<ProbeFailure>,
}

impl Merge {
    /// Record the outcome for `source_id` and pass the value through
    fn accept<T>(&mut self, source_id: SourceId, outcome: ProbeResult<T>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.succeeded += 1;
                self.statuses.push((source_id, SourceStatus::Ok));
                Some(value)
            }
            Err(cause) => {
                warn!(source = %source_id, error = %cause, "inventory source unavailable");
                self.statuses
                    .push((source_id, SourceStatus::unavailable(cause.to_string())));
                self.failures.push(ProbeFailure { source_id, cause });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::storage::StorageTotalSource;
    use crate::domain::{LinkType, SessionStatus};
    use crate::ports::{
        BiosReading, CpuReading, DiskReading, FilesystemReading, GpuReading, InterfaceReading,
        MemoryReading, OsReading, ProcessReading, ProcessTable, SystemReading, UserReading,
    };

    const GB: u64 = 1024 * 1024 * 1024;

    /// Test double: canned readings, optional per-probe delay and failures
    #[derive(Default)]
    struct FakeSource {
        delay: Duration,
        slow: Option<(SourceId, Duration)>,
        failing: Vec<SourceId>,
        memory: MemoryReading,
    }

    impl FakeSource {
        fn healthy() -> Self {
            Self {
                memory: MemoryReading {
                    total_bytes: 16 * GB,
                    used_bytes: 4 * GB,
                },
                ..Default::default()
            }
        }

        fn failing(mut self, sources: &[SourceId]) -> Self {
            self.failing = sources.to_vec();
            self
        }

        async fn probe<T>(&self, id: SourceId, value: T) -> ProbeResult<T> {
            let mut delay = self.delay;
            if let Some((slow_id, slow_delay)) = self.slow {
                if slow_id == id {
                    delay = slow_delay;
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.failing.contains(&id) {
                return Err(ProbeError::command("probe", format!("{} exploded", id)));
            }
            Ok(value)
        }
    }

    #[async_trait]
    impl InventorySource for FakeSource {
        async fn cpu(&self) -> ProbeResult<CpuReading> {
            self.probe(
                SourceId::Cpu,
                CpuReading {
                    vendor: "AuthenticAMD".into(),
                    brand: "AMD Ryzen 7 5800X 8-Core Processor".into(),
                    frequency_mhz: 3800.0,
                    logical_cores: 16,
                    physical_cores: Some(8),
                },
            )
            .await
        }

        async fn memory(&self) -> ProbeResult<MemoryReading> {
            self.probe(SourceId::Memory, self.memory.clone()).await
        }

        async fn os(&self) -> ProbeResult<OsReading> {
            self.probe(
                SourceId::Os,
                OsReading {
                    host_name: Some("ws-042".into()),
                    user_name: Some("ivica".into()),
                    domain: None,
                    distro: Some("Ubuntu".into()),
                    release: Some("24.04".into()),
                    kernel: Some("6.8.0".into()),
                    platform: "linux".into(),
                    arch: "x86_64".into(),
                    uptime_seconds: 90_061,
                },
            )
            .await
        }

        async fn graphics(&self) -> ProbeResult<Vec<GpuReading>> {
            self.probe(
                SourceId::Graphics,
                vec![GpuReading {
                    vendor: "NVIDIA".into(),
                    model: "GeForce RTX 3060".into(),
                    vram_bytes: Some(12 * GB),
                    driver_version: Some("550.107.02".into()),
                }],
            )
            .await
        }

        async fn disk_layout(&self) -> ProbeResult<Vec<DiskReading>> {
            self.probe(
                SourceId::DiskLayout,
                vec![DiskReading {
                    device: "/dev/nvme0n1".into(),
                    model: Some("Samsung SSD 980".into()),
                    kind: Some("NVMe".into()),
                    size_bytes: 1000 * GB,
                }],
            )
            .await
        }

        async fn filesystems(&self) -> ProbeResult<Vec<FilesystemReading>> {
            self.probe(
                SourceId::Filesystems,
                vec![FilesystemReading {
                    device: "/dev/nvme0n1p2".into(),
                    mount_point: "/".into(),
                    filesystem: "ext4".into(),
                    total_bytes: 900 * GB,
                    available_bytes: 600 * GB,
                }],
            )
            .await
        }

        async fn system(&self) -> ProbeResult<SystemReading> {
            self.probe(
                SourceId::System,
                SystemReading {
                    manufacturer: Some("Dell Inc.".into()),
                    model: Some("OptiPlex 7080".into()),
                    serial: Some("7XK2LM3".into()),
                },
            )
            .await
        }

        async fn bios(&self) -> ProbeResult<BiosReading> {
            self.probe(
                SourceId::Bios,
                BiosReading {
                    vendor: Some("Dell Inc.".into()),
                    version: Some("1.21.0".into()),
                    release_date: Some("03/14/2024".into()),
                },
            )
            .await
        }

        async fn network_interfaces(&self) -> ProbeResult<Vec<InterfaceReading>> {
            self.probe(
                SourceId::Network,
                vec![InterfaceReading {
                    name: "eth0".into(),
                    ipv4: vec!["192.168.1.20".into()],
                    mac: "00:1a:2b:3c:4d:5e".into(),
                    link_type: Some("wired".into()),
                    speed_mbps: Some(1000),
                    dhcp: Some(true),
                }],
            )
            .await
        }

        async fn users(&self) -> ProbeResult<Vec<UserReading>> {
            self.probe(
                SourceId::Users,
                vec![UserReading {
                    name: "ivica".into(),
                    terminal: Some("tty2".into()),
                    host: Some(":0".into()),
                    login_time: Some("2026-10-19 08:02".into()),
                    state: Some("active".into()),
                }],
            )
            .await
        }

        async fn processes(&self) -> ProbeResult<ProcessTable> {
            self.probe(
                SourceId::Processes,
                ProcessTable {
                    total_memory_bytes: 16 * GB,
                    processes: vec![ProcessReading {
                        pid: 4242,
                        name: "firefox".into(),
                        cpu_percent: 12.5,
                        memory_bytes: GB,
                    }],
                },
            )
            .await
        }
    }

    fn service(source: FakeSource) -> InventoryService {
        InventoryService::new(Arc::new(source), CaptureOptions::default())
    }

    #[tokio::test]
    async fn test_complete_snapshot() {
        let snapshot = service(FakeSource::healthy()).capture_snapshot().await.unwrap();

        assert!(snapshot.is_complete());
        assert_eq!(snapshot.source_status.len(), SourceId::ALL.len());
        assert_eq!(snapshot.identity.host_name, "ws-042");
        assert_eq!(snapshot.identity.domain, "WORKGROUP");
        assert_eq!(snapshot.os.uptime.display, "1d 1h 1m");
        assert_eq!(snapshot.cpu.manufacturer, "AMD");
        assert_eq!(snapshot.cpu.speed, "3.8GHz");
        assert_eq!(snapshot.memory.usage_percent, 25);
        assert_eq!(snapshot.graphics[0].vram.as_ref().unwrap().display, "12 GB");
        assert_eq!(snapshot.storage.total.bytes, 1000 * GB);
        assert_eq!(snapshot.storage.total_source, StorageTotalSource::DiskLayout);
        assert_eq!(snapshot.storage.used.bytes, 300 * GB);
        assert_eq!(snapshot.system.as_ref().unwrap().serial, "7XK2LM3");
        assert_eq!(snapshot.bios.as_ref().unwrap().version, "1.21.0");
        assert_eq!(snapshot.network[0].link_type, LinkType::Wired);
        assert_eq!(snapshot.users[0].name, "ivica");
        assert_eq!(snapshot.users[0].status, SessionStatus::Active);
        assert_eq!(snapshot.processes[0].pid, 4242);
    }

    #[tokio::test]
    async fn test_single_failure_keeps_other_fields() {
        let source = FakeSource::healthy().failing(&[SourceId::Memory]);
        let snapshot = service(source).capture_snapshot().await.unwrap();

        assert!(!snapshot.is_complete());
        assert_eq!(snapshot.unavailable_sources(), vec![SourceId::Memory]);
        match &snapshot.source_status[&SourceId::Memory] {
            SourceStatus::Unavailable { reason } => assert!(reason.contains("memory exploded")),
            other => panic!("unexpected status {:?}", other),
        }

        assert_eq!(snapshot.memory.total.bytes, 0);
        assert_eq!(snapshot.memory.usage_percent, 0);
        assert_eq!(snapshot.cpu.logical_cores, 16);
        assert_eq!(snapshot.identity.user_name, "ivica");
        assert_eq!(snapshot.processes.len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_optional_sentinels() {
        let source = FakeSource::healthy().failing(&[
            SourceId::Graphics,
            SourceId::System,
            SourceId::Bios,
            SourceId::Network,
            SourceId::Os,
        ]);
        let snapshot = service(source).capture_snapshot().await.unwrap();

        assert!(snapshot.graphics.is_empty());
        assert!(snapshot.network.is_empty());
        assert!(snapshot.system.is_none());
        assert!(snapshot.bios.is_none());
        assert_eq!(snapshot.identity.host_name, "N/A");
        assert_eq!(snapshot.os.kernel, "N/A");
        assert_eq!(snapshot.unavailable_sources().len(), 5);
    }

    #[tokio::test]
    async fn test_storage_falls_back_when_layout_fails() {
        let source = FakeSource::healthy().failing(&[SourceId::DiskLayout]);
        let snapshot = service(source).capture_snapshot().await.unwrap();

        assert_eq!(snapshot.storage.total.bytes, 900 * GB);
        assert_eq!(snapshot.storage.total_source, StorageTotalSource::Filesystems);
        assert!(snapshot.storage.disks.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reading_is_a_failure() {
        let source = FakeSource {
            memory: MemoryReading {
                total_bytes: GB,
                used_bytes: 2 * GB,
            },
            ..Default::default()
        };
        let snapshot = service(source).capture_snapshot().await.unwrap();

        match &snapshot.source_status[&SourceId::Memory] {
            SourceStatus::Unavailable { reason } => assert!(reason.starts_with("malformed result")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(snapshot.memory.total.bytes, 0);
    }

    #[tokio::test]
    async fn test_all_sources_failing() {
        let source = FakeSource::healthy().failing(&SourceId::ALL);
        let err = service(source).capture_snapshot().await.unwrap_err();

        let CaptureError::SourceUnavailable { failures } = err;
        assert_eq!(failures.len(), SourceId::ALL.len());
        assert_eq!(failures[0].source_id, SourceId::Cpu);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_run_concurrently() {
        let source = FakeSource {
            delay: Duration::from_millis(100),
            ..FakeSource::healthy()
        };
        let started = tokio::time::Instant::now();
        let snapshot = service(source).capture_snapshot().await.unwrap();
        let elapsed = started.elapsed();

        assert!(snapshot.is_complete());
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_hits_deadline() {
        let source = FakeSource {
            slow: Some((SourceId::Processes, Duration::from_secs(60))),
            ..FakeSource::healthy()
        };
        let service = InventoryService::new(
            Arc::new(source),
            CaptureOptions {
                probe_timeout: Duration::from_secs(2),
                process_limit: 10,
            },
        );

        let started = tokio::time::Instant::now();
        let snapshot = service.capture_snapshot().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(
            snapshot.source_status[&SourceId::Processes],
            SourceStatus::unavailable("timed out after 2000 ms")
        );
        assert!(snapshot.processes.is_empty());
        assert!(snapshot.source_status[&SourceId::Cpu].is_ok());
    }
}
