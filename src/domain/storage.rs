use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::format::{usage_percent, ByteSize};

/// Physical disk from the disk layout probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalDisk {
    pub device: String,
    pub model: String,
    pub kind: String,
    pub size: ByteSize,
}

/// Mounted filesystem from the filesystem sizing probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub device: String,
    pub mount_point: String,
    pub filesystem: String,
    pub size: ByteSize,
    pub available: ByteSize,
}

impl Volume {
    pub fn new(
        device: String,
        mount_point: String,
        filesystem: String,
        total_bytes: u64,
        available_bytes: u64,
    ) -> Self {
        Self {
            device,
            mount_point,
            filesystem,
            size: ByteSize::new(total_bytes),
            available: ByteSize::new(available_bytes),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.size.bytes.saturating_sub(self.available.bytes)
    }
}

/// Which tier produced the storage total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTotalSource {
    DiskLayout,
    Filesystems,
    Unavailable,
}

/// Storage totals across all physical disks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub total: ByteSize,
    pub used: ByteSize,
    pub free: ByteSize,
    pub total_gb: u64,
    pub usage_percent: u8,
    pub total_source: StorageTotalSource,
    pub disks: Vec<PhysicalDisk>,
    pub volumes: Vec<Volume>,
}

impl StorageInfo {
    /// Combine the disk layout and filesystem probes.
    ///
    /// `None` means the probe failed. The total prefers the physical disk
    /// sizes and falls back to the de-duplicated filesystem sizes when the
    /// layout is missing, empty or all zero. Used space always comes from
    /// the de-duplicated filesystems.
    pub fn from_sources(disks: Option<Vec<PhysicalDisk>>, volumes: Option<Vec<Volume>>) -> Self {
        let disks = disks.unwrap_or_default();
        let volumes = volumes.unwrap_or_default();

        let counted = countable_volumes(&volumes);
        let layout_total: u64 = disks.iter().map(|d| d.size.bytes).sum();
        let volume_total: u64 = counted.iter().map(|v| v.size.bytes).sum();
        let used_bytes: u64 = counted.iter().map(|v| v.used_bytes()).sum();

        let (total_bytes, total_source) = if layout_total > 0 {
            (layout_total, StorageTotalSource::DiskLayout)
        } else if volume_total > 0 {
            (volume_total, StorageTotalSource::Filesystems)
        } else {
            (0, StorageTotalSource::Unavailable)
        };

        let total = ByteSize::new(total_bytes);
        Self {
            total_gb: total.whole_gb(),
            usage_percent: usage_percent(used_bytes, total_bytes),
            used: ByteSize::new(used_bytes),
            free: ByteSize::new(total_bytes.saturating_sub(used_bytes)),
            total,
            total_source,
            disks,
            volumes,
        }
    }
}

/// `X:\` with an ASCII drive letter
fn is_drive_root(mount_point: &str) -> bool {
    let bytes = mount_point.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

fn has_drive_letter_semantics(volumes: &[Volume]) -> bool {
    volumes.iter().any(|v| is_drive_root(&v.mount_point))
}

/// Volumes that contribute to storage sums, each counted once.
///
/// With drive letters only whole-drive roots count, so nested mounts such as
/// `C:\Users` are skipped and `c:\` matches `C:\`. Without them every mount
/// point counts once, case-sensitively, and a device mounted at several places
/// counts once.
fn countable_volumes(volumes: &[Volume]) -> Vec<&Volume> {
    let drive_letters = has_drive_letter_semantics(volumes);
    let mut seen_mounts = HashSet::new();
    let mut seen_devices = HashSet::new();

    volumes
        .iter()
        .filter(|v| !drive_letters || is_drive_root(&v.mount_point))
        .filter(|v| {
            let key = if drive_letters {
                v.mount_point.to_ascii_uppercase()
            } else {
                v.mount_point.clone()
            };
            seen_mounts.insert(key)
        })
        .filter(|v| drive_letters || v.device.is_empty() || seen_devices.insert(v.device.clone()))
        .collect()
}
