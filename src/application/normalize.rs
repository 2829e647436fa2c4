//! Per-probe normalization from raw provider readings to snapshot fields.
//!
//! Each function either returns the normalized value or rejects a reading
//! whose shape is impossible with `ProbeError::Malformed`. The caller treats a
//! rejection exactly like a failed probe.

use chrono::{DateTime, Utc};

use crate::domain::process::top_by_cpu;
use crate::domain::{
    BiosInfo, ByteSize, CpuInfo, GpuController, Identity, LinkType, MemoryInfo, NetworkInterface,
    OsInfo, PhysicalDisk, Process, SessionStatus, SystemIdentity, UserSession, Volume,
    NOT_AVAILABLE,
};
use crate::ports::{
    BiosReading, CpuReading, DiskReading, FilesystemReading, GpuReading, InterfaceReading,
    MemoryReading, OsReading, ProbeError, ProbeResult, ProcessTable, SystemReading, UserReading,
};

const DEFAULT_DOMAIN: &str = "WORKGROUP";

/// Blank or missing text becomes "N/A"
fn text(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// CPUID vendor strings mapped to the names people know
fn cpu_manufacturer(vendor: &str) -> String {
    match vendor.trim() {
        "GenuineIntel" => "Intel".to_string(),
        "AuthenticAMD" | "AMDisbetter!" => "AMD".to_string(),
        "" => NOT_AVAILABLE.to_string(),
        other => other.to_string(),
    }
}

pub fn normalize_cpu(reading: CpuReading) -> ProbeResult<CpuInfo> {
    if reading.logical_cores == 0 {
        return Err(ProbeError::malformed("no logical cores reported"));
    }
    if let Some(physical) = reading.physical_cores {
        if physical > reading.logical_cores {
            return Err(ProbeError::malformed(format!(
                "{} physical cores exceed {} logical cores",
                physical, reading.logical_cores
            )));
        }
    }
    if !reading.frequency_mhz.is_finite() || reading.frequency_mhz < 0.0 {
        return Err(ProbeError::malformed(format!(
            "invalid clock speed {} MHz",
            reading.frequency_mhz
        )));
    }

    let manufacturer = cpu_manufacturer(&reading.vendor);
    let brand = text(Some(reading.brand));
    let speed_ghz = (reading.frequency_mhz / 10.0).round() / 100.0;
    let logical = reading.logical_cores as u32;
    let physical = reading.physical_cores.map(|p| p as u32).unwrap_or(logical);

    Ok(CpuInfo::new(manufacturer, brand, speed_ghz, logical, physical))
}

pub fn normalize_memory(reading: MemoryReading) -> ProbeResult<MemoryInfo> {
    if reading.used_bytes > reading.total_bytes {
        return Err(ProbeError::malformed(format!(
            "used memory {} exceeds total {}",
            reading.used_bytes, reading.total_bytes
        )));
    }
    Ok(MemoryInfo::new(reading.total_bytes, reading.used_bytes))
}

pub fn normalize_os(reading: OsReading, captured_at: DateTime<Utc>) -> ProbeResult<(Identity, OsInfo)> {
    let identity = Identity {
        host_name: text(reading.host_name),
        user_name: text(reading.user_name),
        domain: reading
            .domain
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
        captured_at,
    };

    let os = OsInfo::new(
        text(reading.distro),
        reading.release.map(|r| r.trim().to_string()).unwrap_or_default(),
        text(reading.kernel),
        text(Some(reading.platform)),
        text(Some(reading.arch)),
        reading.uptime_seconds,
    );

    Ok((identity, os))
}

pub fn normalize_graphics(readings: Vec<GpuReading>) -> ProbeResult<Vec<GpuController>> {
    Ok(readings
        .into_iter()
        .map(|gpu| {
            GpuController::new(text(Some(gpu.vendor)), text(Some(gpu.model)))
                .with_vram(gpu.vram_bytes)
                .with_driver_version(gpu.driver_version)
        })
        .collect())
}

pub fn normalize_disks(readings: Vec<DiskReading>) -> ProbeResult<Vec<PhysicalDisk>> {
    Ok(readings
        .into_iter()
        .map(|disk| PhysicalDisk {
            device: text(Some(disk.device)),
            model: text(disk.model),
            kind: text(disk.kind),
            size: ByteSize::new(disk.size_bytes),
        })
        .collect())
}

pub fn normalize_filesystems(readings: Vec<FilesystemReading>) -> ProbeResult<Vec<Volume>> {
    readings
        .into_iter()
        .map(|fs| {
            if fs.available_bytes > fs.total_bytes {
                return Err(ProbeError::malformed(format!(
                    "{} reports {} bytes available of {}",
                    fs.mount_point, fs.available_bytes, fs.total_bytes
                )));
            }
            Ok(Volume::new(
                fs.device,
                fs.mount_point,
                fs.filesystem,
                fs.total_bytes,
                fs.available_bytes,
            ))
        })
        .collect()
}

pub fn normalize_system(reading: SystemReading) -> ProbeResult<SystemIdentity> {
    Ok(SystemIdentity {
        manufacturer: text(reading.manufacturer),
        model: text(reading.model),
        serial: text(reading.serial),
    })
}

pub fn normalize_bios(reading: BiosReading) -> ProbeResult<BiosInfo> {
    Ok(BiosInfo {
        vendor: text(reading.vendor),
        version: text(reading.version),
        release_date: text(reading.release_date),
    })
}

fn link_type(kind: Option<&str>) -> LinkType {
    match kind.map(|k| k.to_ascii_lowercase()).as_deref() {
        Some("wired") | Some("ethernet") => LinkType::Wired,
        Some("wireless") | Some("wifi") => LinkType::Wireless,
        Some("loopback") => LinkType::Loopback,
        Some("virtual") => LinkType::Virtual,
        _ => LinkType::Unknown,
    }
}

pub fn normalize_network(readings: Vec<InterfaceReading>) -> ProbeResult<Vec<NetworkInterface>> {
    let mut interfaces: Vec<NetworkInterface> = readings
        .into_iter()
        .map(|iface| {
            NetworkInterface::new(iface.name, text(Some(iface.mac)))
                .with_ipv4(iface.ipv4.into_iter().next())
                .with_link(link_type(iface.link_type.as_deref()), iface.speed_mbps)
                .with_dhcp(iface.dhcp)
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}

pub fn normalize_users(readings: Vec<UserReading>) -> ProbeResult<Vec<UserSession>> {
    let mut sessions: Vec<UserSession> = readings
        .into_iter()
        .filter(|u| !u.name.trim().is_empty())
        .map(|u| UserSession {
            name: u.name.trim().to_string(),
            terminal: text(u.terminal),
            host: u.host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()),
            login_time: text(u.login_time),
            status: SessionStatus::from_state(u.state.as_deref()),
        })
        .collect();
    sessions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.terminal.cmp(&b.terminal)));
    Ok(sessions)
}

pub fn normalize_processes(table: ProcessTable, limit: usize) -> ProbeResult<Vec<Process>> {
    let mut processes = Vec::with_capacity(table.processes.len());
    for reading in table.processes {
        if !reading.cpu_percent.is_finite() || reading.cpu_percent < 0.0 {
            return Err(ProbeError::malformed(format!(
                "process {} reports cpu usage {}",
                reading.pid, reading.cpu_percent
            )));
        }
        processes.push(Process::new(reading.pid, reading.name).with_metrics(
            reading.cpu_percent,
            reading.memory_bytes,
            table.total_memory_bytes,
        ));
    }
    Ok(top_by_cpu(processes, limit))
}
