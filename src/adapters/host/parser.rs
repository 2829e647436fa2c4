#[cfg(any(test, target_os = "windows"))]
use serde::de::DeserializeOwned;
#[cfg(any(test, target_os = "windows"))]
use serde_json::Value;
use thiserror::Error;

use crate::ports::{GpuReading, ProbeError, UserReading};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

impl From<ParseError> for ProbeError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(io) => ProbeError::Io(io),
            other => ProbeError::Parse(other.to_string()),
        }
    }
}

/// Firmware strings vendors leave in unset fields
const PLACEHOLDERS: &[&str] = &[
    "To Be Filled By O.E.M.",
    "To be filled by O.E.M.",
    "Default string",
    "System Product Name",
    "System manufacturer",
    "Not Specified",
    "None",
];

/// Trimmed text value, `None` when blank or a firmware placeholder
pub fn parse_text(content: &str) -> Option<String> {
    let value = content.trim().trim_matches(char::from(0)).trim();
    if value.is_empty() || PLACEHOLDERS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(any(test, target_os = "linux"))]
/// Parse a single decimal sysfs value such as `size` or `speed`
pub fn parse_sysfs_u64(content: &str) -> ParseResult<u64> {
    content
        .trim()
        .parse::<u64>()
        .map_err(|e| ParseError::Parse(format!("Invalid integer {:?}: {}", content.trim(), e)))
}

#[cfg(any(test, target_os = "linux"))]
/// Block device size from `/sys/block/<dev>/size`, always in 512-byte sectors
pub fn parse_block_size(content: &str) -> ParseResult<u64> {
    let sectors = parse_sysfs_u64(content)?;
    Ok(sectors.saturating_mul(512))
}

#[cfg(any(test, target_os = "linux"))]
/// Disk kind from the device name and `queue/rotational`
pub fn block_kind(device: &str, rotational: Option<&str>) -> Option<String> {
    if device.starts_with("nvme") {
        return Some("NVMe".to_string());
    }
    match rotational.map(str::trim) {
        Some("1") => Some("HDD".to_string()),
        Some("0") => Some("SSD".to_string()),
        _ => None,
    }
}

#[cfg(any(test, target_os = "linux"))]
/// Block devices that are not physical disks
pub fn is_virtual_block_device(name: &str) -> bool {
    ["loop", "ram", "zram", "dm-", "md", "sr", "fd", "nbd"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

#[cfg(any(test, target_os = "linux"))]
/// Link speed from `/sys/class/net/<if>/speed`; `-1` and junk mean unknown
pub fn parse_link_speed(content: &str) -> Option<u64> {
    content
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|speed| *speed > 0)
        .map(|speed| speed as u64)
}

#[cfg(any(test, target_os = "linux"))]
/// Parse a PCI id like `0x10de`
pub fn parse_pci_id(content: &str) -> ParseResult<u16> {
    let trimmed = content.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16)
        .map_err(|e| ParseError::Parse(format!("Invalid PCI id {:?}: {}", trimmed, e)))
}

#[cfg(any(test, target_os = "linux"))]
pub fn pci_vendor_name(vendor_id: u16) -> String {
    match vendor_id {
        0x10de => "NVIDIA".to_string(),
        0x1002 | 0x1022 => "AMD".to_string(),
        0x8086 => "Intel".to_string(),
        0x1af4 => "Red Hat (virtio)".to_string(),
        0x15ad => "VMware".to_string(),
        0x1234 => "QEMU".to_string(),
        other => format!("PCI vendor {:#06x}", other),
    }
}

/// Parse `nvidia-smi --query-gpu=name,memory.total,driver_version
/// --format=csv,noheader,nounits`; memory is reported in MiB
pub fn parse_nvidia_smi_csv(content: &str) -> ParseResult<Vec<GpuReading>> {
    let mut gpus = Vec::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(ParseError::MissingField(format!("driver_version in {:?}", line)));
        }

        let vram_bytes = parts[1]
            .parse::<u64>()
            .ok()
            .map(|mib| mib.saturating_mul(1024 * 1024));

        gpus.push(GpuReading {
            vendor: "NVIDIA".to_string(),
            model: parts[0].to_string(),
            vram_bytes,
            driver_version: parse_text(parts[2]),
        });
    }

    Ok(gpus)
}

#[cfg(any(test, unix))]
/// Parse `who` output: `name line date time [(host)]`, one session per line
pub fn parse_who(content: &str) -> ParseResult<Vec<UserReading>> {
    let mut sessions = Vec::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let line = line.trim_end();
        let (fields, host) = match (line.rfind('('), line.ends_with(')')) {
            (Some(open), true) => (&line[..open], parse_text(&line[open + 1..line.len() - 1])),
            _ => (line, None),
        };

        let mut parts = fields.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| ParseError::MissingField(format!("user in {:?}", line)))?;
        let terminal = parts
            .next()
            .ok_or_else(|| ParseError::MissingField(format!("line in {:?}", line)))?;
        let login_time = parts.collect::<Vec<_>>().join(" ");

        sessions.push(UserReading {
            name: name.to_string(),
            terminal: Some(terminal.to_string()),
            host,
            login_time: parse_text(&login_time),
            state: Some("active".to_string()),
        });
    }

    Ok(sessions)
}

#[cfg(any(test, target_os = "windows"))]
/// Parse `query user` output.
///
/// The session name column is blank for disconnected sessions, so columns
/// are located from the numeric session id rather than by position.
pub fn parse_query_user(content: &str) -> ParseResult<Vec<UserReading>> {
    let mut sessions = Vec::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts[0].eq_ignore_ascii_case("USERNAME") {
            continue;
        }

        let id_at = (1..parts.len().min(3))
            .find(|&i| parts[i].parse::<u32>().is_ok())
            .ok_or_else(|| ParseError::Parse(format!("No session id in {:?}", line)))?;

        sessions.push(UserReading {
            name: parts[0].trim_start_matches('>').to_string(),
            terminal: if id_at == 2 { Some(parts[1].to_string()) } else { None },
            host: None,
            login_time: parts.get(id_at + 3..).map(|rest| rest.join(" ")).and_then(|t| parse_text(&t)),
            state: parts.get(id_at + 1).map(|s| s.to_string()),
        });
    }

    Ok(sessions)
}

#[cfg(any(test, target_os = "windows"))]
/// Parse `ConvertTo-Json` output of a CIM query.
///
/// PowerShell emits a bare object for a single instance and an array for
/// several, so both shapes are accepted. Empty output means no instances.
pub fn parse_cim_list<T: DeserializeOwned>(content: &str) -> ParseResult<Vec<T>> {
    let trimmed = content.trim().trim_start_matches('\u{feff}');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ParseError::Parse(format!("Invalid CIM JSON: {}", e)))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| ParseError::Parse(format!("Unexpected CIM instance: {}", e)))
        })
        .collect()
}

#[cfg(any(test, target_os = "windows"))]
/// Like `parse_cim_list` but requires exactly one leading instance
pub fn parse_cim_single<T: DeserializeOwned>(content: &str, class: &str) -> ParseResult<T> {
    parse_cim_list(content)?
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::MissingField(class.to_string()))
}

#[cfg(any(test, target_os = "windows"))]
/// Disk kind from a drive model string when the OS has no better signal
pub fn disk_kind_from_model(model: &str) -> Option<String> {
    let upper = model.to_ascii_uppercase();
    if upper.contains("NVME") {
        Some("NVMe".to_string())
    } else if upper.contains("SSD") {
        Some("SSD".to_string())
    } else {
        None
    }
}
