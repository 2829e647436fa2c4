//! CIM queries through PowerShell, and login sessions from `query user`.

use serde::Deserialize;

use crate::ports::{BiosReading, DiskReading, GpuReading, ProbeResult, SystemReading, UserReading};

use super::command::{run_powershell, run_query_user};
use super::parser::{self, parse_text};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VideoController {
    name: Option<String>,
    adapter_compatibility: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u64>,
    driver_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiskDrive {
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    model: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ComputerSystemProduct {
    vendor: Option<String>,
    name: Option<String>,
    identifying_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Bios {
    manufacturer: Option<String>,
    #[serde(rename = "SMBIOSBIOSVersion")]
    smbios_version: Option<String>,
    release_date: Option<String>,
}

fn text(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(parse_text)
}

async fn query(class: &str, properties: &str) -> ProbeResult<String> {
    run_powershell(&format!(
        "ConvertTo-Json -Compress -InputObject @(Get-CimInstance {class} | Select-Object {properties})"
    ))
    .await
}

pub async fn video_controllers() -> ProbeResult<Vec<GpuReading>> {
    let raw = query(
        "Win32_VideoController",
        "Name,AdapterCompatibility,AdapterRAM,DriverVersion",
    )
    .await?;
    let controllers: Vec<VideoController> = parser::parse_cim_list(&raw)?;

    Ok(controllers
        .into_iter()
        .map(|c| GpuReading {
            vendor: text(c.adapter_compatibility).unwrap_or_default(),
            model: text(c.name).unwrap_or_default(),
            vram_bytes: c.adapter_ram,
            driver_version: text(c.driver_version),
        })
        .collect())
}

pub async fn disk_drives() -> ProbeResult<Vec<DiskReading>> {
    let raw = query("Win32_DiskDrive", "DeviceID,Model,Size").await?;
    let drives: Vec<DiskDrive> = parser::parse_cim_list(&raw)?;

    let mut disks: Vec<DiskReading> = drives
        .into_iter()
        .map(|d| {
            let model = text(d.model);
            DiskReading {
                device: text(d.device_id).unwrap_or_default(),
                kind: model.as_deref().and_then(parser::disk_kind_from_model),
                model,
                size_bytes: d.size.unwrap_or(0),
            }
        })
        .collect();
    disks.sort_by(|a, b| a.device.cmp(&b.device));
    Ok(disks)
}

pub async fn computer_system_product() -> ProbeResult<SystemReading> {
    let raw = query("Win32_ComputerSystemProduct", "Vendor,Name,IdentifyingNumber").await?;
    let product: ComputerSystemProduct =
        parser::parse_cim_single(&raw, "Win32_ComputerSystemProduct")?;

    Ok(SystemReading {
        manufacturer: text(product.vendor),
        model: text(product.name),
        serial: text(product.identifying_number),
    })
}

pub async fn bios() -> ProbeResult<BiosReading> {
    // CIM datetimes serialize badly in Windows PowerShell, so format in-script
    let raw = query(
        "Win32_BIOS",
        "Manufacturer,SMBIOSBIOSVersion,@{n='ReleaseDate';e={if ($_.ReleaseDate) { $_.ReleaseDate.ToString('yyyy-MM-dd') }}}",
    )
    .await?;
    let bios: Bios = parser::parse_cim_single(&raw, "Win32_BIOS")?;

    Ok(BiosReading {
        vendor: text(bios.manufacturer),
        version: text(bios.smbios_version),
        release_date: text(bios.release_date),
    })
}

pub async fn logged_on_users() -> ProbeResult<Vec<UserReading>> {
    let raw = run_query_user().await?;
    Ok(parser::parse_query_user(&raw)?)
}
