//! Readers for the Linux sysfs tree.
//!
//! Every reader takes the sysfs root explicitly so a container can point it
//! at a bind-mounted host `/sys`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ports::{BiosReading, DiskReading, GpuReading, SystemReading};

use super::parser::{self, ParseResult};

/// Read a whole attribute, `None` if it is absent or unreadable
fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Read an attribute as display text; unreadable fields stay unset
fn read_text(path: &Path) -> Option<String> {
    read_attr(path).and_then(|content| parser::parse_text(&content))
}

fn dmi_dir(sys_path: &Path) -> ParseResult<PathBuf> {
    let dir = sys_path.join("class/dmi/id");
    // Fails the probe when the firmware tables are not exposed at all
    fs::metadata(&dir)?;
    Ok(dir)
}

pub fn read_system(sys_path: &Path) -> ParseResult<SystemReading> {
    let dir = dmi_dir(sys_path)?;
    Ok(SystemReading {
        manufacturer: read_text(&dir.join("sys_vendor")),
        model: read_text(&dir.join("product_name")),
        // Root-only on most distributions
        serial: read_text(&dir.join("product_serial")),
    })
}

pub fn read_bios(sys_path: &Path) -> ParseResult<BiosReading> {
    let dir = dmi_dir(sys_path)?;
    Ok(BiosReading {
        vendor: read_text(&dir.join("bios_vendor")),
        version: read_text(&dir.join("bios_version")),
        release_date: read_text(&dir.join("bios_date")),
    })
}

/// Physical disks under `/sys/block`, sorted by device name
pub fn read_disk_layout(sys_path: &Path) -> ParseResult<Vec<DiskReading>> {
    let mut disks = Vec::new();

    for entry in fs::read_dir(sys_path.join("block"))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if parser::is_virtual_block_device(&name) {
            continue;
        }

        let dir = entry.path();
        let size_bytes = match read_attr(&dir.join("size")) {
            Some(content) => parser::parse_block_size(&content)?,
            None => continue,
        };
        let rotational = read_attr(&dir.join("queue/rotational"));

        disks.push(DiskReading {
            device: format!("/dev/{}", name),
            model: read_text(&dir.join("device/model")),
            kind: parser::block_kind(&name, rotational.as_deref()),
            size_bytes,
        });
    }

    disks.sort_by(|a, b| a.device.cmp(&b.device));
    Ok(disks)
}

/// Display adapters under `/sys/class/drm`.
///
/// Connector entries such as `card0-HDMI-A-1` are skipped. NVIDIA cards are
/// skipped when `skip_nvidia` is set because `nvidia-smi` already reported
/// them with better detail.
pub fn read_drm_cards(sys_path: &Path, skip_nvidia: bool) -> ParseResult<Vec<GpuReading>> {
    let mut cards = Vec::new();

    let mut entries: Vec<_> = fs::read_dir(sys_path.join("class/drm"))?
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("card") && !name.contains('-'))
        .collect();
    entries.sort();

    for name in entries {
        let device = sys_path.join("class/drm").join(&name).join("device");
        let vendor_id = match read_attr(&device.join("vendor")) {
            Some(content) => parser::parse_pci_id(&content)?,
            None => continue,
        };
        if skip_nvidia && vendor_id == 0x10de {
            continue;
        }

        let vendor = parser::pci_vendor_name(vendor_id);
        let model = read_text(&device.join("product_name"))
            .or_else(|| read_text(&device.join("label")))
            .or_else(|| {
                read_attr(&device.join("device"))
                    .map(|id| format!("{} GPU [{}]", vendor, id.trim()))
            })
            .unwrap_or_else(|| format!("{} GPU", vendor));

        let vram_bytes = read_attr(&device.join("mem_info_vram_total"))
            .and_then(|content| parser::parse_sysfs_u64(&content).ok());

        let driver_version = fs::read_link(device.join("driver"))
            .ok()
            .and_then(|link| link.file_name().map(|n| n.to_string_lossy().to_string()))
            .and_then(|driver| {
                read_text(&sys_path.join("module").join(&driver).join("version")).or(Some(driver))
            });

        cards.push(GpuReading {
            vendor,
            model,
            vram_bytes,
            driver_version,
        });
    }

    Ok(cards)
}

/// Link details for one interface from `/sys/class/net/<name>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDetails {
    pub link_type: Option<String>,
    pub speed_mbps: Option<u64>,
    pub dhcp: Option<bool>,
}

/// ARPHRD_LOOPBACK
const ARP_LOOPBACK: u64 = 772;

pub fn read_link_details(sys_path: &Path, lease_dir: &Path, name: &str) -> LinkDetails {
    let dir = sys_path.join("class/net").join(name);
    if !dir.exists() {
        return LinkDetails::default();
    }

    let arp_type = read_attr(&dir.join("type")).and_then(|t| parser::parse_sysfs_u64(&t).ok());
    let link_type = if arp_type == Some(ARP_LOOPBACK) {
        "loopback"
    } else if dir.join("wireless").exists() || dir.join("phy80211").exists() {
        "wireless"
    } else if !dir.join("device").exists() {
        "virtual"
    } else {
        "wired"
    };

    // Reading speed on a link that is down yields EINVAL
    let speed_mbps = read_attr(&dir.join("speed")).and_then(|s| parser::parse_link_speed(&s));

    // systemd-networkd keeps one lease file per DHCP-configured ifindex;
    // without it there is no reliable signal, so the flag stays unknown
    let dhcp = read_attr(&dir.join("ifindex"))
        .and_then(|index| parser::parse_sysfs_u64(&index).ok())
        .filter(|_| lease_dir.is_dir())
        .map(|index| lease_dir.join(index.to_string()).exists());

    LinkDetails {
        link_type: Some(link_type.to_string()),
        speed_mbps,
        dhcp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scratch sysfs tree removed on drop
    struct FakeSys {
        root: PathBuf,
    }

    impl FakeSys {
        fn new(tag: &str) -> Self {
            let root = std::env::temp_dir().join(format!("hostinv-{}-{}", tag, std::process::id()));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn write(&self, rel: &str, content: &str) -> &Self {
            let path = self.root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn mkdir(&self, rel: &str) -> &Self {
            fs::create_dir_all(self.root.join(rel)).unwrap();
            self
        }
    }

    impl Drop for FakeSys {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn test_read_system_with_unreadable_serial() {
        let sys = FakeSys::new("dmi");
        sys.write("class/dmi/id/sys_vendor", "Dell Inc.\n")
            .write("class/dmi/id/product_name", "OptiPlex 7080\n")
            .write("class/dmi/id/bios_vendor", "Dell Inc.\n")
            .write("class/dmi/id/bios_version", "1.21.0\n")
            .write("class/dmi/id/bios_date", "03/14/2024\n");

        let system = read_system(&sys.root).unwrap();
        assert_eq!(system.manufacturer.as_deref(), Some("Dell Inc."));
        assert_eq!(system.model.as_deref(), Some("OptiPlex 7080"));
        assert_eq!(system.serial, None);

        let bios = read_bios(&sys.root).unwrap();
        assert_eq!(bios.release_date.as_deref(), Some("03/14/2024"));
    }

    #[test]
    fn test_missing_dmi_fails() {
        let sys = FakeSys::new("nodmi");
        assert!(matches!(read_system(&sys.root), Err(parser::ParseError::Io(_))));
    }

    #[test]
    fn test_read_disk_layout_skips_virtual() {
        let sys = FakeSys::new("block");
        sys.write("block/sda/size", "1953525168\n")
            .write("block/sda/queue/rotational", "1\n")
            .write("block/sda/device/model", "ST1000DM003-1ER1\n")
            .write("block/nvme0n1/size", "500118192\n")
            .write("block/nvme0n1/queue/rotational", "0\n")
            .write("block/loop0/size", "8\n")
            .write("block/dm-0/size", "1000\n");

        let disks = read_disk_layout(&sys.root).unwrap();
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].device, "/dev/nvme0n1");
        assert_eq!(disks[0].kind.as_deref(), Some("NVMe"));
        assert_eq!(disks[0].model, None);
        assert_eq!(disks[1].device, "/dev/sda");
        assert_eq!(disks[1].kind.as_deref(), Some("HDD"));
        assert_eq!(disks[1].size_bytes, 1_000_204_886_016);
    }

    #[test]
    fn test_read_drm_cards() {
        let sys = FakeSys::new("drm");
        sys.write("class/drm/card0/device/vendor", "0x1002\n")
            .write("class/drm/card0/device/device", "0x73bf\n")
            .write("class/drm/card0/device/mem_info_vram_total", "17163091968\n")
            .write("class/drm/card1/device/vendor", "0x10de\n")
            .mkdir("class/drm/card0-DP-1")
            .write("class/drm/version", "drm 1.1.0\n");

        let cards = read_drm_cards(&sys.root, true).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].vendor, "AMD");
        assert_eq!(cards[0].model, "AMD GPU [0x73bf]");
        assert_eq!(cards[0].vram_bytes, Some(17_163_091_968));
        assert_eq!(cards[0].driver_version, None);

        assert_eq!(read_drm_cards(&sys.root, false).unwrap().len(), 2);
    }

    #[test]
    fn test_read_link_details() {
        let sys = FakeSys::new("net");
        sys.write("class/net/lo/type", "772\n")
            .write("class/net/eth0/type", "1\n")
            .write("class/net/eth0/speed", "1000\n")
            .write("class/net/eth0/ifindex", "2\n")
            .mkdir("class/net/eth0/device")
            .write("class/net/wlan0/type", "1\n")
            .write("class/net/wlan0/speed", "-1\n")
            .mkdir("class/net/wlan0/device")
            .mkdir("class/net/wlan0/wireless")
            .write("class/net/docker0/type", "1\n")
            .write("leases/2", "ADDRESS=192.168.1.20\n");
        let leases = sys.root.join("leases");

        let lo = read_link_details(&sys.root, &leases, "lo");
        assert_eq!(lo.link_type.as_deref(), Some("loopback"));

        let eth0 = read_link_details(&sys.root, &leases, "eth0");
        assert_eq!(eth0.link_type.as_deref(), Some("wired"));
        assert_eq!(eth0.speed_mbps, Some(1000));
        assert_eq!(eth0.dhcp, Some(true));

        let wlan0 = read_link_details(&sys.root, &leases, "wlan0");
        assert_eq!(wlan0.link_type.as_deref(), Some("wireless"));
        assert_eq!(wlan0.speed_mbps, None);
        assert_eq!(wlan0.dhcp, None);

        let docker0 = read_link_details(&sys.root, &sys.root.join("no-leases"), "docker0");
        assert_eq!(docker0.link_type.as_deref(), Some("virtual"));

        assert_eq!(read_link_details(&sys.root, &leases, "missing"), LinkDetails::default());
    }
}
