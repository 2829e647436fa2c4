use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one inventory probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Cpu,
    Memory,
    Os,
    Graphics,
    DiskLayout,
    Filesystems,
    System,
    Bios,
    Network,
    Users,
    Processes,
}

impl SourceId {
    /// Every probe a capture issues
    pub const ALL: [SourceId; 11] = [
        SourceId::Cpu,
        SourceId::Memory,
        SourceId::Os,
        SourceId::Graphics,
        SourceId::DiskLayout,
        SourceId::Filesystems,
        SourceId::System,
        SourceId::Bios,
        SourceId::Network,
        SourceId::Users,
        SourceId::Processes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Os => "os",
            Self::Graphics => "graphics",
            Self::DiskLayout => "disk_layout",
            Self::Filesystems => "filesystems",
            Self::System => "system",
            Self::Bios => "bios",
            Self::Network => "network",
            Self::Users => "users",
            Self::Processes => "processes",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one probe within a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Per-source outcome map, ordered by source for stable output
pub type SourceStatusMap = BTreeMap<SourceId, SourceStatus>;
