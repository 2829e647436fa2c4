use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BiosInfo, CpuInfo, GpuController, Identity, MemoryInfo, NetworkInterface, OsInfo, Process,
    SourceId, SourceStatus, SourceStatusMap, StorageInfo, SystemIdentity, UserSession,
};

/// Snapshot aggregate root: one point-in-time inventory of the host.
///
/// Every field is always present. When the probe owning a field failed, the
/// field holds its sentinel and `source_status` says why; consumers must
/// consult `source_status` rather than the sentinel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub identity: Identity,
    pub os: OsInfo,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub graphics: Vec<GpuController>,
    pub storage: StorageInfo,
    pub system: Option<SystemIdentity>,
    pub bios: Option<BiosInfo>,
    pub network: Vec<NetworkInterface>,
    pub users: Vec<UserSession>,
    pub processes: Vec<Process>,
    pub source_status: SourceStatusMap,
}

impl Snapshot {
    /// Snapshot with every field at its sentinel and every source unavailable
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            identity: Identity::unavailable(captured_at),
            os: OsInfo::unavailable(),
            cpu: CpuInfo::unavailable(),
            memory: MemoryInfo::unavailable(),
            graphics: Vec::new(),
            storage: StorageInfo::from_sources(None, None),
            system: None,
            bios: None,
            network: Vec::new(),
            users: Vec::new(),
            processes: Vec::new(),
            source_status: SourceId::ALL
                .iter()
                .map(|id| (*id, SourceStatus::unavailable("not collected")))
                .collect(),
        }
    }

    pub fn with_status(mut self, source: SourceId, status: SourceStatus) -> Self {
        self.source_status.insert(source, status);
        self
    }

    pub fn with_identity(mut self, identity: Identity, os: OsInfo) -> Self {
        self.identity = identity;
        self.os = os;
        self
    }

    pub fn with_cpu(mut self, cpu: CpuInfo) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn with_memory(mut self, memory: MemoryInfo) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_graphics(mut self, graphics: Vec<GpuController>) -> Self {
        self.graphics = graphics;
        self
    }

    pub fn with_storage(mut self, storage: StorageInfo) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_system(mut self, system: Option<SystemIdentity>, bios: Option<BiosInfo>) -> Self {
        self.system = system;
        self.bios = bios;
        self
    }

    pub fn with_network(mut self, network: Vec<NetworkInterface>) -> Self {
        self.network = network;
        self
    }

    pub fn with_users(mut self, users: Vec<UserSession>) -> Self {
        self.users = users;
        self
    }

    pub fn with_processes(mut self, processes: Vec<Process>) -> Self {
        self.processes = processes;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.source_status.values().all(SourceStatus::is_ok)
    }

    pub fn unavailable_sources(&self) -> Vec<SourceId> {
        self.source_status
            .iter()
            .filter(|(_, status)| !status.is_ok())
            .map(|(id, _)| *id)
            .collect()
    }
}
