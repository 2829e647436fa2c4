pub mod format;
pub mod hardware;
pub mod network;
pub mod os;
pub mod process;
pub mod snapshot;
pub mod source;
pub mod storage;
pub mod user;

pub use format::{ByteSize, NOT_AVAILABLE};
pub use hardware::{BiosInfo, CpuInfo, GpuController, MemoryInfo, SystemIdentity};
pub use network::{LinkType, NetworkInterface};
pub use os::{Identity, OsInfo};
pub use process::Process;
pub use snapshot::Snapshot;
pub use source::{SourceId, SourceStatus, SourceStatusMap};
pub use storage::{PhysicalDisk, StorageInfo, Volume};
pub use user::{SessionStatus, UserSession};
