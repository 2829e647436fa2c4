pub mod inventory_source;

pub use inventory_source::{
    BiosReading, CpuReading, DiskReading, FilesystemReading, GpuReading, InterfaceReading,
    InventorySource, MemoryReading, OsReading, ProbeError, ProbeResult, ProcessReading,
    ProcessTable, SystemReading, UserReading,
};
