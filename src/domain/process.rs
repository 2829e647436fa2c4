use serde::{Deserialize, Serialize};

use super::format::ByteSize;

/// Running process entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory: ByteSize,
    pub memory_percent: f64,
}

impl Process {
    pub fn new(pid: u32, name: String) -> Self {
        Self {
            pid,
            name,
            cpu_percent: 0.0,
            memory: ByteSize::zero(),
            memory_percent: 0.0,
        }
    }

    /// Memory share is taken against `total_memory_bytes`; 0 when that is 0
    pub fn with_metrics(mut self, cpu_percent: f64, memory_bytes: u64, total_memory_bytes: u64) -> Self {
        self.cpu_percent = round2(cpu_percent);
        self.memory = ByteSize::new(memory_bytes);
        self.memory_percent = if total_memory_bytes == 0 {
            0.0
        } else {
            round2((memory_bytes as f64 / total_memory_bytes as f64 * 100.0).clamp(0.0, 100.0))
        };
        self
    }
}

/// Sort by CPU usage, busiest first, and keep at most `limit` (0 keeps all)
pub fn top_by_cpu(mut processes: Vec<Process>, limit: usize) -> Vec<Process> {
    processes.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| b.memory.bytes.cmp(&a.memory.bytes))
            .then_with(|| a.pid.cmp(&b.pid))
    });
    if limit > 0 {
        processes.truncate(limit);
    }
    processes
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
