pub mod inventory;
pub mod normalize;

pub use inventory::{CaptureError, CaptureOptions, InventoryService};
