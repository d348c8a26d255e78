mod context;
mod fitment_error;

pub use context::*;
pub use fitment_error::*;

pub use fitment_index::{FitmentIndex, SelectionKey, VehicleId, VehicleRecord};
