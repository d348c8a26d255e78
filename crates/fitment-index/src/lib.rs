//! # fitment-index
//!
//! Build an in-memory fitment index from a flat list of vehicle records and
//! resolve complete Year/Make/Model/Submodel/Engine selections to exactly one
//! vehicle identifier.
//!
//! ## Overview
//!
//! The index keeps four derived mappings, all built in one pass by
//! [`FitmentIndex::build`]:
//! - Year -> Makes
//! - (Year, Make) -> Models
//! - (Year, Make, Model) -> variants `{submodel, engine, id}` in insertion order
//! - (Year, Make, Model, Submodel, Engine) -> id
//!
//! The three coarser maps are derived from the same records as the finest one
//! and are never updated independently of it.
//!
//! ## Example
//!
//! ```ignore
//! use fitment_index::{FitmentIndex, SelectionKey, VehicleRecord};
//!
//! let records = vec![VehicleRecord::new("v1", "2020", "Toyota", "Camry")];
//! let index = FitmentIndex::build(&records);
//!
//! // exact lookup, inapplicable segments are None
//! let key = SelectionKey::new("2020", "Toyota", "Camry", None, None);
//! assert_eq!(index.get(&key).map(|id| id.as_str()), Some("v1"));
//! ```
//!
//! ## Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `build()` | O(n log n) |
//! | `get()` by key | O(1) |
//! | `makes()` / `models()` / `variants()` | O(1) |

mod index;
mod key;
mod record;

pub use index::{FitmentIndex, FitmentVariant};
pub use key::{key_segment, SelectionKey, YearMakeKey, YearMakeModelKey, KEY_SEPARATOR};
pub use record::{VehicleId, VehicleRecord};
