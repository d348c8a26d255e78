use serde::{Deserialize, Serialize};

use fitment_index::{key_segment, VehicleId};

/// Local storage slot read by the product page fitment check.
pub const FITMENT_STORAGE_KEY: &str = "fitment:selected-vehicle";

/// A resolved selection, as persisted for other storefront features.
///
/// Submodel and engine are empty strings when they did not apply. The JSON
/// shape has no version field; consumers break if it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitmentContext {
    pub id: VehicleId,
    pub year: String,
    pub make: String,
    pub model: String,
    pub submodel: String,
    pub engine: String,
}

impl FitmentContext {
    pub fn new(
        id: VehicleId,
        year: &str,
        make: &str,
        model: &str,
        submodel: Option<&str>,
        engine: Option<&str>,
    ) -> Self {
        Self {
            id,
            year: year.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            submodel: key_segment(submodel).to_string(),
            engine: key_segment(engine).to_string(),
        }
    }

    /// Human readable label, e.g. "2018 Ford F-150 Lariat 5.0L".
    pub fn label(&self) -> String {
        [
            self.year.as_str(),
            &self.make,
            &self.model,
            &self.submodel,
            &self.engine,
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}
