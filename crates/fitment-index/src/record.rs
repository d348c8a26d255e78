//! Vehicle records mirrored from the remote catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque backend identifier of one fitment entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One fitment entity: a specific Year/Make/Model and optional Submodel/Engine.
///
/// `submodel` and `engine` are `None` when the backend left them empty, so an
/// empty string never appears inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub year: String,
    pub make: String,
    pub model: String,
    pub submodel: Option<String>,
    pub engine: Option<String>,
}

impl VehicleRecord {
    pub fn new(
        id: impl Into<VehicleId>,
        year: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            year: year.into(),
            make: make.into(),
            model: model.into(),
            submodel: None,
            engine: None,
        }
    }

    pub fn with_submodel(mut self, submodel: &str) -> Self {
        self.submodel = present(submodel);
        self
    }

    pub fn with_engine(mut self, engine: &str) -> Self {
        self.engine = present(engine);
        self
    }

    /// Build a record from the raw `(key, value)` field tuples of a catalog node.
    ///
    /// Unknown keys are ignored. Returns `None` when year, make or model is
    /// missing or blank, since such a node can never be reached through the
    /// Year -> Make -> Model cascade.
    pub fn from_fields<'a, I>(id: impl Into<VehicleId>, fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut year = None;
        let mut make = None;
        let mut model = None;
        let mut submodel = None;
        let mut engine = None;

        for (key, value) in fields {
            let slot = match key {
                "year" => &mut year,
                "make" => &mut make,
                "model" => &mut model,
                "submodel" => &mut submodel,
                "engine" => &mut engine,
                _ => continue,
            };
            *slot = present(value);
        }

        Some(Self {
            id: id.into(),
            year: year?,
            make: make?,
            model: model?,
            submodel,
            engine,
        })
    }
}

fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
