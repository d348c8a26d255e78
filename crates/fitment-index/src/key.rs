//! Composite keys for partial and complete fitment selections.

use std::fmt;

use crate::record::VehicleRecord;

/// Separator used when a key is rendered as a single string.
pub const KEY_SEPARATOR: &str = "::";

/// Flatten an optional Submodel/Engine segment to its key form.
///
/// This is the only place where "not applicable" becomes an empty segment:
/// `None`, `Some("")` and whitespace-only values all produce `""`, so a field
/// that was never shown and a field left unselected build the same key.
pub fn key_segment(value: Option<&str>) -> &str {
    value.map(str::trim).unwrap_or("")
}

/// Composite key for the (Year, Make) -> Models lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct YearMakeKey {
    pub year: String,
    pub make: String,
}

impl YearMakeKey {
    pub fn new(year: impl Into<String>, make: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            make: make.into(),
        }
    }
}

impl fmt::Display for YearMakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.year, self.make)
    }
}

/// Composite key for the (Year, Make, Model) -> variants lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct YearMakeModelKey {
    pub year: String,
    pub make: String,
    pub model: String,
}

impl YearMakeModelKey {
    pub fn new(year: impl Into<String>, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            make: make.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for YearMakeModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.year, self.make, self.model
        )
    }
}

/// Composite key for exact O(1) resolution of a complete selection.
///
/// Submodel and Engine are stored already flattened by [`key_segment`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    year: String,
    make: String,
    model: String,
    submodel: String,
    engine: String,
}

impl SelectionKey {
    pub fn new(
        year: &str,
        make: &str,
        model: &str,
        submodel: Option<&str>,
        engine: Option<&str>,
    ) -> Self {
        Self {
            year: year.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            submodel: key_segment(submodel).to_string(),
            engine: key_segment(engine).to_string(),
        }
    }

    /// The key a record is stored under.
    pub fn for_record(record: &VehicleRecord) -> Self {
        Self::new(
            &record.year,
            &record.make,
            &record.model,
            record.submodel.as_deref(),
            record.engine.as_deref(),
        )
    }

    pub fn year_make_model(&self) -> YearMakeModelKey {
        YearMakeModelKey::new(&self.year, &self.make, &self.model)
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.year, self.make, self.model, self.submodel, self.engine
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_unselected_normalize_identically() {
        let unselected = SelectionKey::new("2020", "Toyota", "Camry", None, None);
        let empty = SelectionKey::new("2020", "Toyota", "Camry", Some(""), Some(" "));
        assert_eq!(unselected, empty);
        assert_eq!(unselected.to_string(), "2020::Toyota::Camry::::");
    }

    #[test]
    fn test_key_for_record() {
        let record = VehicleRecord::new("v", "2018", "Ford", "F-150").with_engine("5.0L");
        let key = SelectionKey::for_record(&record);
        assert_eq!(key.to_string(), "2018::Ford::F-150::::5.0L");
        assert_eq!(
            key.year_make_model(),
            YearMakeModelKey::new("2018", "Ford", "F-150")
        );
        assert_eq!(YearMakeKey::new("2018", "Ford").to_string(), "2018::Ford");
    }
}
