//! FitmentIndex: derived lookup maps over a fetched vehicle catalog.

use std::collections::{BTreeSet, HashMap};

use tracing::{trace, warn};

use crate::key::{SelectionKey, YearMakeKey, YearMakeModelKey};
use crate::record::{VehicleId, VehicleRecord};

/// One Submodel/Engine combination available for a Year/Make/Model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitmentVariant {
    pub submodel: Option<String>,
    pub engine: Option<String>,
    pub id: VehicleId,
}

/// Four lookup maps built once from a record list, never partially updated.
#[derive(Debug, Default, Clone)]
pub struct FitmentIndex {
    /// Year -> Makes
    by_year: HashMap<String, BTreeSet<String>>,
    /// (Year, Make) -> Models
    by_year_make: HashMap<YearMakeKey, BTreeSet<String>>,
    /// (Year, Make, Model) -> variants, in fetch order
    by_year_make_model: HashMap<YearMakeModelKey, Vec<FitmentVariant>>,
    /// (Year, Make, Model, Submodel, Engine) -> id, later records win
    by_selection_key: HashMap<SelectionKey, VehicleId>,
    records: usize,
    duplicates: usize,
}

impl FitmentIndex {
    /// Build the index from records in fetch order.
    ///
    /// A record whose selection key was already seen overwrites the earlier id
    /// in the exact-match map but still appends its variant, so both entries
    /// stay visible at the Year/Make/Model level.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a VehicleRecord>) -> Self {
        let mut index = Self::default();

        for record in records {
            index.records += 1;

            index
                .by_year
                .entry(record.year.clone())
                .or_default()
                .insert(record.make.clone());

            index
                .by_year_make
                .entry(YearMakeKey::new(&record.year, &record.make))
                .or_default()
                .insert(record.model.clone());

            index
                .by_year_make_model
                .entry(YearMakeModelKey::new(
                    &record.year,
                    &record.make,
                    &record.model,
                ))
                .or_default()
                .push(FitmentVariant {
                    submodel: record.submodel.clone(),
                    engine: record.engine.clone(),
                    id: record.id.clone(),
                });

            let key = SelectionKey::for_record(record);
            trace!("indexing {} as {}", record.id, key);
            if let Some(previous) = index.by_selection_key.insert(key, record.id.clone()) {
                index.duplicates += 1;
                warn!(
                    "duplicate fitment {}: {} replaces {}",
                    SelectionKey::for_record(record),
                    record.id,
                    previous
                );
            }
        }

        index
    }

    /// All indexed years, unordered.
    pub fn years(&self) -> impl Iterator<Item = &String> {
        self.by_year.keys()
    }

    /// Makes available for a year.
    pub fn makes(&self, year: &str) -> Option<&BTreeSet<String>> {
        self.by_year.get(year)
    }

    /// Models available for a (year, make).
    pub fn models(&self, year: &str, make: &str) -> Option<&BTreeSet<String>> {
        self.by_year_make.get(&YearMakeKey::new(year, make))
    }

    /// Submodel/Engine variants for a (year, make, model) in fetch order.
    pub fn variants(&self, year: &str, make: &str, model: &str) -> &[FitmentVariant] {
        self.by_year_make_model
            .get(&YearMakeModelKey::new(year, make, model))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct non-empty submodels for a (year, make, model).
    pub fn submodels(&self, year: &str, make: &str, model: &str) -> BTreeSet<&str> {
        self.variants(year, make, model)
            .iter()
            .filter_map(|v| v.submodel.as_deref())
            .collect()
    }

    /// Distinct non-empty engines for a (year, make, model).
    pub fn engines(&self, year: &str, make: &str, model: &str) -> BTreeSet<&str> {
        self.variants(year, make, model)
            .iter()
            .filter_map(|v| v.engine.as_deref())
            .collect()
    }

    /// O(1) exact lookup of a complete selection.
    pub fn get(&self, key: &SelectionKey) -> Option<&VehicleId> {
        self.by_selection_key.get(key)
    }

    /// Number of distinct selection keys.
    pub fn len(&self) -> usize {
        self.by_selection_key.len()
    }

    /// Returns true if no records were indexed.
    pub fn is_empty(&self) -> bool {
        self.by_selection_key.is_empty()
    }

    /// Number of records the index was built from, duplicates included.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Number of records that overwrote an earlier record's selection key.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<VehicleRecord> {
        vec![
            VehicleRecord::new("v1", "2020", "Toyota", "Camry"),
            VehicleRecord::new("v2", "2018", "Ford", "F-150")
                .with_submodel("Lariat")
                .with_engine("5.0L"),
            VehicleRecord::new("v3", "2018", "Ford", "F-150")
                .with_submodel("XLT")
                .with_engine("3.5L"),
            VehicleRecord::new("v4", "2018", "Ford", "F-150").with_submodel("XLT"),
            VehicleRecord::new("v5", "2018", "Ford", "Mustang").with_engine("5.0L"),
            VehicleRecord::new("v6", "2018", "Chevrolet", "Silverado"),
        ]
    }

    #[test]
    fn test_every_record_resolves_to_its_id() {
        let records = catalog();
        let index = FitmentIndex::build(&records);

        for record in &records {
            let key = SelectionKey::for_record(record);
            assert_eq!(index.get(&key), Some(&record.id), "{}", key);
            assert!(index.makes(&record.year).unwrap().contains(&record.make));
            assert!(index
                .models(&record.year, &record.make)
                .unwrap()
                .contains(&record.model));
            assert!(index
                .variants(&record.year, &record.make, &record.model)
                .iter()
                .any(|v| v.id == record.id));
        }
        assert_eq!(index.len(), records.len());
        assert_eq!(index.record_count(), records.len());
        assert_eq!(index.duplicate_count(), 0);
    }

    #[test]
    fn test_submodel_and_engine_options() {
        let records = catalog();
        let index = FitmentIndex::build(&records);

        let submodels: Vec<_> = index.submodels("2018", "Ford", "F-150").into_iter().collect();
        assert_eq!(submodels, vec!["Lariat", "XLT"]);
        let engines: Vec<_> = index.engines("2018", "Ford", "F-150").into_iter().collect();
        assert_eq!(engines, vec!["3.5L", "5.0L"]);

        assert!(index.submodels("2018", "Ford", "Mustang").is_empty());
        assert!(index.engines("2020", "Toyota", "Camry").is_empty());
        assert!(index.variants("2021", "Toyota", "Camry").is_empty());
    }

    #[test]
    fn test_variants_keep_fetch_order() {
        let records = catalog();
        let index = FitmentIndex::build(&records);
        let ids: Vec<_> = index
            .variants("2018", "Ford", "F-150")
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(ids, vec!["v2", "v3", "v4"]);
    }

    #[test]
    fn test_duplicate_key_later_record_wins() {
        let records = vec![
            VehicleRecord::new("a", "2019", "Honda", "Civic").with_submodel("EX"),
            VehicleRecord::new("b", "2019", "Honda", "Civic").with_submodel("EX"),
        ];
        let index = FitmentIndex::build(&records);

        let key = SelectionKey::new("2019", "Honda", "Civic", Some("EX"), None);
        assert_eq!(index.get(&key).map(VehicleId::as_str), Some("b"));
        let ids: Vec<_> = index
            .variants("2019", "Honda", "Civic")
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicate_count(), 1);
    }

    #[test]
    fn test_partial_selection_does_not_pick_a_variant() {
        let records = catalog();
        let index = FitmentIndex::build(&records);

        // F-150 only exists with a submodel, so the bare Y/M/M has no entry
        let key = SelectionKey::new("2018", "Ford", "F-150", None, None);
        assert!(index.get(&key).is_none());

        // XLT without engine does exist as its own record
        let key = SelectionKey::new("2018", "Ford", "F-150", Some("XLT"), None);
        assert_eq!(index.get(&key).map(VehicleId::as_str), Some("v4"));
    }

    #[test]
    fn test_empty_index() {
        let index = FitmentIndex::build(&Vec::<VehicleRecord>::new());
        assert!(index.is_empty());
        assert_eq!(index.years().count(), 0);
        assert!(index.makes("2020").is_none());
    }
}
