//! Dependent Year -> Make -> Model -> {Submodel, Engine} field state.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::entity::FitmentIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Year,
    Make,
    Model,
    Submodel,
    Engine,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Year,
        Field::Make,
        Field::Model,
        Field::Submodel,
        Field::Engine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Year => "Year",
            Field::Make => "Make",
            Field::Model => "Model",
            Field::Submodel => "Submodel",
            Field::Engine => "Engine",
        }
    }

    /// Year, Make and Model must be chosen before anything resolves.
    pub fn is_required(self) -> bool {
        matches!(self, Field::Year | Field::Make | Field::Model)
    }

    /// Fields reset when this one changes. Submodel and Engine are siblings
    /// and do not reset each other.
    pub fn downstream(self) -> &'static [Field] {
        match self {
            Field::Year => &[Field::Make, Field::Model, Field::Submodel, Field::Engine],
            Field::Make => &[Field::Model, Field::Submodel, Field::Engine],
            Field::Model => &[Field::Submodel, Field::Engine],
            Field::Submodel | Field::Engine => &[],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPhase {
    /// No valid upstream selection yet
    Locked,
    /// Nothing in the catalog uses this field for the chosen model
    Hidden,
    EnabledEmpty,
    Selected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("{0} is locked until the fields before it are chosen")]
    Locked(Field),
    #[error("{0} does not apply to this vehicle")]
    Hidden(Field),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot {
    options: Vec<String>,
    value: Option<String>,
    hidden: bool,
}

impl Slot {
    fn phase(&self) -> FieldPhase {
        match (&self.value, self.hidden, self.options.is_empty()) {
            (Some(_), _, _) => FieldPhase::Selected,
            (None, true, _) => FieldPhase::Hidden,
            (None, false, true) => FieldPhase::Locked,
            (None, false, false) => FieldPhase::EnabledEmpty,
        }
    }
}

/// Values and options of the five fields. Transitions read the index but
/// never modify it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorState {
    slots: [Slot; 5],
}

impl SelectorState {
    /// Every field locked, used while the catalog is loading.
    pub fn locked() -> Self {
        Self::default()
    }

    /// Fresh state with Year populated from the index.
    pub fn new(index: &FitmentIndex) -> Self {
        let mut state = Self::default();
        state.populate(Field::Year, index.years().cloned());
        state
    }

    pub fn phase(&self, field: Field) -> FieldPhase {
        self.slot(field).phase()
    }

    pub fn value(&self, field: Field) -> Option<&str> {
        self.slot(field).value.as_deref()
    }

    /// Options in display order: years newest first, everything else ascending.
    pub fn options(&self, field: Field) -> Vec<String> {
        let mut options = self.slot(field).options.clone();
        match field {
            Field::Year => options.sort_by(|a, b| compare_years(b, a)),
            _ => options.sort(),
        }
        options
    }

    /// Choose `value` for `field` and rebuild every field after it.
    ///
    /// Downstream values are always cleared, even when they would still be
    /// valid under the new choice. A value missing from the options is kept
    /// but populates nothing below it. An empty value clears the field.
    pub fn select(
        &mut self,
        index: &FitmentIndex,
        field: Field,
        value: &str,
    ) -> Result<(), SelectError> {
        match self.phase(field) {
            FieldPhase::Locked => return Err(SelectError::Locked(field)),
            FieldPhase::Hidden => return Err(SelectError::Hidden(field)),
            FieldPhase::EnabledEmpty | FieldPhase::Selected => {}
        }

        let value = value.trim();
        if value.is_empty() {
            self.clear(index, field);
            return Ok(());
        }

        let slot = self.slot_mut(field);
        if !slot.options.iter().any(|o| o == value) {
            debug!("{} '{}' is not among the indexed options", field, value);
        }
        slot.value = Some(value.to_string());
        self.cascade(index, field);
        Ok(())
    }

    /// Unset `field` and reset everything after it.
    pub fn clear(&mut self, index: &FitmentIndex, field: Field) {
        self.slot_mut(field).value = None;
        self.cascade(index, field);
    }

    fn cascade(&mut self, index: &FitmentIndex, field: Field) {
        for downstream in field.downstream() {
            *self.slot_mut(*downstream) = Slot::default();
        }

        let year = self.value(Field::Year).map(str::to_string);
        let make = self.value(Field::Make).map(str::to_string);
        let model = self.value(Field::Model).map(str::to_string);

        match (field, year, make, model) {
            (Field::Year, Some(year), _, _) => {
                let makes = index.makes(&year).into_iter().flatten().cloned();
                self.populate(Field::Make, makes);
            }
            (Field::Make, Some(year), Some(make), _) => {
                let models = index.models(&year, &make).into_iter().flatten().cloned();
                self.populate(Field::Model, models);
            }
            (Field::Model, Some(year), Some(make), Some(model)) => {
                let submodels: Vec<String> = index
                    .submodels(&year, &make, &model)
                    .into_iter()
                    .map(String::from)
                    .collect();
                let engines: Vec<String> = index
                    .engines(&year, &make, &model)
                    .into_iter()
                    .map(String::from)
                    .collect();
                self.populate_or_hide(Field::Submodel, submodels);
                self.populate_or_hide(Field::Engine, engines);
            }
            _ => {}
        }
    }

    fn populate(&mut self, field: Field, options: impl IntoIterator<Item = String>) {
        let slot = self.slot_mut(field);
        slot.options = options.into_iter().collect();
        slot.value = None;
        slot.hidden = false;
    }

    fn populate_or_hide(&mut self, field: Field, options: Vec<String>) {
        let hidden = options.is_empty();
        self.populate(field, options);
        self.slot_mut(field).hidden = hidden;
    }

    fn slot(&self, field: Field) -> &Slot {
        &self.slots[field.slot()]
    }

    fn slot_mut(&mut self, field: Field) -> &mut Slot {
        &mut self.slots[field.slot()]
    }
}

fn compare_years(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
