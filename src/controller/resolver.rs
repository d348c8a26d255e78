use thiserror::Error;
use tracing::debug;

use crate::entity::{FitmentContext, FitmentIndex, SelectionKey};

use super::selector::{Field, FieldPhase, SelectorState};

/// Why the current selection does not name a vehicle. Both cases show the
/// same message to the shopper.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Unresolved {
    #[error("select a valid combination")]
    Incomplete(Field),
    #[error("select a valid combination")]
    NoMatch(SelectionKey),
}

impl Unresolved {
    pub fn detail(&self) -> String {
        match self {
            Unresolved::Incomplete(field) => format!("{} is not selected", field),
            Unresolved::NoMatch(key) => format!("no vehicle matches {}", key),
        }
    }
}

/// Selection key for the current values. Hidden or unset Submodel and
/// Engine contribute empty segments.
pub fn selection_key(state: &SelectorState) -> Result<SelectionKey, Unresolved> {
    let optional = |field: Field| match state.phase(field) {
        FieldPhase::Hidden => None,
        _ => state.value(field),
    };

    let (Some(year), Some(make), Some(model)) = (
        required(state, Field::Year),
        required(state, Field::Make),
        required(state, Field::Model),
    ) else {
        return Err(missing(state));
    };

    Ok(SelectionKey::new(
        year,
        make,
        model,
        optional(Field::Submodel),
        optional(Field::Engine),
    ))
}

fn required(state: &SelectorState, field: Field) -> Option<&str> {
    state.value(field).filter(|v| !v.trim().is_empty())
}

// A required field still locked below a chosen value means that value is
// not in the catalog, e.g. an unknown year. That is a miss, not a gap.
fn missing(state: &SelectorState) -> Unresolved {
    let field = [Field::Year, Field::Make, Field::Model]
        .into_iter()
        .find(|f| required(state, *f).is_none())
        .unwrap_or(Field::Year);

    if field != Field::Year && state.phase(field) == FieldPhase::Locked {
        return Unresolved::NoMatch(SelectionKey::new(
            required(state, Field::Year).unwrap_or_default(),
            required(state, Field::Make).unwrap_or_default(),
            required(state, Field::Model).unwrap_or_default(),
            None,
            None,
        ));
    }
    Unresolved::Incomplete(field)
}

/// Exact lookup of the selection. There is no partial or wildcard match:
/// leaving Engine unset only matches a record without an engine.
pub fn resolve(index: &FitmentIndex, state: &SelectorState) -> Result<FitmentContext, Unresolved> {
    let key = selection_key(state)?;
    let Some(id) = index.get(&key) else {
        debug!("no vehicle for {}", key);
        return Err(Unresolved::NoMatch(key));
    };

    Ok(FitmentContext::new(
        id.clone(),
        state.value(Field::Year).unwrap_or_default(),
        state.value(Field::Make).unwrap_or_default(),
        state.value(Field::Model).unwrap_or_default(),
        state.value(Field::Submodel),
        state.value(Field::Engine),
    ))
}
