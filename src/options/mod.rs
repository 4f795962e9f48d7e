//! Option schemas and the normalizer that turns loose input into them.
//!
//! Every diff entry point accepts its options as an [`OptionsInput`]: nothing
//! at all, an already-built schema struct, or a JSON mapping of field names to
//! values. [`normalize`] folds all three into the canonical struct.
//!
//! - `diff`: `DiffOptions` for every diff mode
//! - `find`: `DiffFindOptions` for rename / copy detection
//! - `walk`: `WalkOptions` for tree walks

pub mod diff;
pub mod find;
pub mod walk;

pub use diff::DiffOptions;
pub use find::DiffFindOptions;
pub use walk::WalkOptions;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A canonical option struct that [`normalize`] can build from loose input.
///
/// The recognized fields of a schema are exactly the fields its `Default`
/// instance serializes to.
pub trait OptionSchema: Default + Clone + Serialize + DeserializeOwned {
    /// Name used in `InvalidOption` errors.
    const NAME: &'static str;
}

/// Raw option input as handed in by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsInput<S> {
    /// No options; every field takes its default.
    Absent,
    /// An already canonical struct, passed through untouched.
    Canonical(S),
    /// A loose value, expected to be `null` or a mapping of field names.
    Raw(Value),
}

impl<S> Default for OptionsInput<S> {
    fn default() -> Self {
        OptionsInput::Absent
    }
}

impl<S> From<()> for OptionsInput<S> {
    fn from(_: ()) -> Self {
        OptionsInput::Absent
    }
}

impl<S> From<Value> for OptionsInput<S> {
    fn from(value: Value) -> Self {
        OptionsInput::Raw(value)
    }
}

impl<S> From<Map<String, Value>> for OptionsInput<S> {
    fn from(fields: Map<String, Value>) -> Self {
        OptionsInput::Raw(Value::Object(fields))
    }
}

/// Builds the canonical `S` from `input`.
///
/// Absent input and `null` give `S::default()`; a canonical struct is
/// returned as-is. In a mapping, recognized fields overwrite defaults and
/// `null` values leave the default in place. Unrecognized fields and values of
/// the wrong shape fail with [`Error::InvalidOption`].
pub fn normalize<S: OptionSchema>(input: impl Into<OptionsInput<S>>) -> Result<S> {
    match input.into() {
        OptionsInput::Absent | OptionsInput::Raw(Value::Null) => Ok(S::default()),
        OptionsInput::Canonical(options) => Ok(options),
        OptionsInput::Raw(Value::Object(fields)) => from_fields(fields),
        OptionsInput::Raw(other) => Err(invalid::<S>(
            "(root)",
            format!("expected a mapping of option fields, got {}", shape_of(&other)),
        )),
    }
}

fn from_fields<S: OptionSchema>(fields: Map<String, Value>) -> Result<S> {
    let mut merged = match serde_json::to_value(S::default()) {
        Ok(Value::Object(defaults)) => defaults,
        Ok(other) => {
            return Err(invalid::<S>(
                "(root)",
                format!("schema defaults serialize to {}", shape_of(&other)),
            ));
        }
        Err(e) => return Err(invalid::<S>("(root)", e.to_string())),
    };

    for (field, value) in fields {
        if value.is_null() {
            continue;
        }

        let Some(slot) = merged.get_mut(&field) else {
            return Err(invalid::<S>(field, "unrecognized field"));
        };
        *slot = value;

        // Checked one field at a time so the error names the offending field.
        if let Err(e) = serde_json::from_value::<S>(Value::Object(merged.clone())) {
            return Err(invalid::<S>(field, e.to_string()));
        }
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| invalid::<S>("(root)", e.to_string()))
}

fn invalid<S: OptionSchema>(field: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::InvalidOption {
        schema: S::NAME,
        field: field.into(),
        reason: reason.into(),
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}
